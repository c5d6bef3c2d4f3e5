//! Incremental rendering of a streamed response
//!
//! Updates arrive as deltas. The renderer works out which visible text is
//! new, split into reasoning and answer pieces, while holding back any
//! trailing bytes that could still turn into a marker.

use ochat_sessions::{pending_marker_len, segment, Span};

#[derive(Debug, Default)]
pub struct StreamRenderer {
    /// Bytes of visible (marker-free) text already handed out
    emitted: usize,
    /// Response text collected through [`StreamRenderer::push`]
    received: String,
    /// An update was missed; output resumes at `finish`
    stale: bool,
}

impl StreamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delta that brings the response to `len` bytes
    pub fn push(&mut self, delta: &str, len: usize) -> Vec<Span> {
        if self.stale || self.received.len() + delta.len() != len {
            self.stale = true;
            return Vec::new();
        }
        self.received.push_str(delta);

        let received = std::mem::take(&mut self.received);
        let fresh = self.advance(&received);
        self.received = received;
        fresh
    }

    /// New pieces for the response text `so_far`
    pub fn advance(&mut self, so_far: &str) -> Vec<Span> {
        let settled = &so_far[..so_far.len() - pending_marker_len(so_far)];
        self.take_new(settled)
    }

    /// Whatever is left once the stream has ended, held-back bytes included
    pub fn finish(&mut self, full: &str) -> Vec<Span> {
        self.take_new(full)
    }

    fn take_new(&mut self, text: &str) -> Vec<Span> {
        let mut fresh = Vec::new();
        let mut offset = 0;

        for span in segment(text).spans() {
            let end = offset + span.text.len();
            if end > self.emitted {
                let skip = self.emitted.saturating_sub(offset);
                fresh.push(Span {
                    kind: span.kind,
                    text: span.text[skip..].to_string(),
                });
            }
            offset = end;
        }

        self.emitted = self.emitted.max(offset);
        fresh
    }
}
