//! Splitting model output into reasoning and answer spans
//!
//! Reasoning models wrap their chain of thought in `<think>` ... `</think>`.
//! The text is scanned as a token stream: an opening marker switches to
//! reasoning, a closing marker switches back, and every stretch of text in
//! between is attributed to whichever mode is active. Markers are dropped.
//!
//! An unterminated `<think>` therefore classifies everything after it as
//! reasoning. That is also what a half-streamed response looks like, so the
//! styling stays stable while text arrives.

use serde::{Deserialize, Serialize};

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Reasoning,
    Answer,
}

/// A run of text sharing one classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
}

/// Read-only view of a response, spans in text order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedMessage {
    spans: Vec<Span>,
}

impl SegmentedMessage {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All reasoning text, concatenated
    pub fn reasoning(&self) -> String {
        self.collect(SpanKind::Reasoning)
    }

    /// All answer text, concatenated
    pub fn answer(&self) -> String {
        self.collect(SpanKind::Answer)
    }

    pub fn has_reasoning(&self) -> bool {
        self.spans.iter().any(|s| s.kind == SpanKind::Reasoning)
    }

    fn collect(&self, kind: SpanKind) -> String {
        self.spans
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.text.as_str())
            .collect()
    }

    fn push(&mut self, kind: SpanKind, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(text),
            _ => self.spans.push(Span {
                kind,
                text: text.to_string(),
            }),
        }
    }
}

/// Segment `text`. Pure: the same input always yields the same spans.
pub fn segment(text: &str) -> SegmentedMessage {
    let mut message = SegmentedMessage::default();
    let mut kind = SpanKind::Answer;
    let mut rest = text;

    while let Some((at, marker_len, next)) = next_marker(rest) {
        message.push(kind, &rest[..at]);
        kind = next;
        rest = &rest[at + marker_len..];
    }
    message.push(kind, rest);

    message
}

/// Position, length and resulting mode of the first marker in `text`
fn next_marker(text: &str) -> Option<(usize, usize, SpanKind)> {
    text.match_indices('<').find_map(|(at, _)| {
        let tail = &text[at..];
        if tail.starts_with(THINK_OPEN) {
            Some((at, THINK_OPEN.len(), SpanKind::Reasoning))
        } else if tail.starts_with(THINK_CLOSE) {
            Some((at, THINK_CLOSE.len(), SpanKind::Answer))
        } else {
            None
        }
    })
}

/// Length of a trailing partial marker (`"<th"`, `"</thi"`, ...).
///
/// A streaming renderer holds these bytes back until the next delta shows
/// whether they open a marker or are plain text.
pub fn pending_marker_len(text: &str) -> usize {
    let mut longest = 0;
    for marker in [THINK_OPEN, THINK_CLOSE] {
        for k in (longest + 1)..marker.len() {
            if text.ends_with(&marker[..k]) {
                longest = k;
            }
        }
    }
    longest
}
