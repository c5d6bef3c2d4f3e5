//! Newline-delimited JSON streams and the accumulators folded over them
//!
//! Long-running endpoints (`/api/pull`, `/api/generate`) answer with one JSON
//! object per line. [`ndjson_lines`] reframes a byte stream into lines no
//! matter how the transport chunks it; the accumulators turn each record into
//! the latest cumulative view.

use std::io;

use async_stream::try_stream;
use futures::{stream::BoxStream, Stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use tokio_util::{
    bytes::Buf,
    codec::{FramedRead, LinesCodec, LinesCodecError},
    io::StreamReader,
};
use tracing::debug;

use crate::{error::ClientError, models::DownloadProgress, Result};

/// Total reported when no pull record ever carried one
pub const DEFAULT_TOTAL_BYTES: u64 = 100;

/// Cumulative pull progress, one item per record
pub type ProgressStream = BoxStream<'static, Result<DownloadProgress>>;

/// Response text, one update per record
pub type ResponseStream = BoxStream<'static, Result<ResponseUpdate>>;

/// Text one generate record added to the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseUpdate {
    pub delta: String,
    /// Byte length of the full response once `delta` is appended
    pub len: usize,
}

/// Split a chunked byte stream into text lines
pub fn ndjson_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: Buf + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let reader = StreamReader::new(bytes.map_err(|e| io::Error::new(io::ErrorKind::Other, e)));

    FramedRead::new(reader, LinesCodec::new()).map_err(|e| match e {
        LinesCodecError::Io(err) if err.kind() == io::ErrorKind::InvalidData => {
            ClientError::InvalidData(err.to_string())
        }
        LinesCodecError::Io(err) => ClientError::Unreachable(err.to_string()),
        LinesCodecError::MaxLineLengthExceeded => {
            ClientError::InvalidData("line exceeds maximum length".to_string())
        }
    })
}

/// One `/api/pull` record
#[derive(Debug, Deserialize)]
struct ProgressRecord {
    status: Option<String>,
    completed: Option<u64>,
    total: Option<u64>,
    error: Option<String>,
}

/// One `/api/generate` record
#[derive(Debug, Deserialize)]
struct ResponseRecord {
    response: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Folds pull records into [`DownloadProgress`]
///
/// Missing counters keep their previous value. Until some record carries a
/// total, the total reads as [`DEFAULT_TOTAL_BYTES`].
#[derive(Debug, Clone, Default)]
pub struct ProgressAccumulator {
    status: Option<String>,
    completed: u64,
    total: Option<u64>,
}

impl ProgressAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one line and fold it in
    pub fn ingest_line(&mut self, line: &str) -> Result<DownloadProgress> {
        let record: ProgressRecord = serde_json::from_str(line)?;

        if let Some(error) = record.error {
            return Err(ClientError::Generic(error));
        }
        if let Some(status) = record.status {
            self.status = Some(status);
        }
        if let Some(completed) = record.completed {
            self.completed = completed;
        }
        if let Some(total) = record.total {
            self.total = Some(total);
        }

        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> DownloadProgress {
        DownloadProgress {
            status: self.status.clone(),
            completed_bytes: self.completed,
            total_bytes: self.total.unwrap_or(DEFAULT_TOTAL_BYTES),
        }
    }
}

/// Appends streamed text deltas; never rewrites what it already holds
#[derive(Debug, Clone, Default)]
pub struct ResponseAccumulator {
    text: String,
    done: bool,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one line, append its delta and return the full text so far
    pub fn ingest_line(&mut self, line: &str) -> Result<&str> {
        let record: ResponseRecord = serde_json::from_str(line)?;

        if let Some(error) = record.error {
            return Err(ClientError::Generic(error));
        }
        if let Some(delta) = record.response {
            self.push_delta(&delta);
        }
        if record.done {
            self.done = true;
        }

        Ok(&self.text)
    }

    pub fn push_delta(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the server flagged the final record
    pub fn is_done(&self) -> bool {
        self.done
    }
}

/// Fold pull lines into cumulative progress. The stream ends after the
/// first error.
pub fn progress_stream<L>(lines: L) -> ProgressStream
where
    L: Stream<Item = Result<String>> + Send + 'static,
{
    fold_progress(lines).boxed()
}

fn fold_progress<L>(lines: L) -> impl Stream<Item = Result<DownloadProgress>> + Send + 'static
where
    L: Stream<Item = Result<String>> + Send + 'static,
{
    try_stream! {
        let mut accumulator = ProgressAccumulator::new();
        let mut lines = Box::pin(lines);

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            yield accumulator.ingest_line(&line)?;
        }

        debug!("Pull stream closed at {:?}", accumulator.snapshot());
    }
}

/// Fold generate lines into the response text, yielding each record's delta
/// with the running length. The stream ends after the first error.
pub fn response_stream<L>(lines: L) -> ResponseStream
where
    L: Stream<Item = Result<String>> + Send + 'static,
{
    fold_response(lines).boxed()
}

fn fold_response<L>(lines: L) -> impl Stream<Item = Result<ResponseUpdate>> + Send + 'static
where
    L: Stream<Item = Result<String>> + Send + 'static,
{
    try_stream! {
        let mut accumulator = ResponseAccumulator::new();
        let mut lines = Box::pin(lines);

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let before = accumulator.text().len();
            let len = accumulator.ingest_line(&line)?.len();
            yield ResponseUpdate {
                delta: accumulator.text()[before..].to_string(),
                len,
            };
        }

        debug!(
            "Response stream closed after {} bytes (done flag: {})",
            accumulator.text().len(),
            accumulator.is_done()
        );
    }
}
