//! A prompt paired with its streamed response

use chrono::{DateTime, Utc};
use ochat_client::{ChatTurn, ErrorNotice, ResponseUpdate};

use crate::{
    error::{SessionError, SessionResult},
    segment::{segment, SegmentedMessage},
};

/// Where an exchange is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeState {
    Streaming,
    Completed,
    Failed(ErrorNotice),
}

/// One turn of the transcript
///
/// The response only grows while streaming and is frozen once the exchange
/// completes or fails.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    index: usize,
    turn: ChatTurn,
    response: String,
    state: ExchangeState,
    sent_at: DateTime<Utc>,
}

impl ChatExchange {
    pub fn new(index: usize, turn: ChatTurn) -> Self {
        Self {
            index,
            turn,
            response: String::new(),
            state: ExchangeState::Streaming,
            sent_at: Utc::now(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn turn(&self) -> &ChatTurn {
        &self.turn
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self.state, ExchangeState::Streaming)
    }

    /// Append a text delta
    pub fn append(&mut self, delta: &str) -> SessionResult<()> {
        if self.is_complete() {
            return Err(SessionError::ExchangeClosed(self.index));
        }
        self.response.push_str(delta);
        Ok(())
    }

    /// Apply a streamed update; it must land exactly on `update.len` bytes
    pub fn apply(&mut self, update: &ResponseUpdate) -> SessionResult<()> {
        if self.response.len() + update.delta.len() != update.len {
            return Err(SessionError::NonAppendUpdate(self.index));
        }
        self.append(&update.delta)
    }

    pub fn complete(&mut self) {
        if !self.is_complete() {
            self.state = ExchangeState::Completed;
        }
    }

    /// Mark failed; the partial response stays as it is
    pub fn fail(&mut self, notice: ErrorNotice) {
        if !self.is_complete() {
            self.state = ExchangeState::Failed(notice);
        }
    }

    /// Reasoning/answer view of the response, recomputed on each call
    pub fn segmented(&self) -> SegmentedMessage {
        segment(&self.response)
    }
}
