//! Chat sessions for ochat
//!
//! Transcripts of prompt/response exchanges, the `<think>` segmenter used to
//! style model output, change notifications for front ends, and on-disk
//! conversation storage.

pub mod bus;
pub mod error;
pub mod exchange;
pub mod models;
pub mod segment;
pub mod session;
pub mod store;

pub use bus::{ChatEvent, EventBus};
pub use error::{SessionError, SessionResult};
pub use exchange::{ChatExchange, ExchangeState};
pub use models::{Conversation, StoredMessage};
pub use segment::{pending_marker_len, segment, SegmentedMessage, Span, SpanKind};
pub use session::ChatSession;
pub use store::ConversationStore;
