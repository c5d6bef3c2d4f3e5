//! A single chat session: ordered exchanges against one daemon
//!
//! Each send owns its own response accumulator (inside the client stream).
//! The transcript is the only shared state and every change to it is
//! announced on the session's [`EventBus`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::StreamExt;
use ochat_client::{ChatTurn, OllamaClient};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::{
    bus::{ChatEvent, EventBus},
    error::{SessionError, SessionResult},
    exchange::ChatExchange,
    models::Conversation,
    store::ConversationStore,
};

/// Conversation a session writes finished exchanges to
#[derive(Debug)]
struct Binding {
    store: ConversationStore,
    conversation: Conversation,
}

/// Clears the in-flight flag however the send ends
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Transcript plus the machinery to extend it
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: OllamaClient,
    transcript: Arc<RwLock<Vec<ChatExchange>>>,
    in_flight: Arc<AtomicBool>,
    bus: EventBus,
    binding: Option<Arc<Mutex<Binding>>>,
}

impl ChatSession {
    /// Session with an in-memory transcript only
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            transcript: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            bus: EventBus::new(),
            binding: None,
        }
    }

    /// Session that appends every finished exchange to `conversation`
    pub fn with_conversation(
        client: OllamaClient,
        store: ConversationStore,
        conversation: Conversation,
    ) -> Self {
        let mut session = Self::new(client);
        session.binding = Some(Arc::new(Mutex::new(Binding {
            store,
            conversation,
        })));
        session
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn transcript(&self) -> Vec<ChatExchange> {
        self.transcript.read().await.clone()
    }

    pub async fn exchange(&self, index: usize) -> SessionResult<ChatExchange> {
        self.transcript
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or(SessionError::ExchangeNotFound(index))
    }

    /// Submit a turn and stream its response into the transcript.
    ///
    /// Only one send may run at a time; an overlapping call fails with
    /// [`SessionError::SendInFlight`] and changes nothing. On a stream error
    /// the exchange keeps its partial text and the error is returned.
    pub async fn send(&self, turn: ChatTurn) -> SessionResult<usize> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected send while another response is streaming");
            return Err(SessionError::SendInFlight);
        }
        let _guard = InFlightGuard(self.in_flight.clone());

        turn.validate()?;

        let index = {
            let mut transcript = self.transcript.write().await;
            let index = transcript.len();
            transcript.push(ChatExchange::new(index, turn.clone()));
            index
        };
        self.bus.publish(ChatEvent::ExchangeStarted { index });

        let result = self.stream_into(index, &turn).await;

        let (response, failure) = {
            let mut transcript = self.transcript.write().await;
            let exchange = transcript
                .get_mut(index)
                .ok_or(SessionError::ExchangeNotFound(index))?;
            let failure = match &result {
                Ok(()) => {
                    exchange.complete();
                    None
                }
                Err(e) => {
                    let notice = e.notice();
                    exchange.fail(notice.clone());
                    Some(notice)
                }
            };
            (exchange.response().to_string(), failure)
        };

        match failure {
            None => self.bus.publish(ChatEvent::ExchangeCompleted { index }),
            Some(notice) => self.bus.publish(ChatEvent::ExchangeFailed { index, notice }),
        }

        self.persist(&turn, response).await;

        result.map(|()| index)
    }

    async fn stream_into(&self, index: usize, turn: &ChatTurn) -> SessionResult<()> {
        let mut stream = self.client.send_chat(turn).await?;

        while let Some(update) = stream.next().await {
            let update = update?;
            {
                let mut transcript = self.transcript.write().await;
                let exchange = transcript
                    .get_mut(index)
                    .ok_or(SessionError::ExchangeNotFound(index))?;
                exchange.apply(&update)?;
            }
            self.bus.publish(ChatEvent::ResponseUpdated {
                index,
                delta: update.delta,
                len: update.len,
            });
        }

        debug!("Exchange {} finished streaming", index);
        Ok(())
    }

    async fn persist(&self, turn: &ChatTurn, response: String) {
        let Some(binding) = &self.binding else {
            return;
        };

        let mut binding = binding.lock().await;
        binding.conversation.push_user(turn.prompt.clone());
        binding.conversation.push_assistant(response);

        if let Err(e) = binding.store.save(&binding.conversation).await {
            error!(
                "Failed to save conversation {}: {}",
                binding.conversation.id, e
            );
        }
    }

    /// Clear the transcript. Refused while a response is streaming.
    pub async fn reset(&self) -> SessionResult<()> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::SendInFlight);
        }
        let _guard = InFlightGuard(self.in_flight.clone());

        self.transcript.write().await.clear();
        self.bus.publish(ChatEvent::TranscriptCleared);
        Ok(())
    }
}

