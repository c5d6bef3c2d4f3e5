//! Chat command - one-shot prompts and the interactive REPL

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::mpsc as std_mpsc,
};

use async_trait::async_trait;
use ochat_client::{ChatTurn, ImageAttachment, ModelManager, OllamaClient};
use ochat_sessions::{ChatEvent, ChatSession, Conversation, ConversationStore, Span};
use rustyline::{error::ReadlineError, DefaultEditor};
use tokio::sync::{broadcast::error::TryRecvError, mpsc};
use tracing::debug;

use super::{connect, conversations::parse_id, Command};
use crate::{
    error::{CliError, CliResult},
    output::{self, OutputStyle},
    render::StreamRenderer,
};

const TITLE_CHARS: usize = 40;

/// Chat with a model
#[derive(Debug, Clone, Default)]
pub struct ChatCommand {
    /// Sent once, then the command exits; no REPL
    pub message: Option<String>,
    pub model: Option<String>,
    pub system: Option<String>,
    /// Attached to the first prompt only
    pub image: Option<PathBuf>,
    /// Saved conversation to continue
    pub conversation: Option<String>,
}

/// One line typed at the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Quit,
    Reset,
    Prompt(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ReplInput::Empty,
            "/quit" | "/exit" => ReplInput::Quit,
            "/reset" => ReplInput::Reset,
            _ => ReplInput::Prompt(line.to_string()),
        }
    }
}

/// Title for a conversation started with `prompt`
pub fn title_from(prompt: &str) -> String {
    let first_line = prompt.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > TITLE_CHARS {
        let cut: String = first_line.chars().take(TITLE_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        first_line.to_string()
    }
}

impl ChatCommand {
    pub fn new() -> Self {
        Self::default()
    }

    fn turn(&self, model: &str, prompt: String, image: Option<ImageAttachment>) -> ChatTurn {
        let mut turn = ChatTurn::new(model, prompt);
        if let Some(system) = &self.system {
            turn = turn.with_system(system.clone());
        }
        if let Some(image) = image {
            turn = turn.with_image(image);
        }
        turn
    }

    /// The requested model, or the first one installed
    async fn resolve_model(&self, client: &OllamaClient) -> CliResult<String> {
        if let Some(model) = &self.model {
            return Ok(model.clone());
        }

        let manager = ModelManager::new(client.clone());
        manager.refresh().await?;
        let model = manager
            .catalog()
            .default_duplicate_source()
            .await
            .ok_or_else(|| CliError::InvalidArgument {
                message: "No models installed; run 'ochat models pull NAME' first".to_string(),
            })?;
        debug!("No --model given, using {}", model);
        Ok(model)
    }

    async fn load_image(&self) -> CliResult<Option<ImageAttachment>> {
        match &self.image {
            Some(path) => Ok(Some(ImageAttachment::from_path(path).await?)),
            None => Ok(None),
        }
    }

    /// Session bound to the saved conversation named by `--conversation`
    async fn resume_session(&self, client: &OllamaClient) -> CliResult<Option<ChatSession>> {
        let Some(id) = &self.conversation else {
            return Ok(None);
        };

        let store = ConversationStore::new().await?;
        let conversation = store.load(&parse_id(id)?).await?;
        Ok(Some(ChatSession::with_conversation(
            client.clone(),
            store,
            conversation,
        )))
    }

    async fn one_shot(
        &self,
        client: OllamaClient,
        model: &str,
        message: &str,
        session: Option<ChatSession>,
        image: Option<ImageAttachment>,
    ) -> CliResult<()> {
        let style = OutputStyle::default();
        let session = session.unwrap_or_else(|| ChatSession::new(client));
        let turn = self.turn(model, message.to_string(), image);
        stream_turn(&session, turn, &style).await
    }

    async fn repl(
        &self,
        client: OllamaClient,
        model: &str,
        mut session: Option<ChatSession>,
        mut image: Option<ImageAttachment>,
    ) -> CliResult<()> {
        let style = OutputStyle::default();
        println!(
            "{}",
            style.info(&format!(
                "Chatting with {}. /reset clears the transcript, /quit exits.",
                model
            ))
        );

        let mut reader = PromptReader::spawn();

        loop {
            let line = match reader.read("> ").await {
                Some(PromptInput::Line(line)) => line,
                Some(PromptInput::Closed) | None => break,
                Some(PromptInput::Failed(e)) => return Err(CliError::Internal(e)),
            };

            match ReplInput::parse(&line) {
                ReplInput::Empty => continue,
                ReplInput::Quit => break,
                ReplInput::Reset => {
                    if let Some(active) = &session {
                        active.reset().await?;
                    }
                    println!("{}", style.info("Transcript cleared"));
                }
                ReplInput::Prompt(text) => {
                    let active = match &session {
                        Some(active) => active.clone(),
                        None => {
                            let store = ConversationStore::new().await?;
                            let fresh = ChatSession::with_conversation(
                                client.clone(),
                                store,
                                Conversation::new(title_from(&text)),
                            );
                            session = Some(fresh.clone());
                            fresh
                        }
                    };

                    let turn = self.turn(model, text, image.take());
                    if let Err(e) = stream_turn(&active, turn, &style).await {
                        output::print_error(&e.user_message());
                    }
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }
}

#[async_trait]
impl Command for ChatCommand {
    async fn execute(&self) -> CliResult<()> {
        let client = connect()?;
        let model = self.resolve_model(&client).await?;
        let image = self.load_image().await?;
        let session = self.resume_session(&client).await?;

        match &self.message {
            Some(message) => {
                self.one_shot(client, &model, message, session, image)
                    .await
            }
            None => self.repl(client, &model, session, image).await,
        }
    }
}

/// Send `turn` on `session`, printing the response as it streams.
///
/// Whatever arrived before a failure stays on screen; the error is returned
/// for the caller to report.
pub async fn stream_turn(
    session: &ChatSession,
    turn: ChatTurn,
    style: &OutputStyle,
) -> CliResult<()> {
    let mut events = session.bus().subscribe();
    let mut renderer = StreamRenderer::new();
    let mut started = None;

    let send = session.send(turn);
    tokio::pin!(send);

    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            event = events.recv() => {
                if let Ok(event) = event {
                    on_event(event, &mut renderer, &mut started, style)?;
                }
            }
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => on_event(event, &mut renderer, &mut started, style)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    if let Some(index) = started {
        let exchange = session.exchange(index).await?;
        print_spans(renderer.finish(exchange.response()), style)?;
        println!();
    }

    result.map(|_| ()).map_err(CliError::from)
}

fn on_event(
    event: ChatEvent,
    renderer: &mut StreamRenderer,
    started: &mut Option<usize>,
    style: &OutputStyle,
) -> CliResult<()> {
    match event {
        ChatEvent::ExchangeStarted { index } => *started = Some(index),
        ChatEvent::ResponseUpdated { delta, len, .. } => {
            print_spans(renderer.push(&delta, len), style)?
        }
        _ => {}
    }
    Ok(())
}

fn print_spans(spans: Vec<Span>, style: &OutputStyle) -> CliResult<()> {
    if spans.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout();
    for span in &spans {
        write!(stdout, "{}", style.span(span))?;
    }
    stdout.flush()?;
    Ok(())
}

enum PromptInput {
    Line(String),
    /// Ctrl-C or Ctrl-D
    Closed,
    Failed(String),
}

/// Line editor running on its own thread so it never crosses an await
struct PromptReader {
    prompts: std_mpsc::Sender<String>,
    lines: mpsc::Receiver<PromptInput>,
}

impl PromptReader {
    fn spawn() -> Self {
        let (prompts, prompt_rx) = std_mpsc::channel::<String>();
        let (line_tx, lines) = mpsc::channel(1);

        std::thread::spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    let _ = line_tx.blocking_send(PromptInput::Failed(e.to_string()));
                    return;
                }
            };

            while let Ok(prompt) = prompt_rx.recv() {
                let input = match editor.readline(&prompt) {
                    Ok(line) => {
                        let _ = editor.add_history_entry(line.as_str());
                        PromptInput::Line(line)
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        PromptInput::Closed
                    }
                    Err(e) => PromptInput::Failed(e.to_string()),
                };
                if line_tx.blocking_send(input).is_err() {
                    break;
                }
            }
        });

        Self { prompts, lines }
    }

    async fn read(&mut self, prompt: &str) -> Option<PromptInput> {
        self.prompts.send(prompt.to_string()).ok()?;
        self.lines.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_input_parsing() {
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse("/quit"), ReplInput::Quit);
        assert_eq!(ReplInput::parse(" /exit "), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/reset"), ReplInput::Reset);
        assert_eq!(
            ReplInput::parse("why is the sky blue?"),
            ReplInput::Prompt("why is the sky blue?".to_string())
        );
    }

    #[test]
    fn test_title_from_prompt() {
        assert_eq!(title_from("  short one \nsecond line"), "short one");

        let long = "a".repeat(60);
        let title = title_from(&long);
        assert_eq!(title.chars().count(), TITLE_CHARS + 1);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_turn_carries_system_prompt() {
        let cmd = ChatCommand {
            system: Some("Be brief".to_string()),
            ..ChatCommand::new()
        };
        let turn = cmd.turn("llama3", "hi".to_string(), None);
        assert_eq!(turn.model, "llama3");
        assert_eq!(turn.system.as_deref(), Some("Be brief"));
        assert!(turn.image.is_none());
    }
}
