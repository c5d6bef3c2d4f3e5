// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::*;
use crate::error::CliResult;

/// ochat - chat with models served by a local Ollama daemon
#[derive(Parser, Debug)]
#[command(name = "ochat")]
#[command(bin_name = "ochat")]
#[command(about = "Chat with models served by a local Ollama daemon")]
#[command(
    long_about = "ochat: a terminal chat client for a local Ollama daemon.\n\nQuick start:\n  • ochat models pull llama3   Download a model\n  • ochat chat                 Start an interactive chat\n  • ochat chat \"hello\"         Ask a single question\n  • ochat config show          Show the daemon address and timeouts"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage models on the daemon
    #[command(about = "List, pull, copy and delete models")]
    Models {
        #[command(subcommand)]
        action: ModelsSubcommand,
    },

    /// Chat with a model
    #[command(about = "Chat with a model, interactively or with a single message")]
    Chat {
        /// Message to send; starts the interactive prompt when omitted
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,

        /// Model to use (default: first installed model)
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt for this chat
        #[arg(short, long)]
        system: Option<String>,

        /// PNG or JPEG image to attach to the first message
        #[arg(short, long, value_name = "PATH")]
        image: Option<PathBuf>,

        /// Continue a saved conversation
        #[arg(short, long, value_name = "ID")]
        conversation: Option<String>,
    },

    /// Manage configuration settings
    #[command(about = "View and change the daemon connection settings")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },

    /// Manage saved conversations
    #[command(about = "List, show and delete saved conversations")]
    Conversations {
        #[command(subcommand)]
        action: Option<ConversationsSubcommand>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ModelsSubcommand {
    /// List installed models
    #[command(alias = "ls")]
    List,

    /// Download a model
    Pull {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a model
    #[command(alias = "delete")]
    Rm {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Duplicate a model under a new name
    Cp {
        #[arg(value_name = "DEST")]
        destination: String,

        /// Model to copy (default: first installed model)
        #[arg(long, value_name = "SRC")]
        from: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigSubcommand {
    /// Show effective settings
    Show,

    /// Set a value in the global config file
    Set {
        /// host, port, timeoutRequest or timeoutResource
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Show config file locations
    Path,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConversationsSubcommand {
    /// List saved conversations, newest first
    List,

    /// Print a conversation
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a conversation
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        // No subcommand starts an interactive chat
        let command = cli.command.clone().unwrap_or(Commands::Chat {
            message: None,
            model: None,
            system: None,
            image: None,
            conversation: None,
        });

        Self::handler(command).execute().await
    }

    /// Handler for a parsed command
    pub fn handler(command: Commands) -> Box<dyn Command> {
        match command {
            Commands::Models { action } => {
                let action = match action {
                    ModelsSubcommand::List => ModelsAction::List,
                    ModelsSubcommand::Pull { name } => ModelsAction::Pull { name },
                    ModelsSubcommand::Rm { name } => ModelsAction::Delete { name },
                    ModelsSubcommand::Cp { destination, from } => {
                        ModelsAction::Copy { destination, from }
                    }
                };
                Box::new(ModelsCommand::new(action))
            }
            Commands::Chat {
                message,
                model,
                system,
                image,
                conversation,
            } => Box::new(ChatCommand {
                message,
                model,
                system,
                image,
                conversation,
            }),
            Commands::Config { action } => {
                let action = match action.unwrap_or(ConfigSubcommand::Show) {
                    ConfigSubcommand::Show => ConfigAction::Show,
                    ConfigSubcommand::Set { key, value } => ConfigAction::Set(key, value),
                    ConfigSubcommand::Path => ConfigAction::Path,
                };
                Box::new(ConfigCommand::new(action))
            }
            Commands::Conversations { action } => {
                let action = match action.unwrap_or(ConversationsSubcommand::List) {
                    ConversationsSubcommand::List => ConversationsAction::List,
                    ConversationsSubcommand::Show { id } => ConversationsAction::Show { id },
                    ConversationsSubcommand::Delete { id } => ConversationsAction::Delete { id },
                };
                Box::new(ConversationsCommand::new(action))
            }
        }
    }
}
