pub use action::{ActionKind, ActionRequest, Draft, Tone, ToneSelection};
pub use config::{Config, GenerationSettings, ProviderAuth, ProviderConfig, ProviderKind};
pub use controller::{failure_message, Interaction, InteractionController};
pub use dispatcher::ActionDispatcher;
pub use error::GenerationError;
pub use llm::{GenerationClient, LlmClient};
pub use prompt::build_prompt;
pub use redaction::redact_sensitive_text;
pub use reply::{parse_structured_reply, subject_line_index, StructuredReply};

pub mod action;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod redaction;
pub mod reply;
