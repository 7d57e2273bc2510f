//! spam-guard: layered spam classification for group chats
//!
//! Decides whether a chat message is spam by running detectors from
//! cheapest to most expensive and stopping at the first conclusive one.
//!
//! # Layers
//!
//! - **Keywords**: operator blocklist, case-insensitive substring match
//! - **Patterns**: built-in scam phrases, group invite links and vocabulary density
//! - **AI**: an external LLM (Gemini or OpenAI), behind a fixed-window call budget
//!
//! AI failures never surface as errors; they degrade to a negative verdict
//! and the offline layers keep working without any credentials.
//!
//! # Example
//!
//! ```no_run
//! use spam_guard::config::GuardConfig;
//! use spam_guard::llm::Credentials;
//! use spam_guard::pipeline::SpamPipeline;
//! use spam_guard::spam::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GuardConfig::load(None)?;
//!     let pipeline = SpamPipeline::from_config(&config, &Credentials::from_env())?;
//!
//!     let message = Message::new("Join our crypto group t.me/joinchat/abc", "Sam", "Family");
//!     let verdict = pipeline.classify(&message).await;
//!     println!("{}", verdict);
//!
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod moderation;
pub mod pipeline;
pub mod security;
pub mod spam;

pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use moderation::{ChannelActions, InboundEvent, ModerationOutcome, Moderator};
pub use pipeline::{Decision, SpamPipeline};
pub use spam::{DetectionLayer, Message, SpamVerdict};
