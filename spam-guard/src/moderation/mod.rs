//! Moderation of inbound chat events
//!
//! Filters events the guard should not look at, runs the decision pipeline,
//! and on spam asks the transport to delete the message for everyone. The
//! account must be privileged in the channel; without that nothing happens.
//! In dry-run mode the deletion is reported but not executed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::GuardConfig;
use crate::error::Result;
use crate::pipeline::SpamPipeline;
use crate::spam::{DetectionLayer, Message, SpamVerdict};

pub mod stats;

pub use stats::{GuardStats, StatsSnapshot};

/// A message as delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub message_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub sender_display_name: String,
    pub text: String,
    pub channel_is_group: bool,
    #[serde(default)]
    pub sender_is_self: bool,
}

impl InboundEvent {
    pub fn to_message(&self) -> Message {
        Message::new(
            self.text.as_str(),
            self.sender_display_name.as_str(),
            self.channel_name.as_str(),
        )
    }
}

/// Operations the transport performs on the guard's behalf
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChannelActions: Send + Sync {
    /// Does the guard's own account hold moderator rights in the channel
    async fn is_privileged(&self, channel_id: &str) -> Result<bool>;

    /// Remove a message for all participants
    async fn delete_for_everyone(&self, channel_id: &str, message_id: &str) -> Result<()>;
}

/// Why an event was not classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotGroup,
    OwnMessage,
    EmptyText,
    NotMonitored,
}

/// What happened to a spam message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamAction {
    Deleted,
    DryRun,
    NotPrivileged,
    PrivilegeCheckFailed,
    DeleteFailed,
}

/// Result of moderating one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModerationOutcome {
    Skipped {
        reason: SkipReason,
    },
    Clean {
        layer: DetectionLayer,
        verdict: SpamVerdict,
    },
    Flagged {
        layer: DetectionLayer,
        verdict: SpamVerdict,
        action: SpamAction,
    },
}

impl ModerationOutcome {
    pub fn is_spam(&self) -> bool {
        matches!(self, ModerationOutcome::Flagged { .. })
    }
}

struct ModeratorInner {
    pipeline: SpamPipeline,
    actions: Arc<dyn ChannelActions>,
    stats: GuardStats,
    config: GuardConfig,
}

/// Event moderator. Cheap to clone; clones share the pipeline and counters.
#[derive(Clone)]
pub struct Moderator {
    inner: Arc<ModeratorInner>,
}

impl Moderator {
    pub fn new(pipeline: SpamPipeline, actions: Arc<dyn ChannelActions>) -> Self {
        Self::from_config(&GuardConfig::default(), pipeline, actions)
    }

    /// Build with the moderation settings from `config`
    pub fn from_config(
        config: &GuardConfig,
        pipeline: SpamPipeline,
        actions: Arc<dyn ChannelActions>,
    ) -> Self {
        Self {
            inner: Arc::new(ModeratorInner {
                pipeline,
                actions,
                stats: GuardStats::new(),
                config: config.clone(),
            }),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.inner.config.dry_run
    }

    pub fn pipeline(&self) -> &SpamPipeline {
        &self.inner.pipeline
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    fn skip_reason(&self, event: &InboundEvent) -> Option<SkipReason> {
        if !event.channel_is_group {
            return Some(SkipReason::NotGroup);
        }
        if event.sender_is_self {
            return Some(SkipReason::OwnMessage);
        }
        if event.text.trim().is_empty() {
            return Some(SkipReason::EmptyText);
        }
        if !self.inner.config.is_monitored(&event.channel_id) {
            return Some(SkipReason::NotMonitored);
        }
        None
    }

    /// Moderate one inbound event
    pub async fn handle(&self, event: &InboundEvent) -> ModerationOutcome {
        let stats = &self.inner.stats;
        stats.record_received();

        if let Some(reason) = self.skip_reason(event) {
            debug!("Skipping message {}: {:?}", event.message_id, reason);
            stats.record_skipped();
            return ModerationOutcome::Skipped { reason };
        }

        let decision = self.inner.pipeline.decide(&event.to_message()).await;
        stats.record_decision(decision.layer, decision.verdict.is_spam);

        if !decision.verdict.is_spam {
            return ModerationOutcome::Clean {
                layer: decision.layer,
                verdict: decision.verdict,
            };
        }

        info!(
            "🚫 Spam in {} from {} ({}): {}",
            event.channel_name, event.sender_display_name, decision.layer, decision.verdict
        );

        let action = self.act_on_spam(event).await;
        ModerationOutcome::Flagged {
            layer: decision.layer,
            verdict: decision.verdict,
            action,
        }
    }

    async fn act_on_spam(&self, event: &InboundEvent) -> SpamAction {
        let stats = &self.inner.stats;
        let actions = &self.inner.actions;

        match actions.is_privileged(&event.channel_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "Not an admin in {}, leaving message {} in place",
                    event.channel_id, event.message_id
                );
                stats.record_privilege_denied();
                return SpamAction::NotPrivileged;
            }
            Err(e) => {
                warn!("Privilege check failed for {}: {}", event.channel_id, e);
                stats.record_privilege_denied();
                return SpamAction::PrivilegeCheckFailed;
            }
        }

        if self.is_dry_run() {
            info!(
                "[dry-run] Would delete message {} in {}",
                event.message_id, event.channel_id
            );
            stats.record_dry_run();
            return SpamAction::DryRun;
        }

        match actions
            .delete_for_everyone(&event.channel_id, &event.message_id)
            .await
        {
            Ok(()) => {
                info!("Deleted message {} in {}", event.message_id, event.channel_id);
                stats.record_deleted();
                SpamAction::Deleted
            }
            Err(e) => {
                warn!("Failed to delete message {}: {}", event.message_id, e);
                stats.record_delete_failure();
                SpamAction::DeleteFailed
            }
        }
    }
}
