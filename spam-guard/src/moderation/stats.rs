//! Moderation counters

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::spam::DetectionLayer;

/// Live counters, shared between concurrent moderation tasks
#[derive(Debug)]
pub struct GuardStats {
    started_at: DateTime<Utc>,
    events_received: AtomicU64,
    events_skipped: AtomicU64,
    messages_classified: AtomicU64,
    keyword_spam: AtomicU64,
    pattern_spam: AtomicU64,
    ai_spam: AtomicU64,
    ai_calls: AtomicU64,
    rate_limited: AtomicU64,
    deleted: AtomicU64,
    dry_run_deletions: AtomicU64,
    privilege_denials: AtomicU64,
    delete_failures: AtomicU64,
}

/// Point-in-time copy of [`GuardStats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub events_received: u64,
    pub events_skipped: u64,
    pub messages_classified: u64,
    pub keyword_spam: u64,
    pub pattern_spam: u64,
    pub ai_spam: u64,
    pub ai_calls: u64,
    pub rate_limited: u64,
    pub deleted: u64,
    pub dry_run_deletions: u64,
    pub privilege_denials: u64,
    pub delete_failures: u64,
}

impl StatsSnapshot {
    /// Spam verdicts across all layers
    pub fn spam_total(&self) -> u64 {
        self.keyword_spam + self.pattern_spam + self.ai_spam
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl GuardStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            events_received: AtomicU64::new(0),
            events_skipped: AtomicU64::new(0),
            messages_classified: AtomicU64::new(0),
            keyword_spam: AtomicU64::new(0),
            pattern_spam: AtomicU64::new(0),
            ai_spam: AtomicU64::new(0),
            ai_calls: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            deleted: AtomicU64::new(0),
            dry_run_deletions: AtomicU64::new(0),
            privilege_denials: AtomicU64::new(0),
            delete_failures: AtomicU64::new(0),
        }
    }

    pub fn record_received(&self) {
        bump(&self.events_received);
    }

    pub fn record_skipped(&self) {
        bump(&self.events_skipped);
    }

    /// Record one pipeline decision
    pub fn record_decision(&self, layer: DetectionLayer, is_spam: bool) {
        bump(&self.messages_classified);
        match layer {
            DetectionLayer::Ai => bump(&self.ai_calls),
            DetectionLayer::RateLimited => bump(&self.rate_limited),
            _ => {}
        }
        if is_spam {
            match layer {
                DetectionLayer::Keyword => bump(&self.keyword_spam),
                DetectionLayer::Pattern => bump(&self.pattern_spam),
                DetectionLayer::Ai => bump(&self.ai_spam),
                _ => {}
            }
        }
    }

    pub fn record_deleted(&self) {
        bump(&self.deleted);
    }

    pub fn record_dry_run(&self) {
        bump(&self.dry_run_deletions);
    }

    pub fn record_privilege_denied(&self) {
        bump(&self.privilege_denials);
    }

    pub fn record_delete_failure(&self) {
        bump(&self.delete_failures);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            started_at: self.started_at,
            events_received: load(&self.events_received),
            events_skipped: load(&self.events_skipped),
            messages_classified: load(&self.messages_classified),
            keyword_spam: load(&self.keyword_spam),
            pattern_spam: load(&self.pattern_spam),
            ai_spam: load(&self.ai_spam),
            ai_calls: load(&self.ai_calls),
            rate_limited: load(&self.rate_limited),
            deleted: load(&self.deleted),
            dry_run_deletions: load(&self.dry_run_deletions),
            privilege_denials: load(&self.privilege_denials),
            delete_failures: load(&self.delete_failures),
        }
    }
}

impl Default for GuardStats {
    fn default() -> Self {
        Self::new()
    }
}
