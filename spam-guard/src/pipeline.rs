//! Decision pipeline
//!
//! Runs detection stages in order, cheapest first:
//!
//! 1. operator keywords
//! 2. heuristic patterns
//! 3. AI classifier (only when enabled, and only if the call budget admits it)
//!
//! Each stage either concludes or passes. The first conclusive verdict is
//! returned as-is; stages never re-threshold each other's output. When no
//! stage concludes, the last fallback verdict handed along is returned.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::classifier::AiClassifier;
use crate::config::GuardConfig;
use crate::error::Result;
use crate::llm::{build_backend, ClassifierBackend, Credentials};
use crate::security::{RateGate, ResetTask};
use crate::spam::patterns::NO_PATTERNS_REASON;
use crate::spam::{DetectionLayer, KeywordMatcher, Message, PatternEngine, PatternRuleSet, SpamVerdict};

/// Reason reported when the AI budget is exhausted
pub const RATE_LIMITED_REASON: &str = "rate limited — rule-based only";

/// Result of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Final verdict, stop here
    Conclusive(SpamVerdict),
    /// Continue; optionally hand along the best verdict so far
    Inconclusive(Option<SpamVerdict>),
    /// Final: the AI call budget is exhausted, rules-only verdict applies
    RateLimited,
}

/// One step of the pipeline
#[async_trait::async_trait]
pub trait DetectionStage: Send + Sync {
    /// Layer reported for verdicts from this stage
    fn layer(&self) -> DetectionLayer;

    async fn evaluate(&self, message: &Message) -> StageOutcome;
}

/// Keyword blocklist stage
pub struct KeywordStage {
    matcher: KeywordMatcher,
}

impl KeywordStage {
    pub fn new(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }
}

#[async_trait::async_trait]
impl DetectionStage for KeywordStage {
    fn layer(&self) -> DetectionLayer {
        DetectionLayer::Keyword
    }

    async fn evaluate(&self, message: &Message) -> StageOutcome {
        match self.matcher.check(&message.text) {
            Some(verdict) => StageOutcome::Conclusive(verdict),
            None => StageOutcome::Inconclusive(None),
        }
    }
}

/// Heuristic pattern stage
pub struct PatternStage {
    engine: PatternEngine,
}

impl PatternStage {
    pub fn new(engine: PatternEngine) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl DetectionStage for PatternStage {
    fn layer(&self) -> DetectionLayer {
        DetectionLayer::Pattern
    }

    async fn evaluate(&self, message: &Message) -> StageOutcome {
        let verdict = self.engine.evaluate(&message.text);
        if verdict.is_spam {
            StageOutcome::Conclusive(verdict)
        } else {
            StageOutcome::Inconclusive(Some(verdict))
        }
    }
}

/// AI stage, guarded by the call budget
pub struct AiStage {
    classifier: AiClassifier,
    gate: Arc<RateGate>,
}

impl AiStage {
    pub fn new(classifier: AiClassifier, gate: Arc<RateGate>) -> Self {
        Self { classifier, gate }
    }
}

#[async_trait::async_trait]
impl DetectionStage for AiStage {
    fn layer(&self) -> DetectionLayer {
        DetectionLayer::Ai
    }

    async fn evaluate(&self, message: &Message) -> StageOutcome {
        if !self.gate.try_admit().await {
            return StageOutcome::RateLimited;
        }
        StageOutcome::Conclusive(self.classifier.classify(message).await)
    }
}

/// Verdict plus the layer that produced it
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Decision {
    pub verdict: SpamVerdict,
    pub layer: DetectionLayer,
}

/// Ordered detection pipeline
pub struct SpamPipeline {
    stages: Vec<Box<dyn DetectionStage>>,
    gate: Option<Arc<RateGate>>,
    _reset_task: Option<ResetTask>,
}

impl SpamPipeline {
    /// Start building a pipeline
    pub fn builder() -> SpamPipelineBuilder {
        SpamPipelineBuilder::default()
    }

    /// Build the production pipeline from configuration.
    ///
    /// Must be called inside a tokio runtime when AI is enabled, since the
    /// gate's reset timer is spawned here.
    pub fn from_config(config: &GuardConfig, credentials: &Credentials) -> Result<Self> {
        let rules = match &config.patterns_file {
            Some(path) => load_rules(path)?,
            None => PatternRuleSet::builtin()?,
        };

        let mut builder = Self::builder()
            .keywords(KeywordMatcher::new(&config.custom_keywords))
            .patterns(PatternEngine::new(rules));

        if config.use_ai {
            if let Some(backend) = build_backend(&config.ai, credentials) {
                builder = builder.ai(AiClassifier::from_config(backend, &config.ai));
            }
        } else {
            info!("AI classification turned off (use_ai = false)");
        }

        builder
            .rate_limit(
                config.rate_limit.max_checks_per_window,
                config.rate_limit.window(),
            )
            .build()
    }

    /// Is an AI stage configured
    pub fn ai_enabled(&self) -> bool {
        self.gate.is_some()
    }

    /// AI call budget, when AI is enabled
    pub fn gate(&self) -> Option<&Arc<RateGate>> {
        self.gate.as_ref()
    }

    /// Classify a message
    pub async fn classify(&self, message: &Message) -> SpamVerdict {
        self.decide(message).await.verdict
    }

    /// Classify a message and report which layer decided
    pub async fn decide(&self, message: &Message) -> Decision {
        let mut fallback: Option<SpamVerdict> = None;

        for stage in &self.stages {
            match stage.evaluate(message).await {
                StageOutcome::Conclusive(verdict) => {
                    let layer = stage.layer();
                    debug!("{} stage concluded: {}", layer, verdict);
                    return Decision { verdict, layer };
                }
                StageOutcome::RateLimited => {
                    debug!("{} stage denied by call budget", stage.layer());
                    return Decision {
                        verdict: SpamVerdict::clean(RATE_LIMITED_REASON),
                        layer: DetectionLayer::RateLimited,
                    };
                }
                StageOutcome::Inconclusive(verdict) => {
                    debug!("{} stage inconclusive", stage.layer());
                    if verdict.is_some() {
                        fallback = verdict;
                    }
                }
            }
        }

        Decision {
            verdict: fallback.unwrap_or_else(|| SpamVerdict::clean(NO_PATTERNS_REASON)),
            layer: DetectionLayer::Default,
        }
    }
}

fn load_rules(path: &Path) -> Result<PatternRuleSet> {
    let rules = PatternRuleSet::from_file(path)?;
    info!(
        "Loaded pattern table from {} ({} vocabulary terms)",
        path.display(),
        rules.vocabulary_size()
    );
    Ok(rules)
}

/// Builder for [`SpamPipeline`]
pub struct SpamPipelineBuilder {
    keywords: KeywordMatcher,
    patterns: Option<PatternEngine>,
    ai: Option<AiClassifier>,
    max_calls: u32,
    window: std::time::Duration,
    gate: Option<Arc<RateGate>>,
}

impl Default for SpamPipelineBuilder {
    fn default() -> Self {
        Self {
            keywords: KeywordMatcher::default(),
            patterns: None,
            ai: None,
            max_calls: crate::security::rate_limit::DEFAULT_MAX_CALLS,
            window: crate::security::rate_limit::DEFAULT_WINDOW,
            gate: None,
        }
    }
}

impl SpamPipelineBuilder {
    pub fn keywords(mut self, matcher: KeywordMatcher) -> Self {
        self.keywords = matcher;
        self
    }

    pub fn patterns(mut self, engine: PatternEngine) -> Self {
        self.patterns = Some(engine);
        self
    }

    pub fn ai(mut self, classifier: AiClassifier) -> Self {
        self.ai = Some(classifier);
        self
    }

    /// Convenience for tests and embedders with their own backend
    pub fn ai_backend(
        self,
        backend: Arc<dyn ClassifierBackend>,
        timeout: std::time::Duration,
    ) -> Self {
        self.ai(AiClassifier::new(backend, timeout))
    }

    pub fn rate_limit(mut self, max_calls: u32, window: std::time::Duration) -> Self {
        self.max_calls = max_calls;
        self.window = window;
        self
    }

    /// Use an existing gate instead of spawning a new one. The caller owns
    /// its reset timer.
    pub fn gate(mut self, gate: Arc<RateGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Assemble the stages. Fails only if the built-in pattern table does
    /// not compile and no engine was supplied.
    pub fn build(self) -> Result<SpamPipeline> {
        let patterns = match self.patterns {
            Some(engine) => engine,
            None => PatternEngine::builtin()?,
        };
        let mut stages: Vec<Box<dyn DetectionStage>> = vec![
            Box::new(KeywordStage::new(self.keywords)),
            Box::new(PatternStage::new(patterns)),
        ];

        let mut gate = None;
        let mut reset_task = None;

        if let Some(classifier) = self.ai {
            let shared = match self.gate {
                Some(existing) => existing,
                None => {
                    let created = Arc::new(RateGate::new(self.max_calls, self.window));
                    reset_task = Some(created.spawn_reset_task());
                    created
                }
            };
            stages.push(Box::new(AiStage::new(classifier, Arc::clone(&shared))));
            gate = Some(shared);
        }

        Ok(SpamPipeline {
            stages,
            gate,
            _reset_task: reset_task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockBackend;
    use std::time::Duration;

    fn msg(text: &str) -> Message {
        Message::new(text, "Robin", "Book Club")
    }

    #[tokio::test]
    async fn test_keyword_stage_is_isolated() {
        let stage = KeywordStage::new(KeywordMatcher::new(["promo"]));
        assert!(matches!(
            stage.evaluate(&msg("PROMO inside")).await,
            StageOutcome::Conclusive(_)
        ));
        assert_eq!(
            stage.evaluate(&msg("hello")).await,
            StageOutcome::Inconclusive(None)
        );
    }

    #[tokio::test]
    async fn test_pattern_stage_hands_along_negative_verdict() {
        let stage = PatternStage::new(PatternEngine::builtin().unwrap());
        assert_eq!(
            stage.evaluate(&msg("lunch at noon?")).await,
            StageOutcome::Inconclusive(Some(SpamVerdict::clean(NO_PATTERNS_REASON)))
        );
    }

    #[tokio::test]
    async fn test_ai_stage_denied_by_gate() {
        let gate = Arc::new(RateGate::new(1, Duration::from_secs(60)));
        let backend = Arc::new(MockBackend::verdict(true, 90, "spam"));
        let stage = AiStage::new(
            AiClassifier::new(backend.clone(), Duration::from_secs(5)),
            gate,
        );

        assert_eq!(
            stage.evaluate(&msg("hi")).await,
            StageOutcome::Conclusive(SpamVerdict::spam(90, "spam"))
        );
        assert_eq!(
            stage.evaluate(&msg("hi")).await,
            StageOutcome::RateLimited
        );
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_keyword_short_circuits_everything() {
        let backend = Arc::new(MockBackend::verdict(false, 99, "fine"));
        let pipeline = SpamPipeline::builder()
            .keywords(KeywordMatcher::new(["hello"]))
            .ai_backend(backend.clone(), Duration::from_secs(5))
            .build()
            .unwrap();

        let decision = pipeline.decide(&msg("Hello and double your money")).await;
        assert_eq!(decision.layer, DetectionLayer::Keyword);
        assert_eq!(decision.verdict.confidence, 100);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_pattern_spam_skips_ai() {
        let backend = Arc::new(MockBackend::verdict(false, 99, "fine"));
        let pipeline = SpamPipeline::builder()
            .ai_backend(backend.clone(), Duration::from_secs(5))
            .build()
            .unwrap();

        let decision = pipeline.decide(&msg("guaranteed returns every week")).await;
        assert_eq!(decision.layer, DetectionLayer::Pattern);
        assert_eq!(decision.verdict.confidence, 95);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_without_ai_returns_rule_verdict() {
        let pipeline = SpamPipeline::builder().build().unwrap();
        assert!(!pipeline.ai_enabled());

        let decision = pipeline.decide(&msg("Hey, did you see the game last night?")).await;
        assert_eq!(decision.layer, DetectionLayer::Default);
        assert_eq!(decision.verdict, SpamVerdict::clean(NO_PATTERNS_REASON));
    }

    #[tokio::test]
    async fn test_ai_verdict_returned_verbatim() {
        let backend = Arc::new(MockBackend::verdict(true, 65, "borderline"));
        let pipeline = SpamPipeline::builder()
            .ai_backend(backend, Duration::from_secs(5))
            .build()
            .unwrap();

        let decision = pipeline.decide(&msg("message me for details")).await;
        assert_eq!(decision.layer, DetectionLayer::Ai);
        assert_eq!(decision.verdict, SpamVerdict::not_spam(65, "borderline"));
    }

    #[tokio::test]
    async fn test_rate_limited_layer() {
        let pipeline = SpamPipeline::builder()
            .ai_backend(
                Arc::new(MockBackend::verdict(false, 10, "ok")),
                Duration::from_secs(5),
            )
            .rate_limit(1, Duration::from_secs(60))
            .build()
            .unwrap();

        pipeline.decide(&msg("first")).await;
        let decision = pipeline.decide(&msg("second")).await;
        assert_eq!(decision.layer, DetectionLayer::RateLimited);
        assert_eq!(decision.verdict, SpamVerdict::clean(RATE_LIMITED_REASON));
    }

    #[tokio::test]
    async fn test_ai_reason_text_does_not_change_layer() {
        let backend = Arc::new(MockBackend::verdict(false, 10, RATE_LIMITED_REASON));
        let pipeline = SpamPipeline::builder()
            .ai_backend(backend.clone(), Duration::from_secs(5))
            .build()
            .unwrap();

        let decision = pipeline.decide(&msg("anyone free on Thursday?")).await;
        assert_eq!(decision.layer, DetectionLayer::Ai);
        assert_eq!(decision.verdict, SpamVerdict::not_spam(10, RATE_LIMITED_REASON));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_from_config_without_credentials() {
        let pipeline =
            SpamPipeline::from_config(&GuardConfig::default(), &Credentials::default()).unwrap();
        assert!(!pipeline.ai_enabled());
    }

    #[tokio::test]
    async fn test_from_config_respects_use_ai() {
        let config = GuardConfig {
            use_ai: false,
            ..GuardConfig::default()
        };
        let credentials = Credentials {
            gemini_api_key: Some("key".to_string()),
            openai_api_key: None,
        };
        let pipeline = SpamPipeline::from_config(&config, &credentials).unwrap();
        assert!(!pipeline.ai_enabled());

        let pipeline = SpamPipeline::from_config(&GuardConfig::default(), &credentials).unwrap();
        assert!(pipeline.ai_enabled());
        assert_eq!(pipeline.gate().unwrap().max_calls(), 30);
    }
}
