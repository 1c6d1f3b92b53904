//! Complete gesture classification pipeline.
//!
//! Integrates frame acquisition, quantized inference, dequantization,
//! winner selection, vote debouncing, and decision reporting into a
//! continuous single-writer loop:
//!
//! 1. **Acquire**: pull one frame from the camera source
//! 2. **Infer**: fill the input tensor and invoke the interpreter
//! 3. **Decode + classify**: dequantize the output vector, pick the winner
//! 4. **Vote**: push the winner into the vote window
//! 5. **Report**: on a completed window, emit the decision
//!
//! Capture and invoke failures mid-loop are logged and the iteration
//! carries on with whatever the shared buffers hold; skipping a frame
//! would desynchronize the vote window from the capture cadence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use mudra_core::{
    CategorySet, ClassificationResult, Error, GestureDecision, QuantizationParams, Result,
};
use mudra_engine::{validate_backend, InferenceBackend, TensorArena};

use crate::capture::FrameSource;
use crate::classify::Classifier;
use crate::report::{DecisionReporter, ScoreTable};
use crate::vote::VoteWindow;

/// Configuration for the gesture pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Category set the model was trained for
    pub categories: CategorySet,

    /// Classifications per vote window
    pub vote_window: usize,

    /// Pause after each loop iteration (milliseconds)
    pub frame_interval_ms: u64,

    /// Soft latency budget for one invocation; overruns are logged
    pub invoke_budget_ms: Option<u64>,

    /// Working-memory arena size (bytes)
    pub arena_bytes: usize,

    /// Emit the full per-inference score table, not just the winner
    pub emit_score_tables: bool,

    /// Decision output queue size
    pub decision_queue_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: CategorySet::hand_digits(),
            vote_window: 5,
            frame_interval_ms: 2000,
            invoke_budget_ms: Some(1000),
            arena_bytes: TensorArena::DEFAULT_BYTES,
            emit_score_tables: true,
            decision_queue_size: 16,
        }
    }
}

impl PipelineConfig {
    pub fn with_categories(mut self, categories: CategorySet) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_vote_window(mut self, capacity: usize) -> Self {
        self.vote_window = capacity;
        self
    }

    pub fn with_frame_interval_ms(mut self, millis: u64) -> Self {
        self.frame_interval_ms = millis;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("category set must not be empty".into()));
        }
        if self.vote_window == 0 {
            return Err(Error::Config("vote window must be non-zero".into()));
        }
        if self.arena_bytes == 0 {
            return Err(Error::Config("arena size must be non-zero".into()));
        }
        if self.decision_queue_size == 0 {
            return Err(Error::Config("decision queue must be non-zero".into()));
        }
        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: &str) -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MUDRA"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("MUDRA"))
            .build()?;

        settings.try_deserialize()
    }
}

/// Everything one processed inference produced
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub classification: ClassificationResult,
    pub table: ScoreTable,
    /// Present on the inference that completed a vote window
    pub decision: Option<GestureDecision>,
}

/// Post-processing context: classifier, vote window, inference counter.
///
/// Owned by exactly one loop; all pipeline state lives here rather than
/// in process-wide globals, which is what keeps the single-writer
/// invariant checkable by construction.
pub struct GesturePipeline {
    classifier: Classifier,
    window: VoteWindow,
    inferences: u64,
}

impl GesturePipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: Classifier::new(config.categories.clone()),
            window: VoteWindow::new(config.vote_window, config.categories.len())?,
            inferences: 0,
        })
    }

    /// Process one raw output vector: decode, classify, vote.
    ///
    /// Returns the classification, the diagnostic score table, and the
    /// gesture decision when this inference completed a vote window.
    pub fn process_raw(&mut self, raw: &[u8], params: &QuantizationParams) -> Result<FrameOutcome> {
        let scored = self.classifier.evaluate(raw, params)?;
        self.inferences += 1;

        let table = ScoreTable::new(
            self.classifier.categories(),
            &scored.percentages,
            &scored.scores,
            scored.result.index,
        );

        let decision = self
            .window
            .push(scored.result.index)
            .map(|vote| GestureDecision::from_vote(vote, self.classifier.categories()));

        Ok(FrameOutcome {
            classification: scored.result,
            table,
            decision,
        })
    }

    pub fn categories(&self) -> &CategorySet {
        self.classifier.categories()
    }

    /// Classifications accumulated toward the next decision
    pub fn pending_votes(&self) -> usize {
        self.window.len()
    }

    /// Total inferences processed
    pub fn inferences(&self) -> u64 {
        self.inferences
    }

    /// Drop any partial vote batch
    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Loop driver owning the arena and the running flag.
///
/// One streaming loop per runtime: the spawned task is the single
/// writer of all pipeline state.
pub struct GestureRuntime {
    config: PipelineConfig,
    classifier: Classifier,
    arena: Arc<TensorArena>,
    is_running: Arc<RwLock<bool>>,
}

impl GestureRuntime {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let classifier = Classifier::new(config.categories.clone());
        Ok(Self {
            config,
            classifier,
            arena: Arc::new(TensorArena::new()),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The working-memory arena handed to the inference backend
    pub fn arena(&self) -> Arc<TensorArena> {
        self.arena.clone()
    }

    /// One-shot classification of an externally captured frame.
    ///
    /// Runs the same startup checks and inference path as the streaming
    /// loop but does not vote; the outcome never carries a decision.
    pub fn classify_frame<B: InferenceBackend>(
        &self,
        backend: &mut B,
        frame: &[u8],
    ) -> Result<FrameOutcome> {
        self.arena.ensure_allocated(self.config.arena_bytes)?;
        validate_backend(backend, &self.config.categories)?;

        backend.fill_input(frame)?;
        backend.invoke()?;

        let raw = backend.raw_scores()?;
        let scored = self.classifier.evaluate(&raw, &backend.quantization_params())?;
        let table = ScoreTable::new(
            self.classifier.categories(),
            &scored.percentages,
            &scored.scores,
            scored.result.index,
        );

        Ok(FrameOutcome {
            classification: scored.result,
            table,
            decision: None,
        })
    }

    /// Start the continuous capture -> infer -> vote -> report loop.
    ///
    /// Startup failures (arena allocation, model mismatch, source start)
    /// are fatal and returned immediately; once the loop is running,
    /// per-iteration failures are logged and the loop carries on.
    pub async fn start_streaming<B, S>(
        &self,
        mut backend: B,
        mut source: S,
        reporter: DecisionReporter,
    ) -> Result<mpsc::Receiver<GestureDecision>>
    where
        B: InferenceBackend + 'static,
        S: FrameSource + 'static,
    {
        let mut reporter = reporter.with_score_tables(self.config.emit_score_tables);

        self.arena.ensure_allocated(self.config.arena_bytes)?;
        validate_backend(&backend, &self.config.categories)?;

        let frame_len = source.format().byte_len();
        if frame_len != backend.input_len() {
            return Err(Error::Config(format!(
                "source delivers {} byte frames, input tensor expects {}",
                frame_len,
                backend.input_len()
            )));
        }

        source.start().await?;
        info!(
            "gesture loop starting: {} categories, window {}, arena {} bytes",
            self.config.categories.len(),
            self.config.vote_window,
            self.arena.capacity()
        );

        let mut pipeline = GesturePipeline::new(&self.config)?;
        let (tx, rx) = mpsc::channel(self.config.decision_queue_size);

        *self.is_running.write().await = true;
        let is_running = self.is_running.clone();
        let interval = Duration::from_millis(self.config.frame_interval_ms);
        let budget_ms = self.config.invoke_budget_ms;
        let mut frame = vec![0u8; frame_len];

        tokio::spawn(async move {
            loop {
                if !*is_running.read().await {
                    break;
                }

                if let Err(e) = source.acquire(&mut frame).await {
                    warn!("image capture failed: {}", e);
                }

                if let Err(e) = backend.fill_input(&frame) {
                    warn!("input tensor fill failed: {}", e);
                }

                let started = Instant::now();
                if let Err(e) = backend.invoke() {
                    warn!("inference invoke failed: {}", e);
                }
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                debug!("inference latency: {:.1} ms", latency_ms);
                if let Some(budget) = budget_ms {
                    if latency_ms > budget as f64 {
                        warn!(
                            "inference overran its {} ms budget ({:.1} ms)",
                            budget, latency_ms
                        );
                    }
                }

                // Classify whatever the output tensor holds now; after a
                // failed capture or invoke that is the previous data,
                // which keeps the vote window aligned with the cadence.
                match backend.raw_scores() {
                    Ok(raw) => {
                        match pipeline.process_raw(&raw, &backend.quantization_params()) {
                            Ok(outcome) => {
                                reporter.log_inference(&outcome.table);
                                if let Some(decision) = outcome.decision {
                                    reporter.report(&decision);
                                    if tx.send(decision).await.is_err() {
                                        break; // Receiver dropped
                                    }
                                }
                            }
                            Err(e) => warn!("classification failed: {}", e),
                        }
                    }
                    Err(e) => warn!("output tensor read failed: {}", e),
                }

                tokio::time::sleep(interval).await;
            }

            if let Err(e) = source.stop().await {
                warn!("source stop failed: {}", e);
            }
        });

        Ok(rx)
    }

    /// Stop the streaming loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FrameFormat, TestPatternSource};
    use crate::report::{ChannelTransport, NullTransport};
    use mudra_engine::ScriptedBackend;

    /// Raw score vector whose argmax lands on `winner`
    fn raw_favoring(winner: usize, count: usize) -> Vec<u8> {
        let mut raw = vec![10u8; count];
        raw[winner] = 200;
        raw
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig::default().with_frame_interval_ms(1)
    }

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.vote_window, 5);
        assert_eq!(config.frame_interval_ms, 2000);
        assert_eq!(config.categories.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(PipelineConfig::default().with_vote_window(0).validate().is_err());

        let mut config = PipelineConfig::default();
        config.arena_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vote_sequence_yields_single_decision() {
        let mut pipeline = GesturePipeline::new(&test_config()).unwrap();
        let params = QuantizationParams::new(0.00390625, 0);

        let mut decisions = Vec::new();
        for winner in [2usize, 2, 2, 4, 4] {
            let outcome = pipeline
                .process_raw(&raw_favoring(winner, 7), &params)
                .unwrap();
            assert_eq!(outcome.classification.index, winner);
            if let Some(decision) = outcome.decision {
                decisions.push(decision);
            }
        }

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].index, 2);
        assert_eq!(decisions[0].label, "2");
        assert_eq!(decisions[0].votes, 3);
        assert_eq!(pipeline.pending_votes(), 0);
        assert_eq!(pipeline.inferences(), 5);
    }

    #[test]
    fn test_classify_frame_one_shot() {
        let runtime = GestureRuntime::new(test_config()).unwrap();
        let mut backend = ScriptedBackend::from_scores(7, vec![raw_favoring(5, 7)]);
        let frame = vec![0u8; backend.input_len()];

        let outcome = runtime.classify_frame(&mut backend, &frame).unwrap();
        assert_eq!(outcome.classification.label, "5");
        assert!(outcome.decision.is_none());
        assert!(runtime.arena().is_allocated());
    }

    #[tokio::test]
    async fn test_streaming_end_to_end() {
        let script: Vec<Vec<u8>> = [2usize, 2, 2, 4, 4]
            .iter()
            .map(|&w| raw_favoring(w, 7))
            .collect();
        let backend = ScriptedBackend::from_scores(7, script)
            .with_input_len(FrameFormat::grayscale_96().byte_len());
        let source = TestPatternSource::new(FrameFormat::grayscale_96());

        let (transport, mut wire_rx) = ChannelTransport::new(4);
        let reporter = DecisionReporter::new(Box::new(transport));

        let runtime = GestureRuntime::new(test_config()).unwrap();
        let mut decisions = runtime
            .start_streaming(backend, source, reporter)
            .await
            .unwrap();

        let decision = decisions.recv().await.expect("one decision");
        assert_eq!(decision.index, 2);
        assert_eq!(decision.label, "2");
        assert_eq!(decision.votes, 3);

        // The wire saw the same decision as a newline-terminated token
        let token = wire_rx.recv().await.unwrap();
        assert_eq!(token, b"2\n");

        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_streaming_survives_transient_failures() {
        // First invoke fails: the loop classifies the stale (zeroed)
        // output tensor, which votes for category 0. The four good
        // inferences still complete the window on schedule.
        let backend = ScriptedBackend::from_scores(7, vec![raw_favoring(2, 7)])
            .with_input_len(FrameFormat::grayscale_96().byte_len())
            .fail_next_invokes(1);
        let source =
            TestPatternSource::new(FrameFormat::grayscale_96()).with_failure_on(0);
        let reporter = DecisionReporter::new(Box::new(NullTransport));

        let runtime = GestureRuntime::new(test_config()).unwrap();
        let mut decisions = runtime
            .start_streaming(backend, source, reporter)
            .await
            .unwrap();

        let decision = decisions.recv().await.expect("one decision");
        assert_eq!(decision.index, 2);
        assert_eq!(decision.votes, 4);

        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_streaming_rejects_geometry_mismatch() {
        let backend = ScriptedBackend::from_scores(7, vec![raw_favoring(0, 7)]).with_input_len(64);
        let source = TestPatternSource::new(FrameFormat::grayscale_96());
        let reporter = DecisionReporter::new(Box::new(NullTransport));

        let runtime = GestureRuntime::new(test_config()).unwrap();
        let result = runtime.start_streaming(backend, source, reporter).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_streaming_rejects_model_mismatch() {
        let backend = ScriptedBackend::uniform(3, 100)
            .with_input_len(FrameFormat::grayscale_96().byte_len());
        let source = TestPatternSource::new(FrameFormat::grayscale_96());
        let reporter = DecisionReporter::new(Box::new(NullTransport));

        let runtime = GestureRuntime::new(test_config()).unwrap();
        let result = runtime.start_streaming(backend, source, reporter).await;
        match result {
            Err(e) => assert!(e.is_fatal()),
            Ok(_) => panic!("mismatched backend must not start"),
        }
    }
}
