//! Video-to-score orchestration.
//!
//! ```text
//! bytes -> SequenceBuilder -> TemporalNormalizer -> { Analyzer, Predictor, Detector } -> fusion
//! ```
//!
//! [`InferencePipeline::process_video`] never fails: a missing decoder yields
//! the "No Analysis Available" stub, an empty or unreadable video yields the
//! "No Data" result, and every later stage has its own default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use champ_models::InferenceResult;
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzer::{BiomechanicalAnalyzer, GaussianPlaceholder, TechniqueSampler};
use crate::anomaly::AnomalyDetector;
use crate::config::PipelineConfig;
use crate::decode::{default_decoder, VideoDecoder};
use crate::fusion::fuse_scores;
use crate::landmark_model::OrtPoseLandmarker;
use crate::landmarks::{LandmarkExtractor, NullLandmarkExtractor};
use crate::models::TensorModel;
use crate::normalize::{NormalizationStats, TemporalNormalizer};
use crate::predictor::PerformancePredictor;
use crate::sequence::{DecodedSequence, SequenceBuilder, SequenceOutcome, DEFAULT_BATCH_SIZE};
use crate::tensor::DEFAULT_TARGET_LEN;

/// What this process can actually do; reported by readiness checks.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineCapabilities {
    pub decoder: Option<&'static str>,
    pub landmark_extractor: &'static str,
    pub normalization_stats: bool,
    pub performance_model: bool,
    pub anomaly_model: bool,
    pub target_len: usize,
}

/// Shared, read-only scoring pipeline. Build once at startup.
pub struct InferencePipeline {
    sequence: Option<SequenceBuilder>,
    extractor_name: &'static str,
    normalizer: TemporalNormalizer,
    analyzer: BiomechanicalAnalyzer,
    predictor: PerformancePredictor,
    detector: AnomalyDetector,
}

impl InferencePipeline {
    pub fn builder() -> InferencePipelineBuilder {
        InferencePipelineBuilder::default()
    }

    /// Load every configured artifact. Artifacts that fail to load are
    /// logged and left out.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let extractor: Arc<dyn LandmarkExtractor> = match config.landmark_model.as_deref() {
            Some(path) => match OrtPoseLandmarker::load(path, config.presence_activation) {
                Ok(landmarker) => Arc::new(landmarker),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Landmark model unavailable");
                    Arc::new(NullLandmarkExtractor)
                }
            },
            None => Arc::new(NullLandmarkExtractor),
        };

        let stats = config.normalization_stats.as_deref().and_then(|path| {
            match NormalizationStats::load(path) {
                Ok(stats) => stats,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring normalization statistics");
                    None
                }
            }
        });

        let sampler: Arc<dyn TechniqueSampler> = match config.technique_seed {
            Some(seed) => Arc::new(GaussianPlaceholder::seeded(seed)),
            None => Arc::new(GaussianPlaceholder::from_entropy()),
        };

        let pipeline = Self::builder()
            .landmark_extractor(extractor)
            .normalizer(TemporalNormalizer::new(config.target_len, stats))
            .technique_sampler(sampler)
            .predictor(PerformancePredictor::from_artifacts(&config.performance_models))
            .detector(AnomalyDetector::from_artifacts(&config.anomaly_models))
            .batch_size(config.batch_size)
            .decode_budget(config.decode_budget)
            .build();
        info!(capabilities = ?pipeline.capabilities(), "Inference pipeline ready");
        pipeline
    }

    pub fn capabilities(&self) -> PipelineCapabilities {
        PipelineCapabilities {
            decoder: self.sequence.as_ref().map(|s| s.decoder_name()),
            landmark_extractor: self.extractor_name,
            normalization_stats: self.normalizer.has_stats(),
            performance_model: self.predictor.is_configured(),
            anomaly_model: self.detector.is_configured(),
            target_len: self.normalizer.target_len(),
        }
    }

    /// Score an uploaded video. Blocking; run it off the async executor.
    pub fn process_video(&self, video: &[u8]) -> InferenceResult {
        let started_at = Instant::now();

        let Some(sequence) = &self.sequence else {
            warn!("No video decoder available, returning stub result");
            crate::metrics::record_video_processed("unavailable");
            return InferenceResult::unavailable();
        };

        let decoded = match sequence.build(video) {
            Ok(SequenceOutcome::Decoded(decoded)) => decoded,
            Ok(SequenceOutcome::NoData) => {
                crate::metrics::record_video_processed("no_data");
                return InferenceResult::no_data();
            }
            Err(e) => {
                warn!(error = %e, "Could not stage video for decoding");
                crate::metrics::record_fallback("sequence");
                crate::metrics::record_video_processed("no_data");
                return InferenceResult::no_data();
            }
        };

        let result = self.score_sequence(&decoded);
        crate::metrics::record_video_processed("scored");
        crate::metrics::record_stage_duration("total", started_at.elapsed());
        info!(
            score = result.score,
            cheat_detected = result.cheat_detected,
            rating = %result.analysis.overall_rating,
            frames = result.video_info.frame_count,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Video scored"
        );
        result
    }

    /// Everything after decoding: normalize, analyze, predict, detect, fuse.
    pub fn score_sequence(&self, decoded: &DecodedSequence) -> InferenceResult {
        let started_at = Instant::now();
        let normalized = self.normalizer.normalize(&decoded.tensor);

        let analysis = self.analyzer.analyze(&normalized);
        let prediction = self.predictor.predict(&normalized);
        let cheat_detected = self.detector.detect(&normalized);
        if cheat_detected == 1 {
            crate::metrics::record_cheat_detected();
        }
        crate::metrics::record_stage_duration("score", started_at.elapsed());

        InferenceResult {
            score: fuse_scores(prediction, &analysis, cheat_detected),
            cheat_detected,
            analysis,
            video_info: decoded.video_info(),
        }
    }
}

/// Assembles an [`InferencePipeline`]. Unset parts take their documented
/// defaults: the compiled-in decoder, the null landmark extractor, a
/// 120-frame normalizer without statistics and no models.
pub struct InferencePipelineBuilder {
    decoder: Option<Arc<dyn VideoDecoder>>,
    extractor: Arc<dyn LandmarkExtractor>,
    normalizer: TemporalNormalizer,
    sampler: Option<Arc<dyn TechniqueSampler>>,
    predictor: PerformancePredictor,
    detector: AnomalyDetector,
    batch_size: usize,
    decode_budget: Option<Duration>,
}

impl Default for InferencePipelineBuilder {
    fn default() -> Self {
        Self {
            decoder: default_decoder(),
            extractor: Arc::new(NullLandmarkExtractor),
            normalizer: TemporalNormalizer::new(DEFAULT_TARGET_LEN, None),
            sampler: None,
            predictor: PerformancePredictor::default(),
            detector: AnomalyDetector::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            decode_budget: None,
        }
    }
}

impl InferencePipelineBuilder {
    pub fn decoder(mut self, decoder: Arc<dyn VideoDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Run in stub mode regardless of build features.
    pub fn without_decoder(mut self) -> Self {
        self.decoder = None;
        self
    }

    pub fn landmark_extractor(mut self, extractor: Arc<dyn LandmarkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn normalizer(mut self, normalizer: TemporalNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn technique_sampler(mut self, sampler: Arc<dyn TechniqueSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn predictor(mut self, predictor: PerformancePredictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn performance_model(mut self, model: Box<dyn TensorModel>) -> Self {
        self.predictor = PerformancePredictor::new(Some(model));
        self
    }

    pub fn anomaly_model(mut self, model: Box<dyn TensorModel>) -> Self {
        self.detector = AnomalyDetector::new(Some(model));
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn decode_budget(mut self, budget: Option<Duration>) -> Self {
        self.decode_budget = budget;
        self
    }

    pub fn build(self) -> InferencePipeline {
        let extractor_name = self.extractor.name();
        let sequence = self.decoder.map(|decoder| {
            SequenceBuilder::new(decoder, self.extractor)
                .with_batch_size(self.batch_size)
                .with_decode_budget(self.decode_budget)
        });
        let analyzer = match self.sampler {
            Some(sampler) => BiomechanicalAnalyzer::new(sampler),
            None => BiomechanicalAnalyzer::default(),
        };

        InferencePipeline {
            sequence,
            extractor_name,
            normalizer: self.normalizer,
            analyzer,
            predictor: self.predictor,
            detector: self.detector,
        }
    }
}
