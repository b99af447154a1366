//! Application state.

use std::sync::Arc;

use champ_media::InferencePipeline;
use champ_models::{InferenceResult, LatestResult};
use tokio::sync::RwLock;

use crate::auth::{OtpStore, TokenIssuer};
use crate::config::ApiConfig;

/// The most recent inference result. Uploads write it, result reads share it.
#[derive(Clone, Default)]
pub struct LatestResultSlot {
    inner: Arc<RwLock<Option<Arc<InferenceResult>>>>,
}

impl LatestResultSlot {
    pub async fn store(&self, result: Arc<InferenceResult>) {
        *self.inner.write().await = Some(result);
    }

    pub async fn get(&self) -> Option<Arc<InferenceResult>> {
        self.inner.read().await.clone()
    }

    /// Response body for `GET /results/latest`.
    pub async fn snapshot(&self) -> LatestResult {
        match self.get().await {
            Some(result) => LatestResult::Available(result.as_ref().clone()),
            None => LatestResult::empty(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<InferencePipeline>,
    pub latest: LatestResultSlot,
    pub otp: Arc<OtpStore>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Arc<InferencePipeline>) -> Self {
        let otp = OtpStore::new(config.otp_ttl, config.otp_max_attempts);
        let tokens = TokenIssuer::new(&config.jwt_secret, config.access_token_ttl);
        Self {
            config,
            pipeline,
            latest: LatestResultSlot::default(),
            otp: Arc::new(otp),
            tokens: Arc::new(tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slot_starts_empty_then_keeps_last_write() {
        let slot = LatestResultSlot::default();
        assert!(matches!(slot.snapshot().await, LatestResult::Empty { .. }));

        slot.store(Arc::new(InferenceResult::no_data())).await;
        let mut scored = InferenceResult::no_data();
        scored.score = 72.5;
        slot.store(Arc::new(scored)).await;

        assert_eq!(slot.get().await.map(|r| r.score), Some(72.5));
    }
}
