use crate::cli::DatasetArgs;
use metrics_exporter_prometheus::PrometheusHandle;
use movie_expert::config::{AppConfig, DatasetConfig};
use movie_expert::dataset;
use movie_expert::engine::Recommender;
use movie_expert::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The loaded recommender, or the reason it could not be loaded.
#[derive(Clone)]
pub(crate) enum EngineState {
    Ready(Arc<Recommender>),
    Unavailable(Arc<str>),
}

impl EngineState {
    /// Load failures are logged and kept so handlers can report them per request.
    pub(crate) fn load(config: &DatasetConfig) -> Self {
        match load_recommender(config) {
            Ok(recommender) => Self::Ready(Arc::new(recommender)),
            Err(err) => {
                warn!(
                    error = %err,
                    data_dir = %config.data_dir.display(),
                    "dataset unavailable; recommendation endpoints will report errors"
                );
                Self::Unavailable(Arc::from(err.to_string()))
            }
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub(crate) fn recommender(&self) -> Result<&Recommender, AppError> {
        match self {
            Self::Ready(recommender) => Ok(recommender.as_ref()),
            Self::Unavailable(reason) => Err(AppError::Unavailable(reason.to_string())),
        }
    }
}

/// Environment configuration with the command line's dataset overrides applied.
pub(crate) fn load_config(overrides: &DatasetArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = &overrides.data_dir {
        config.dataset.data_dir = dir.clone();
    }
    if let Some(kind) = overrides.dataset {
        config.dataset.kind = Some(kind);
    }
    Ok(config)
}

pub(crate) fn load_recommender(config: &DatasetConfig) -> Result<Recommender, AppError> {
    let dataset = dataset::load(&config.data_dir, config.kind)?;
    Ok(Recommender::new(dataset)?)
}
