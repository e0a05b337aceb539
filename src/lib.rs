pub mod adaptive;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::adaptive::catalog::TopicGraph;
use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::engine::AssessmentEngine;
use crate::config::Config;
use crate::error::EngineError;
use crate::services::llm_provider::{LlmProvider, ModelOptions};
use crate::store::Store;

/// Builds a ready engine from environment configuration: opens and migrates
/// the store, loads the catalog and wires the HTTP text generator.
pub fn bootstrap(config: &Config) -> Result<AssessmentEngine, EngineError> {
    LlmProvider::validate_config(&config.llm).map_err(EngineError::Config)?;

    let adaptive_config = AdaptiveConfig::from_env(&config.adaptive);
    adaptive_config.validate().map_err(EngineError::Config)?;

    let graph = match &config.catalog_path {
        Some(path) => TopicGraph::from_json_file(path),
        None => TopicGraph::builtin(),
    }
    .map_err(|e| EngineError::Config(e.to_string()))?;

    let store = Store::open(&config.sled_path)?;
    store.run_migrations()?;

    tracing::info!(
        topics = graph.len(),
        sled_path = %config.sled_path,
        llm_enabled = config.llm.enabled,
        llm_mock = config.llm.mock,
        "Assessment engine initialized"
    );

    let provider = LlmProvider::new(&config.llm);
    Ok(AssessmentEngine::new(
        Arc::new(graph),
        adaptive_config,
        Arc::new(provider),
        Arc::new(store),
    )
    .with_model_options(ModelOptions::from_config(&config.llm)))
}
