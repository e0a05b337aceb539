use std::sync::Arc;

use tempfile::TempDir;

use adaptive_mastery::adaptive::catalog::TopicGraph;
use adaptive_mastery::adaptive::config::AdaptiveConfig;
use adaptive_mastery::adaptive::engine::AssessmentEngine;
use adaptive_mastery::services::llm_provider::TextGenerator;
use adaptive_mastery::store::Store;

pub struct TestEngine {
    pub engine: AssessmentEngine,
    pub store: Arc<Store>,
    _temp_dir: TempDir,
}

pub fn temp_store() -> (Arc<Store>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("assessment-test.sled");
    let store = Store::open(sled_path.to_str().expect("utf8 path")).expect("open store");
    store.run_migrations().expect("migrations");
    (Arc::new(store), temp_dir)
}

pub fn spawn_engine_with(
    graph: TopicGraph,
    config: AdaptiveConfig,
    generator: Arc<dyn TextGenerator>,
) -> TestEngine {
    let (store, temp_dir) = temp_store();
    let engine = AssessmentEngine::new(Arc::new(graph), config, generator, store.clone());
    TestEngine {
        engine,
        store,
        _temp_dir: temp_dir,
    }
}

pub fn spawn_engine(generator: Arc<dyn TextGenerator>) -> TestEngine {
    spawn_engine_with(
        TopicGraph::builtin().expect("builtin catalog"),
        AdaptiveConfig::default(),
        generator,
    )
}

impl TestEngine {
    /// Shares the engine across tasks; the returned `TempDir` must outlive them.
    pub fn into_shared(self) -> (Arc<AssessmentEngine>, Arc<Store>, TempDir) {
        (Arc::new(self.engine), self.store, self._temp_dir)
    }
}
