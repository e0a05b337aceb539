mod common;

use std::sync::Arc;

use adaptive_mastery::adaptive::catalog::TopicGraph;
use adaptive_mastery::adaptive::config::AdaptiveConfig;
use adaptive_mastery::adaptive::engine::AssessmentEngine;
use adaptive_mastery::adaptive::types::DifficultyTier;
use adaptive_mastery::store::migrate;
use adaptive_mastery::store::Store;

use common::fixtures::submission;
use common::generators::ScriptedGenerator;

fn open_engine(path: &str) -> AssessmentEngine {
    let store = Store::open(path).expect("open store");
    store.run_migrations().expect("migrations");
    AssessmentEngine::new(
        Arc::new(TopicGraph::builtin().expect("builtin catalog")),
        AdaptiveConfig::default(),
        Arc::new(ScriptedGenerator::always("Score: 9/10")),
        Arc::new(store),
    )
}

#[tokio::test]
async fn session_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.sled");
    let path = path.to_str().unwrap();

    let (session_id, mastery) = {
        let engine = open_engine(path);
        let session = engine.start_session("alice").await.unwrap();
        engine
            .submit_answer("alice", &session.id, submission("Arrays", DifficultyTier::Easy))
            .await
            .unwrap();
        let eval = engine
            .submit_answer("alice", &session.id, submission("Arrays", DifficultyTier::Medium))
            .await
            .unwrap();
        (session.id, eval.outcome.new_mastery)
    };

    let engine = open_engine(path);
    let resumed = engine.start_session("alice").await.unwrap();
    assert_eq!(resumed.id, session_id);
    assert_eq!(resumed.attempts().len(), 2);
    assert_eq!(resumed.streak("Arrays"), 2);
    assert!((resumed.current_mastery("Arrays") - mastery).abs() < 1e-9);
    assert!(resumed.velocity("Arrays") >= 0.0);

    let history = resumed.history("Arrays");
    assert_eq!(history[0].difficulty, DifficultyTier::Easy);
    assert_eq!(history[1].difficulty, DifficultyTier::Medium);
}

#[test]
fn migrations_reach_latest_version_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("m.sled").to_str().unwrap()).unwrap();

    assert_eq!(migrate::get_current_version(&store).unwrap(), 0);
    store.run_migrations().unwrap();
    store.run_migrations().unwrap();
    assert_eq!(
        migrate::get_current_version(&store).unwrap(),
        migrate::latest_version()
    );
}
