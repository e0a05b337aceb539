use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use adaptive_mastery::adaptive::catalog::TopicGraph;
use adaptive_mastery::adaptive::config::{AdaptiveConfig, DifficultyConfig, MasteryUpdateConfig};
use adaptive_mastery::adaptive::difficulty::select_difficulty;
use adaptive_mastery::adaptive::mastery::{learning_velocity, update_mastery, update_streak};
use adaptive_mastery::adaptive::scoring::extract_score;
use adaptive_mastery::adaptive::topic_selector::select_next_topic;
use adaptive_mastery::adaptive::types::DifficultyTier;

fn tier() -> impl Strategy<Value = DifficultyTier> {
    prop_oneof![
        Just(DifficultyTier::Easy),
        Just(DifficultyTier::Medium),
        Just(DifficultyTier::Hard),
    ]
}

proptest! {
    #[test]
    fn pt_mastery_stays_in_unit_interval(
        previous in 0.0_f64..=1.0,
        score in 0.0_f64..=1.0,
        difficulty in tier(),
    ) {
        let cfg = MasteryUpdateConfig::default();
        let next = update_mastery(previous, score, difficulty, &cfg);
        prop_assert!((0.0..=1.0).contains(&next));
    }

    #[test]
    fn pt_mastery_only_drops_on_failure(
        previous in 0.0_f64..=1.0,
        score in 0.0_f64..=1.0,
        difficulty in tier(),
    ) {
        let cfg = MasteryUpdateConfig::default();
        let next = update_mastery(previous, score, difficulty, &cfg);
        if score >= cfg.partial_score {
            prop_assert!(next >= previous);
        } else {
            prop_assert!(next <= previous);
        }
    }

    #[test]
    fn pt_streak_is_never_negative(
        previous in 0_i32..1000,
        score in 0.0_f64..=1.0,
    ) {
        let cfg = MasteryUpdateConfig::default();
        let next = update_streak(previous, score, &cfg);
        prop_assert!(next >= 0);
        prop_assert!(next == 0 || next == previous + 1);
    }

    #[test]
    fn pt_velocity_is_non_negative(offsets in proptest::collection::vec(0_i64..10_000_000, 0..20)) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = offsets
            .iter()
            .map(|ms| base + Duration::milliseconds(*ms))
            .collect();
        let velocity = learning_velocity(&timestamps);
        prop_assert!(velocity >= 0.0);
        prop_assert!(velocity.is_finite());
    }

    #[test]
    fn pt_every_recent_window_maps_to_a_tier(scores in proptest::collection::vec(0.0_f64..=1.0, 0..12)) {
        let cfg = DifficultyConfig::default();
        let tier = select_difficulty(&scores, &cfg);
        if scores.is_empty() {
            prop_assert_eq!(tier, DifficultyTier::Medium);
        }
        let all_high = !scores.is_empty() && scores.iter().all(|s| *s >= cfg.medium_below);
        if all_high {
            prop_assert_eq!(tier, DifficultyTier::Hard);
        }
    }

    #[test]
    fn pt_selection_is_deterministic_and_from_catalog(
        masteries in proptest::collection::vec(0.0_f64..=1.0, 14),
        attempts in proptest::collection::vec(0_usize..5, 14),
    ) {
        let graph = TopicGraph::builtin().unwrap();
        let config = AdaptiveConfig::default();
        let topics: Vec<String> = graph.topics().map(str::to_string).collect();
        let mastery: BTreeMap<String, f64> =
            topics.iter().cloned().zip(masteries.iter().copied()).collect();
        let counts: HashMap<String, usize> =
            topics.iter().cloned().zip(attempts.iter().copied()).collect();

        let first = select_next_topic(&graph, &mastery, &counts, &config).unwrap();
        let second = select_next_topic(&graph, &mastery, &counts, &config).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(graph.contains(&first.topic));
    }

    #[test]
    fn pt_extracted_score_is_in_range(text in ".{0,80}") {
        let score = extract_score(&text);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn pt_fraction_scores_are_normalized(a in 0_u32..=10, b in 1_u32..=10) {
        let score = extract_score(&format!("Score: {a}/{b}"));
        let expected = (a as f64 / b as f64).min(1.0);
        prop_assert!((score - expected).abs() < 1e-9);
    }
}
