//! 下一主题选择：探索、掌握度差距与先修信号合成每个主题的得分，得分最高者胜出

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::adaptive::catalog::TopicGraph;
use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::prerequisite::can_proceed;
use crate::adaptive::types::PrerequisiteCheck;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTopic {
    pub topic: String,
    pub score: f64,
    pub mastery: f64,
    pub attempts: usize,
    pub prerequisites: PrerequisiteCheck,
}

fn mastery_gap_bonus(mastery: f64, config: &AdaptiveConfig) -> f64 {
    let s = &config.selector;
    if mastery < s.low_mastery_threshold {
        s.low_mastery_bonus
    } else if mastery < s.mid_mastery_threshold {
        s.mid_mastery_bonus
    } else {
        s.high_mastery_bonus
    }
}

fn score_topic(
    graph: &TopicGraph,
    topic: &str,
    mastery: &BTreeMap<String, f64>,
    attempts: usize,
    config: &AdaptiveConfig,
) -> ScoredTopic {
    let s = &config.selector;
    let current = mastery.get(topic).copied().unwrap_or(0.0);

    let mut score = 0.0;
    if attempts == 0 {
        score += s.exploration_bonus;
    }
    score += mastery_gap_bonus(current, config);

    let prerequisites = can_proceed(graph, topic, mastery, &config.prerequisite);
    if prerequisites.allowed {
        score += s.prerequisite_met_bonus;
    } else {
        score *= s.prerequisite_unmet_factor;
    }

    ScoredTopic {
        topic: topic.to_string(),
        score,
        mastery: current,
        attempts,
        prerequisites,
    }
}

/// 按目录顺序为每个主题打分
pub fn score_topics(
    graph: &TopicGraph,
    mastery: &BTreeMap<String, f64>,
    attempts_by_topic: &HashMap<String, usize>,
    config: &AdaptiveConfig,
) -> Vec<ScoredTopic> {
    graph
        .topics()
        .map(|topic| {
            let attempts = attempts_by_topic.get(topic).copied().unwrap_or(0);
            score_topic(graph, topic, mastery, attempts, config)
        })
        .collect()
}

/// 得分最高的主题，平分时取目录中靠前者。仅空目录返回 `None`
pub fn select_next_topic(
    graph: &TopicGraph,
    mastery: &BTreeMap<String, f64>,
    attempts_by_topic: &HashMap<String, usize>,
    config: &AdaptiveConfig,
) -> Option<ScoredTopic> {
    score_topics(graph, mastery, attempts_by_topic, config)
        .into_iter()
        .fold(None, |best: Option<ScoredTopic>, candidate| match best {
            Some(current) if candidate.score <= current.score => Some(current),
            _ => Some(candidate),
        })
}
