use std::collections::BTreeMap;

use crate::adaptive::catalog::TopicGraph;
use crate::adaptive::config::PrerequisiteConfig;
use crate::adaptive::types::PrerequisiteCheck;

/// 先修主题需达到的掌握度，达到后依赖主题才算解锁
pub fn required_threshold(weight: f64, config: &PrerequisiteConfig) -> f64 {
    config.base_floor + weight * config.scale_factor
}

/// 建议性检查：未满足先修只降低主题优先级，不隐藏主题。
/// `mastery` 中缺失的主题按 0.0 处理
pub fn can_proceed(
    graph: &TopicGraph,
    topic: &str,
    mastery: &BTreeMap<String, f64>,
    config: &PrerequisiteConfig,
) -> PrerequisiteCheck {
    let missing: Vec<String> = graph
        .prerequisites_of(topic)
        .iter()
        .filter(|p| {
            let current = mastery.get(&p.topic).copied().unwrap_or(0.0);
            current < required_threshold(p.weight, config)
        })
        .map(|p| p.topic.clone())
        .collect();

    PrerequisiteCheck {
        allowed: missing.is_empty(),
        missing,
    }
}
