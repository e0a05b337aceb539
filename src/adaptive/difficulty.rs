use crate::adaptive::config::DifficultyConfig;
use crate::adaptive::types::DifficultyTier;

/// 最近 `recent_window` 次得分的均值，无记录时取中性先验
pub fn recent_performance(recent_scores: &[f64], config: &DifficultyConfig) -> f64 {
    let start = recent_scores.len().saturating_sub(config.recent_window);
    let window = &recent_scores[start..];
    if window.is_empty() {
        return config.neutral_prior;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// 仅依据近期表现选择难度档位，不参考当前掌握度。
/// 在难题上失手的学习者会很快降档。
pub fn select_difficulty(recent_scores: &[f64], config: &DifficultyConfig) -> DifficultyTier {
    let theta = recent_performance(recent_scores, config);
    if theta < config.easy_below {
        DifficultyTier::Easy
    } else if theta < config.medium_below {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Hard
    }
}
