use chrono::{DateTime, Utc};

use crate::adaptive::config::MasteryUpdateConfig;
use crate::adaptive::types::DifficultyTier;
use crate::constants::MILLIS_PER_HOUR;

/// 掌握度越高收益越小，避免估计值在 1.0 附近振荡
pub fn learning_rate(previous_mastery: f64, config: &MasteryUpdateConfig) -> f64 {
    if previous_mastery < config.rate_low_threshold {
        config.rate_low
    } else if previous_mastery < config.rate_mid_threshold {
        config.rate_mid
    } else {
        config.rate_high
    }
}

/// 中间分段不改变掌握度，只有明确失败才扣减
pub fn base_increment(score: f64, config: &MasteryUpdateConfig) -> f64 {
    if score >= config.excellent_score {
        config.excellent_increment
    } else if score >= config.good_score {
        config.good_increment
    } else if score >= config.fair_score {
        config.fair_increment
    } else if score >= config.partial_score {
        config.partial_increment
    } else {
        config.failure_increment
    }
}

pub fn difficulty_multiplier(difficulty: DifficultyTier, config: &MasteryUpdateConfig) -> f64 {
    match difficulty {
        DifficultyTier::Easy => config.easy_multiplier,
        DifficultyTier::Medium => config.medium_multiplier,
        DifficultyTier::Hard => config.hard_multiplier,
    }
}

pub fn update_mastery(
    previous_mastery: f64,
    score: f64,
    difficulty: DifficultyTier,
    config: &MasteryUpdateConfig,
) -> f64 {
    let increment = base_increment(score, config)
        * learning_rate(previous_mastery, config)
        * difficulty_multiplier(difficulty, config);
    (previous_mastery + increment).clamp(0.0, 1.0)
}

pub fn is_correct(score: f64, config: &MasteryUpdateConfig) -> bool {
    score >= config.correct_threshold
}

/// 答对则连对数加一，否则清零
pub fn update_streak(previous_streak: i32, score: f64, config: &MasteryUpdateConfig) -> i32 {
    if is_correct(score, config) {
        previous_streak.saturating_add(1)
    } else {
        0
    }
}

/// 主题首末两次作答之间每小时的作答次数。
/// 少于两次作答或时间差为零时返回 0.0
pub fn learning_velocity(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }
    let (Some(first), Some(last)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return 0.0;
    };
    let elapsed_ms = (*last - *first).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0.0;
    }
    let hours = elapsed_ms as f64 / MILLIS_PER_HOUR as f64;
    timestamps.len() as f64 / hours
}
