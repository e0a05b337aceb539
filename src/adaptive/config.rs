use serde::{Deserialize, Serialize};

use crate::constants::{
    CORRECT_THRESHOLD, DEFAULT_GENERATION_TIMEOUT_MS, DEFAULT_RECENT_WINDOW, NEUTRAL_PRIOR,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteConfig {
    /// 最轻先修边也要求的基础阈值
    pub base_floor: f64,
    /// 按边权重叠加在 `base_floor` 之上的部分
    pub scale_factor: f64,
}

impl Default for PrerequisiteConfig {
    fn default() -> Self {
        Self {
            base_floor: 0.3,
            scale_factor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub recent_window: usize,
    pub neutral_prior: f64,
    pub easy_below: f64,
    pub medium_below: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            recent_window: DEFAULT_RECENT_WINDOW,
            neutral_prior: NEUTRAL_PRIOR,
            easy_below: 0.3,
            medium_below: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    pub exploration_bonus: f64,
    pub low_mastery_threshold: f64,
    pub mid_mastery_threshold: f64,
    pub low_mastery_bonus: f64,
    pub mid_mastery_bonus: f64,
    pub high_mastery_bonus: f64,
    pub prerequisite_met_bonus: f64,
    /// 先修未满足时乘到累计得分上的系数
    pub prerequisite_unmet_factor: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            exploration_bonus: 0.4,
            low_mastery_threshold: 0.3,
            mid_mastery_threshold: 0.6,
            low_mastery_bonus: 0.3,
            mid_mastery_bonus: 0.2,
            high_mastery_bonus: 0.1,
            prerequisite_met_bonus: 0.3,
            prerequisite_unmet_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryUpdateConfig {
    pub correct_threshold: f64,
    pub rate_low_threshold: f64,
    pub rate_mid_threshold: f64,
    pub rate_low: f64,
    pub rate_mid: f64,
    pub rate_high: f64,
    pub excellent_score: f64,
    pub excellent_increment: f64,
    pub good_score: f64,
    pub good_increment: f64,
    pub fair_score: f64,
    pub fair_increment: f64,
    pub partial_score: f64,
    pub partial_increment: f64,
    pub failure_increment: f64,
    pub easy_multiplier: f64,
    pub medium_multiplier: f64,
    pub hard_multiplier: f64,
}

impl Default for MasteryUpdateConfig {
    fn default() -> Self {
        Self {
            correct_threshold: CORRECT_THRESHOLD,
            rate_low_threshold: 0.3,
            rate_mid_threshold: 0.6,
            rate_low: 0.8,
            rate_mid: 0.6,
            rate_high: 0.4,
            excellent_score: 0.9,
            excellent_increment: 0.15,
            good_score: 0.7,
            good_increment: 0.10,
            fair_score: 0.5,
            fair_increment: 0.05,
            partial_score: 0.3,
            partial_increment: 0.0,
            failure_increment: -0.08,
            easy_multiplier: 0.7,
            medium_multiplier: 1.0,
            hard_multiplier: 1.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTuning {
    pub generation_timeout_ms: u64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            generation_timeout_ms: DEFAULT_GENERATION_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    #[serde(default)]
    pub prerequisite: PrerequisiteConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub mastery: MasteryUpdateConfig,
    #[serde(default)]
    pub engine: EngineTuning,
}

impl AdaptiveConfig {
    pub fn from_env(env_config: &crate::config::AdaptiveEnvConfig) -> Self {
        let mut config = Self::default();
        config.difficulty.recent_window = env_config.recent_window;
        config.mastery.correct_threshold = env_config.correct_threshold;
        config.engine.generation_timeout_ms = env_config.generation_timeout_ms;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        // 先修配置
        let p = &self.prerequisite;
        if !(0.0..=1.0).contains(&p.base_floor) {
            return Err("prerequisite.base_floor must be in [0,1]".to_string());
        }
        if p.scale_factor < 0.0 || p.base_floor + p.scale_factor > 1.0 {
            return Err(
                "prerequisite.scale_factor must be >= 0 and base_floor + scale_factor <= 1"
                    .to_string(),
            );
        }

        // 难度配置
        let d = &self.difficulty;
        if d.recent_window == 0 {
            return Err("difficulty.recent_window must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&d.neutral_prior) {
            return Err("difficulty.neutral_prior must be in [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&d.easy_below)
            || !(0.0..=1.0).contains(&d.medium_below)
            || d.easy_below > d.medium_below
        {
            return Err("difficulty thresholds must satisfy 0 <= easy_below <= medium_below <= 1"
                .to_string());
        }

        // 选题配置
        let s = &self.selector;
        if s.low_mastery_threshold > s.mid_mastery_threshold {
            return Err(
                "selector.low_mastery_threshold must be <= mid_mastery_threshold".to_string(),
            );
        }
        if s.exploration_bonus < 0.0
            || s.low_mastery_bonus < 0.0
            || s.mid_mastery_bonus < 0.0
            || s.high_mastery_bonus <= 0.0
            || s.prerequisite_met_bonus < 0.0
        {
            return Err("selector bonuses must be >= 0 (high_mastery_bonus > 0)".to_string());
        }
        if !(0.0..=1.0).contains(&s.prerequisite_unmet_factor) {
            return Err("selector.prerequisite_unmet_factor must be in [0,1]".to_string());
        }

        // 掌握度更新配置
        let m = &self.mastery;
        if !(0.0..=1.0).contains(&m.correct_threshold) {
            return Err("mastery.correct_threshold must be in [0,1]".to_string());
        }
        if m.rate_low_threshold > m.rate_mid_threshold {
            return Err("mastery.rate_low_threshold must be <= rate_mid_threshold".to_string());
        }
        for (name, rate) in [
            ("rate_low", m.rate_low),
            ("rate_mid", m.rate_mid),
            ("rate_high", m.rate_high),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("mastery.{name} must be in [0,1]"));
            }
        }
        if !(m.excellent_score >= m.good_score
            && m.good_score >= m.fair_score
            && m.fair_score >= m.partial_score)
        {
            return Err("mastery score bands must be descending".to_string());
        }
        if m.failure_increment > 0.0 {
            return Err("mastery.failure_increment must be <= 0".to_string());
        }
        if m.easy_multiplier <= 0.0 || m.medium_multiplier <= 0.0 || m.hard_multiplier <= 0.0 {
            return Err("mastery difficulty multipliers must be > 0".to_string());
        }

        // 引擎参数
        if self.engine.generation_timeout_ms == 0 {
            return Err("engine.generation_timeout_ms must be > 0".to_string());
        }

        Ok(())
    }
}
