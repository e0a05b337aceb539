//! 从评估者的自由文本反馈中提取分数。
//!
//! 按固定顺序尝试各模式，然后是关键词启发式，最后是默认值。顺序属于评分约定，不可更改。
//!
//! 带标签的分数（`score: a/b`、`score: x`）总是优先于正文中未标注的分数。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::DEFAULT_SCORE;
use crate::error::EngineError;

const NUM: &str = r"(\d+(?:\.\d+)?)";

static LABELLED_FRACTION: Lazy<Regex> = Lazy::new(|| {
    build(&format!(
        r"(?i)\b(?:score|rating|grade)\b[^0-9\n]{{0,20}}?{NUM}\s*(?:/|out\s+of)\s*{NUM}"
    ))
});
static OUT_OF: Lazy<Regex> = Lazy::new(|| build(&format!(r"(?i){NUM}\s*out\s+of\s+{NUM}")));
static FRACTION: Lazy<Regex> = Lazy::new(|| build(&format!(r"{NUM}\s*/\s*{NUM}")));
static PERCENT: Lazy<Regex> = Lazy::new(|| build(&format!(r"{NUM}\s*%")));
static LABELLED_VALUE: Lazy<Regex> = Lazy::new(|| {
    build(&format!(
        r"(?i)\b(?:score|rating|grade)\b\s*(?:is|of)?\s*[:=]?\s*{NUM}\s*(%)?"
    ))
});

static KEYWORDS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    [
        (r"(?i)\bexcellent\b", 0.95),
        (r"(?i)\bgood\b", 0.8),
        (r"(?i)\bsatisfactory\b", 0.6),
        (r"(?i)\bneeds\s+improvement\b", 0.4),
        (r"(?i)\b(?:incorrect|wrong)\b", 0.2),
    ]
    .into_iter()
    .map(|(pattern, score)| (build(pattern), score))
    .collect()
});

// 模式均为编译期常量，构造失败属于编程错误，由下方单元测试覆盖
fn build(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid score pattern {pattern}: {e}"),
    }
}

fn ratio(caps: &regex::Captures<'_>) -> Option<f64> {
    let numerator: f64 = caps.get(1)?.as_str().parse().ok()?;
    let denominator: f64 = caps.get(2)?.as_str().parse().ok()?;
    if denominator <= 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

fn single(caps: &regex::Captures<'_>) -> Option<f64> {
    caps.get(1)?.as_str().parse().ok()
}

/// 裸数值按小数、10 分制或 100 分制解读
fn normalize_bare(value: f64) -> f64 {
    if value <= 1.0 {
        value
    } else if value <= 10.0 {
        value / 10.0
    } else {
        value / 100.0
    }
}

fn numeric_score(text: &str) -> Option<f64> {
    if let Some(v) = LABELLED_FRACTION.captures(text).and_then(|c| ratio(&c)) {
        return Some(v);
    }
    if let Some(caps) = LABELLED_VALUE.captures(text) {
        if let Some(v) = single(&caps) {
            return Some(if caps.get(2).is_some() {
                v / 100.0
            } else {
                normalize_bare(v)
            });
        }
    }
    if let Some(v) = OUT_OF.captures(text).and_then(|c| ratio(&c)) {
        return Some(v);
    }
    if let Some(v) = FRACTION.captures(text).and_then(|c| ratio(&c)) {
        return Some(v);
    }
    PERCENT
        .captures(text)
        .and_then(|c| single(&c))
        .map(|v| v / 100.0)
}

fn keyword_score(text: &str) -> Option<f64> {
    KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, score)| *score)
}

/// 返回 [0,1] 内的分数；模式和关键词均未命中时返回 `MalformedScore`
pub fn try_extract_score(text: &str) -> Result<f64, EngineError> {
    numeric_score(text)
        .filter(|v| v.is_finite())
        .or_else(|| keyword_score(text))
        .map(|v| v.clamp(0.0, 1.0))
        .ok_or(EngineError::MalformedScore)
}

/// 同 [`try_extract_score`]，但不会失败：无法解析的反馈记 0.5 分
pub fn extract_score(text: &str) -> f64 {
    match try_extract_score(text) {
        Ok(score) => score,
        Err(_) => {
            tracing::warn!(
                feedback_len = text.len(),
                default = DEFAULT_SCORE,
                "No score found in feedback, using default"
            );
            DEFAULT_SCORE
        }
    }
}
