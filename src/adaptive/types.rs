use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeState {
    pub topic: String,
    pub mastery: f64,
    /// 连续达到正确阈值的作答次数
    pub streak: i32,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl KnowledgeState {
    pub fn new(topic: &str, mastery: f64) -> Self {
        Self {
            topic: topic.to_string(),
            mastery,
            streak: 0,
            last_practiced: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub topic: String,
    pub question: String,
    pub answer: String,
    pub score: f64,
    pub difficulty: DifficultyTier,
    pub timestamp: DateTime<Utc>,
    pub time_spent_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteCheck {
    pub allowed: bool,
    pub missing: Vec<String>,
}

/// 对会话应用一次作答的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub topic: String,
    pub previous_mastery: f64,
    pub new_mastery: f64,
    pub streak: i32,
    pub velocity: f64,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub knowledge_state: BTreeMap<String, KnowledgeState>,
    pub streaks: BTreeMap<String, i32>,
    pub velocity: BTreeMap<String, f64>,
    pub total_attempts: usize,
    pub correct_attempts: usize,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticePlan {
    pub topic: String,
    pub difficulty: DifficultyTier,
    pub mastery: f64,
    pub topic_score: f64,
    pub prerequisites: PrerequisiteCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub session_id: String,
    pub topic: String,
    pub difficulty: DifficultyTier,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub topic: String,
    pub question: String,
    pub answer: String,
    pub difficulty: DifficultyTier,
    #[serde(default)]
    pub time_spent_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub session_id: String,
    pub topic: String,
    pub score: f64,
    pub feedback: String,
    pub outcome: AttemptOutcome,
    /// 该主题下一题将使用的难度档位
    pub next_difficulty: DifficultyTier,
}
