//! 单次测评中学习者的进度
//!
//! `SessionState` 持有知识映射、只追加的作答日志，以及按主题的连对数与学习速度。
//! 各映射缺失时均有明确默认值：掌握度取创建时记录的目录默认值，连对数为 0，速度为 0.0。
//! 会话离开 `Active` 后只读。

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::adaptive::catalog::TopicGraph;
use crate::adaptive::config::MasteryUpdateConfig;
use crate::adaptive::mastery::{is_correct, learning_velocity, update_mastery, update_streak};
use crate::adaptive::types::{
    AttemptOutcome, AttemptRecord, KnowledgeState, SessionSnapshot, SessionStatus,
};
use crate::constants::DEFAULT_SCORE;
use crate::error::EngineError;
use crate::store::operations::assessment_sessions::AssessmentSession;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub id: String,
    pub user_id: String,
    status: SessionStatus,
    default_mastery: BTreeMap<String, f64>,
    knowledge: BTreeMap<String, KnowledgeState>,
    attempts: Vec<AttemptRecord>,
    streaks: BTreeMap<String, i32>,
    velocity: BTreeMap<String, f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(id: &str, user_id: &str, graph: &TopicGraph) -> Self {
        let default_mastery = graph.defaults();
        let now = Utc::now();
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: SessionStatus::Active,
            default_mastery,
            knowledge: BTreeMap::new(),
            attempts: Vec::new(),
            streaks: BTreeMap::new(),
            velocity: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// 由持久化的各部分重建会话，作答须已按记录顺序排列
    pub fn from_parts(
        record: AssessmentSession,
        knowledge: Vec<KnowledgeState>,
        attempts: Vec<AttemptRecord>,
    ) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            status: record.status,
            default_mastery: record.default_mastery,
            knowledge: knowledge
                .into_iter()
                .map(|k| (k.topic.clone(), k))
                .collect(),
            attempts,
            streaks: record.streaks,
            velocity: record.velocity,
            created_at: record.created_at,
            updated_at: record.updated_at,
            completed_at: record.completed_at,
        }
    }

    /// 与知识状态、作答记录一同持久化的会话级记录
    pub fn to_record(&self) -> AssessmentSession {
        AssessmentSession {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            status: self.status,
            default_mastery: self.default_mastery.clone(),
            streaks: self.streaks.clone(),
            velocity: self.velocity.clone(),
            attempt_count: self.attempts.len() as u64,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn knows_topic(&self, topic: &str) -> bool {
        self.default_mastery.contains_key(topic)
    }

    pub fn ensure_active(&self) -> Result<(), EngineError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                session_id: self.id.clone(),
                status: self.status,
            })
        }
    }

    /// 应用一次已评估的作答，出错时不做任何修改
    pub fn record_attempt(
        &mut self,
        mut record: AttemptRecord,
        config: &MasteryUpdateConfig,
    ) -> Result<AttemptOutcome, EngineError> {
        self.ensure_active()?;
        let Some(&default) = self.default_mastery.get(&record.topic) else {
            return Err(EngineError::InvalidTopic(record.topic));
        };

        record.score = if record.score.is_finite() {
            record.score.clamp(0.0, 1.0)
        } else {
            DEFAULT_SCORE
        };

        let topic = record.topic.clone();
        let previous_mastery = self.current_mastery(&topic);
        let new_mastery = update_mastery(previous_mastery, record.score, record.difficulty, config);
        let streak = update_streak(self.streak(&topic), record.score, config);
        let correct = is_correct(record.score, config);

        let entry = self
            .knowledge
            .entry(topic.clone())
            .or_insert_with(|| KnowledgeState::new(&topic, default));
        entry.mastery = new_mastery;
        entry.streak = streak;
        entry.last_practiced = Some(record.timestamp);

        self.attempts.push(record);
        self.streaks.insert(topic.clone(), streak);

        let timestamps: Vec<DateTime<Utc>> = self
            .attempts
            .iter()
            .filter(|a| a.topic == topic)
            .map(|a| a.timestamp)
            .collect();
        let velocity = learning_velocity(&timestamps);
        self.velocity.insert(topic.clone(), velocity);
        self.updated_at = Utc::now();

        Ok(AttemptOutcome {
            topic,
            previous_mastery,
            new_mastery,
            streak,
            velocity,
            is_correct: correct,
        })
    }

    pub fn complete(&mut self) -> Result<(), EngineError> {
        self.close(SessionStatus::Completed)
    }

    pub fn abandon(&mut self) -> Result<(), EngineError> {
        self.close(SessionStatus::Abandoned)
    }

    fn close(&mut self, status: SessionStatus) -> Result<(), EngineError> {
        self.ensure_active()?;
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn current_mastery(&self, topic: &str) -> f64 {
        match self.knowledge.get(topic) {
            Some(state) => state.mastery,
            None => self.default_mastery.get(topic).copied().unwrap_or(0.0),
        }
    }

    pub fn knowledge(&self, topic: &str) -> Option<&KnowledgeState> {
        self.knowledge.get(topic)
    }

    pub fn streak(&self, topic: &str) -> i32 {
        self.streaks.get(topic).copied().unwrap_or(0)
    }

    pub fn velocity(&self, topic: &str) -> f64 {
        self.velocity.get(topic).copied().unwrap_or(0.0)
    }

    /// 按记录顺序返回全部作答
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// 某一主题的作答，按记录顺序
    pub fn history(&self, topic: &str) -> Vec<&AttemptRecord> {
        self.attempts.iter().filter(|a| a.topic == topic).collect()
    }

    /// `topic` 最近至多 `k` 次得分，旧的在前
    pub fn recent_scores(&self, topic: &str, k: usize) -> Vec<f64> {
        let mut scores: Vec<f64> = self
            .attempts
            .iter()
            .rev()
            .filter(|a| a.topic == topic)
            .take(k)
            .map(|a| a.score)
            .collect();
        scores.reverse();
        scores
    }

    pub fn attempts_by_topic(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for attempt in &self.attempts {
            *counts.entry(attempt.topic.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// 目录默认值叠加已记录的知识状态
    pub fn mastery_map(&self) -> BTreeMap<String, f64> {
        let mut map = self.default_mastery.clone();
        for (topic, state) in &self.knowledge {
            map.insert(topic.clone(), state.mastery);
        }
        map
    }

    pub fn snapshot(&self, config: &MasteryUpdateConfig) -> SessionSnapshot {
        let total_attempts = self.attempts.len();
        let correct_attempts = self
            .attempts
            .iter()
            .filter(|a| is_correct(a.score, config))
            .count();
        let average_score = if total_attempts > 0 {
            self.attempts.iter().map(|a| a.score).sum::<f64>() / total_attempts as f64
        } else {
            0.0
        };

        SessionSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            knowledge_state: self.knowledge.clone(),
            streaks: self.streaks.clone(),
            velocity: self.velocity.clone(),
            total_attempts,
            correct_attempts,
            average_score,
        }
    }
}
