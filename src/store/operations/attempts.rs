use sled::transaction::ConflictableTransactionError;
use sled::Transactional;

use crate::adaptive::types::{AttemptRecord, KnowledgeState};
use crate::store::keys;
use crate::store::operations::assessment_sessions::AssessmentSession;
use crate::store::{map_transaction_error, Store, StoreError};

impl Store {
    /// 写入第 `seq` 次作答。日志只追加，槽位已占用视为冲突
    pub fn append_attempt(
        &self,
        user_id: &str,
        session_id: &str,
        seq: u64,
        record: &AttemptRecord,
    ) -> Result<(), StoreError> {
        let key = keys::attempt_key(user_id, session_id, seq)?;
        let cas_result = self
            .attempts
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(Self::serialize(record)?))
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "attempt".to_string(),
                key,
            });
        }
        Ok(())
    }

    /// 按记录顺序返回会话的作答
    pub fn list_attempts(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<AttemptRecord>, StoreError> {
        let prefix = keys::session_prefix(user_id, session_id)?;
        self.attempts
            .scan_prefix(prefix.as_bytes())
            .map(|item| {
                let (_, value) = item?;
                Self::deserialize(&value)
            })
            .collect()
    }

    /// 原子地持久化一次作答的结果：更新后的会话记录、该主题的知识状态，
    /// 以及位于 `session.attempt_count - 1` 槽位的新作答
    pub fn persist_attempt(
        &self,
        session: &AssessmentSession,
        knowledge: &KnowledgeState,
        record: &AttemptRecord,
    ) -> Result<(), StoreError> {
        let Some(seq) = session.attempt_count.checked_sub(1) else {
            return Err(StoreError::Validation(
                "session record has no attempts to persist".to_string(),
            ));
        };
        let session_key = keys::session_key(&session.user_id, &session.id)?;
        let knowledge_key =
            keys::knowledge_state_key(&session.user_id, &session.id, &knowledge.topic)?;
        let attempt_key = keys::attempt_key(&session.user_id, &session.id, seq)?;

        let session_bytes = Self::serialize(session)?;
        let knowledge_bytes = Self::serialize(knowledge)?;
        let attempt_bytes = Self::serialize(record)?;

        (&self.assessment_sessions, &self.knowledge_states, &self.attempts)
            .transaction(|(tx_sessions, tx_knowledge, tx_attempts)| {
                if tx_sessions.get(session_key.as_bytes())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "assessment_session".to_string(),
                        key: session_key.clone(),
                    }));
                }
                if tx_attempts.get(attempt_key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "attempt".to_string(),
                        key: attempt_key.clone(),
                    }));
                }
                tx_sessions.insert(session_key.as_bytes(), session_bytes.as_slice())?;
                tx_knowledge.insert(knowledge_key.as_bytes(), knowledge_bytes.as_slice())?;
                tx_attempts.insert(attempt_key.as_bytes(), attempt_bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::adaptive::types::{DifficultyTier, SessionStatus};

    fn record(topic: &str, score: f64, minutes: i64) -> AttemptRecord {
        AttemptRecord {
            topic: topic.to_string(),
            question: "q".to_string(),
            answer: "a".to_string(),
            score,
            difficulty: DifficultyTier::Easy,
            timestamp: Utc::now() + Duration::minutes(minutes),
            time_spent_secs: 12.0,
        }
    }

    fn session(attempt_count: u64) -> AssessmentSession {
        let now = Utc::now();
        AssessmentSession {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            status: SessionStatus::Active,
            default_mastery: BTreeMap::from([("Arrays".to_string(), 0.0)]),
            streaks: BTreeMap::new(),
            velocity: BTreeMap::new(),
            attempt_count,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn append_keeps_order_and_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        for seq in 0..12u64 {
            store
                .append_attempt("u1", "s1", seq, &record("Arrays", seq as f64 / 16.0, seq as i64))
                .unwrap();
        }
        let err = store
            .append_attempt("u1", "s1", 3, &record("Arrays", 1.0, 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let attempts = store.list_attempts("u1", "s1").unwrap();
        assert_eq!(attempts.len(), 12);
        assert_eq!(attempts[3].score, 3.0 / 16.0);
        assert_eq!(attempts[11].score, 11.0 / 16.0);
    }

    #[test]
    fn persist_attempt_writes_all_three_trees() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        store.create_assessment_session(&session(0)).unwrap();

        let mut knowledge = KnowledgeState::new("Arrays", 0.1);
        knowledge.streak = 1;
        store
            .persist_attempt(&session(1), &knowledge, &record("Arrays", 0.8, 0))
            .unwrap();

        let meta = store.get_assessment_session("u1", "s1").unwrap().unwrap();
        assert_eq!(meta.attempt_count, 1);
        assert_eq!(
            store.get_knowledge_state("u1", "s1", "Arrays").unwrap(),
            Some(knowledge.clone())
        );
        assert_eq!(store.list_attempts("u1", "s1").unwrap().len(), 1);

        // 重放同一槽位不产生变化
        let err = store
            .persist_attempt(&session(1), &knowledge, &record("Arrays", 0.2, 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.list_attempts("u1", "s1").unwrap()[0].score, 0.8);
    }

    #[test]
    fn persist_attempt_requires_session() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        let err = store
            .persist_attempt(&session(1), &KnowledgeState::new("Arrays", 0.0), &record("Arrays", 0.5, 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.list_attempts("u1", "s1").unwrap().is_empty());
        assert!(store.list_knowledge_states("u1", "s1").unwrap().is_empty());

        let err = store
            .persist_attempt(&session(0), &KnowledgeState::new("Arrays", 0.0), &record("Arrays", 0.5, 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
