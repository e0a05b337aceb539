use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::adaptive::session::SessionState;
use crate::adaptive::types::SessionStatus;
use crate::store::keys;
use crate::store::{map_transaction_error, Store, StoreError};

/// 会话级记录，知识状态和作答记录存于各自的树
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSession {
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    /// 会话创建时记录的目录默认值
    pub default_mastery: BTreeMap<String, f64>,
    #[serde(default)]
    pub streaks: BTreeMap<String, i32>,
    #[serde(default)]
    pub velocity: BTreeMap<String, f64>,
    #[serde(default)]
    pub attempt_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Store {
    pub fn create_assessment_session(&self, session: &AssessmentSession) -> Result<(), StoreError> {
        let key = keys::session_key(&session.user_id, &session.id)?;
        let index_key = keys::session_user_index_key(&session.user_id, &session.id)?;
        let session_bytes = Self::serialize(session)?;

        (&self.assessment_sessions, &self.session_user_index)
            .transaction(|(tx_sessions, tx_index)| {
                if tx_sessions.get(key.as_bytes())?.is_some() {
                    return Err(sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::Conflict {
                            entity: "assessment_session".to_string(),
                            key: key.clone(),
                        },
                    ));
                }
                tx_sessions.insert(key.as_bytes(), session_bytes.as_slice())?;
                tx_index.insert(index_key.as_bytes(), session.id.as_bytes())?;
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    pub fn get_assessment_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        let key = keys::session_key(user_id, session_id)?;
        self.assessment_sessions
            .get(key.as_bytes())?
            .map(|raw| Self::deserialize(&raw))
            .transpose()
    }

    /// 覆盖已有的会话记录，会话必须已存在
    pub fn update_session_meta(&self, session: &AssessmentSession) -> Result<(), StoreError> {
        let key = keys::session_key(&session.user_id, &session.id)?;
        let bytes = Self::serialize(session)?;
        self.assessment_sessions
            .transaction(|tx| {
                if tx.get(key.as_bytes())?.is_none() {
                    return Err(sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::NotFound {
                            entity: "assessment_session".to_string(),
                            key: key.clone(),
                        },
                    ));
                }
                tx.insert(key.as_bytes(), bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    pub fn list_sessions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<AssessmentSession>, StoreError> {
        let prefix = keys::session_user_index_prefix(user_id)?;
        let mut sessions = Vec::new();
        for item in self.session_user_index.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            let session_id = String::from_utf8_lossy(&value).into_owned();
            if let Some(session) = self.get_assessment_session(user_id, &session_id)? {
                sessions.push(session);
            }
        }
        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    /// 用户最近创建的活跃会话
    pub fn active_session_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(self
            .list_sessions_for_user(user_id)?
            .into_iter()
            .rev()
            .find(|s| s.status == SessionStatus::Active))
    }

    /// 加载完整会话：会话记录、知识状态与作答日志
    pub fn load_session_state(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionState>, StoreError> {
        let Some(record) = self.get_assessment_session(user_id, session_id)? else {
            return Ok(None);
        };
        let knowledge = self.list_knowledge_states(user_id, session_id)?;
        let attempts = self.list_attempts(user_id, session_id)?;
        if attempts.len() as u64 != record.attempt_count {
            tracing::warn!(
                user_id,
                session_id,
                stored = attempts.len(),
                expected = record.attempt_count,
                "Attempt log length differs from session record"
            );
        }
        Ok(Some(SessionState::from_parts(record, knowledge, attempts)))
    }
}
