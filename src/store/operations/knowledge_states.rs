use crate::adaptive::types::KnowledgeState;
use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    pub fn upsert_knowledge_state(
        &self,
        user_id: &str,
        session_id: &str,
        state: &KnowledgeState,
    ) -> Result<(), StoreError> {
        let key = keys::knowledge_state_key(user_id, session_id, &state.topic)?;
        self.knowledge_states
            .insert(key.as_bytes(), Self::serialize(state)?)?;
        Ok(())
    }

    pub fn get_knowledge_state(
        &self,
        user_id: &str,
        session_id: &str,
        topic: &str,
    ) -> Result<Option<KnowledgeState>, StoreError> {
        let key = keys::knowledge_state_key(user_id, session_id, topic)?;
        self.knowledge_states
            .get(key.as_bytes())?
            .map(|raw| Self::deserialize(&raw))
            .transpose()
    }

    /// 会话中所有已记录的主题，按主题名排序
    pub fn list_knowledge_states(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<KnowledgeState>, StoreError> {
        let prefix = keys::session_prefix(user_id, session_id)?;
        self.knowledge_states
            .scan_prefix(prefix.as_bytes())
            .map(|item| {
                let (_, value) = item?;
                Self::deserialize(&value)
            })
            .collect()
    }
}
