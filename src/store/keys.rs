use crate::constants::ATTEMPT_SEQ_WIDTH;
use crate::store::StoreError;

/// id 作为键段使用，必须非空且不含分隔符
fn validate_id(kind: &str, id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::Validation(format!("{kind} must not be empty")));
    }
    if id.contains(':') {
        return Err(StoreError::Validation(format!(
            "{kind} must not contain ':' (got {id})"
        )));
    }
    Ok(())
}

pub fn session_key(user_id: &str, session_id: &str) -> Result<String, StoreError> {
    validate_id("user_id", user_id)?;
    validate_id("session_id", session_id)?;
    Ok(format!("{}:{}", user_id, session_id))
}

pub fn session_user_index_key(user_id: &str, session_id: &str) -> Result<String, StoreError> {
    validate_id("user_id", user_id)?;
    validate_id("session_id", session_id)?;
    Ok(format!("user:{}:{}", user_id, session_id))
}

pub fn session_user_index_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_id("user_id", user_id)?;
    Ok(format!("user:{}:", user_id))
}

pub fn knowledge_state_key(
    user_id: &str,
    session_id: &str,
    topic: &str,
) -> Result<String, StoreError> {
    if topic.is_empty() {
        return Err(StoreError::Validation("topic must not be empty".to_string()));
    }
    Ok(format!("{}{}", session_prefix(user_id, session_id)?, topic))
}

pub fn attempt_key(user_id: &str, session_id: &str, seq: u64) -> Result<String, StoreError> {
    Ok(format!(
        "{}{:0width$}",
        session_prefix(user_id, session_id)?,
        seq,
        width = ATTEMPT_SEQ_WIDTH
    ))
}

/// 同一会话知识状态键与作答键的公共前缀
pub fn session_prefix(user_id: &str, session_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", session_key(user_id, session_id)?))
}
