pub const ASSESSMENT_SESSIONS: &str = "assessment_sessions";
pub const SESSION_USER_INDEX: &str = "session_user_index";
pub const KNOWLEDGE_STATES: &str = "knowledge_states";
pub const ATTEMPTS: &str = "attempts";
pub const CONFIG_VERSIONS: &str = "config_versions";
