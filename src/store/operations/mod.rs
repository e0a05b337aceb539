pub mod assessment_sessions;
pub mod attempts;
pub mod knowledge_states;
