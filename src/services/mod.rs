pub mod llm_provider;
pub mod prompts;
