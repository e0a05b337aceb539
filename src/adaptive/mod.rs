pub mod catalog;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod mastery;
pub mod prerequisite;
pub mod scoring;
pub mod session;
pub mod topic_selector;
pub mod types;
