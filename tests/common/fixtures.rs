use adaptive_mastery::adaptive::catalog::{PrerequisiteEdge, TopicGraph, TopicSpec};
use adaptive_mastery::adaptive::types::{AnswerSubmission, DifficultyTier};

pub fn submission(topic: &str, difficulty: DifficultyTier) -> AnswerSubmission {
    AnswerSubmission {
        topic: topic.to_string(),
        question: format!("Explain a core idea of {topic}."),
        answer: "An answer with some detail.".to_string(),
        difficulty,
        time_spent_secs: 30.0,
    }
}

/// Two roots and one dependent topic that needs both.
pub fn small_graph() -> TopicGraph {
    let topics = ["Arrays", "Recursion", "Dynamic Programming"]
        .iter()
        .map(|name| TopicSpec {
            name: name.to_string(),
            default_mastery: 0.0,
        })
        .collect();
    let edges = vec![
        PrerequisiteEdge {
            topic: "Dynamic Programming".to_string(),
            prerequisite: "Recursion".to_string(),
            weight: 0.9,
        },
        PrerequisiteEdge {
            topic: "Dynamic Programming".to_string(),
            prerequisite: "Arrays".to_string(),
            weight: 0.5,
        },
    ];
    TopicGraph::new(topics, edges).expect("valid graph")
}
