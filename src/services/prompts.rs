use crate::adaptive::types::DifficultyTier;

fn difficulty_guidance(difficulty: DifficultyTier) -> &'static str {
    match difficulty {
        DifficultyTier::Easy => "a basic recall or single-step question",
        DifficultyTier::Medium => "a question that applies the concept to a short example",
        DifficultyTier::Hard => "a multi-step problem that needs analysis of edge cases or complexity",
    }
}

pub fn question_prompt(topic: &str, difficulty: DifficultyTier) -> String {
    format!(
        "You are writing practice questions on {topic}.\n\
         Write {guidance} at {difficulty} difficulty.\n\
         Return only the question text, without the answer.",
        guidance = difficulty_guidance(difficulty),
    )
}

pub fn evaluation_prompt(
    topic: &str,
    difficulty: DifficultyTier,
    question: &str,
    answer: &str,
) -> String {
    format!(
        "Evaluate a learner's answer to a {difficulty} question on {topic}.\n\n\
         Question:\n{question}\n\n\
         Answer:\n{answer}\n\n\
         Give short feedback, then finish with a line of the form \"Score: X/10\"."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_prompt_mentions_topic_and_tier() {
        let prompt = question_prompt("Graphs", DifficultyTier::Hard);
        assert!(prompt.contains("Graphs"));
        assert!(prompt.contains("hard difficulty"));
    }

    #[test]
    fn evaluation_prompt_requests_score_line() {
        let prompt = evaluation_prompt("Arrays", DifficultyTier::Easy, "What is O(1)?", "constant");
        assert!(prompt.contains("What is O(1)?"));
        assert!(prompt.contains("constant"));
        assert!(prompt.contains("Score: X/10"));
    }
}
