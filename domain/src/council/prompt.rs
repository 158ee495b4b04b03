//! Prompt templates for council stages

/// Templates for the peer-ranking stage
pub struct CouncilPrompt;

impl CouncilPrompt {
    /// Prompt asking a member to rank the anonymized responses
    pub fn ranking_prompt(task: &str, responses: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"Original task: {}

Several council members answered this task independently. Their responses
are anonymized below. Evaluate each one for correctness, completeness and
clarity.

Responses to rank:
"#,
            task
        );

        for (id, content) in responses {
            prompt.push_str(&format!("\n--- Response {} ---\n{}\n", id, content));
        }

        prompt.push_str(
            r#"
Rank every response from best to worst, one per line, in exactly this format:

1. Response <id> (Score: <0-10>/10) - <one sentence justification>

Use each response id exactly once."#,
        );

        prompt
    }
}
