// Suggestion Orchestrator: bulk suggestion pass and targeted rewrite.
// All generation goes through the TextGenerator trait from llm_client.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{rewrite_section, run_bulk_pass, OrchestratorError, SectionOutcome};

#[cfg(test)]
pub mod testing {
    //! Generator fakes shared by the orchestrator and router tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::{LlmError, TextGenerator};

    /// Replays a fixed script of answers, one per call, and records prompts.
    /// Once the script runs out it keeps returning `fallback`.
    pub struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        fallback: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn always(answer: &str) -> Self {
            Self {
                fallback: Some(answer.to_string()),
                ..Self::new(Vec::new())
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(answer) => answer,
                None => self.fallback.clone().ok_or(LlmError::EmptyContent),
            }
        }
    }

    /// Never answers.
    pub struct HangingGenerator;

    #[async_trait]
    impl TextGenerator for HangingGenerator {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            std::future::pending().await
        }
    }
}
