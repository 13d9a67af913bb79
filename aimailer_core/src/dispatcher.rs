use crate::action::ActionRequest;
use crate::error::GenerationError;
use crate::llm::GenerationClient;
use crate::prompt::build_prompt;
use std::sync::Arc;

/// Turns an [`ActionRequest`] into a prompt and makes exactly one generation
/// call for it. Output is returned untouched.
#[derive(Clone)]
pub struct ActionDispatcher {
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl ActionDispatcher {
    pub fn new<M: Into<String>>(client: Arc<dyn GenerationClient>, model: M) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn execute(&self, request: &ActionRequest) -> Result<String, GenerationError> {
        let prompt = build_prompt(request);
        tracing::info!(
            action = %request.kind,
            tone = ?request.effective_tone(),
            model = %self.model,
            "dispatching action"
        );

        let result = self.client.generate(&self.model, &prompt).await;
        match &result {
            Ok(text) => tracing::info!(
                action = %request.kind,
                response_chars = text.chars().count(),
                "action completed"
            ),
            Err(err) => tracing::warn!(action = %request.kind, error = %err, "action failed"),
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and answers with a canned result.
    pub struct RecordingClient {
        pub calls: Mutex<Vec<(String, String)>>,
        reply: Result<String, GenerationError>,
    }

    impl RecordingClient {
        pub fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(text.to_string()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(GenerationError::new(message)),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.calls.lock().unwrap().last().map(|(_, p)| p.clone())
        }
    }

    #[async_trait]
    impl GenerationClient for RecordingClient {
        async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            self.reply.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingClient;
    use super::*;
    use crate::action::{ActionKind, Draft, Tone};

    #[tokio::test]
    async fn one_call_per_action_with_verbatim_draft() {
        for kind in ActionKind::ALL {
            let client = RecordingClient::ok("done");
            let dispatcher = ActionDispatcher::new(client.clone(), "gemini-1.5-flash");
            let request = ActionRequest::new(
                kind,
                Draft::new("Budget Q3", "Please send the numbers.\nThanks"),
            );

            let text = dispatcher.execute(&request).await.unwrap();
            assert_eq!(text, "done");
            assert_eq!(client.call_count(), 1);

            let calls = client.calls.lock().unwrap();
            let (model, prompt) = &calls[0];
            assert_eq!(model, "gemini-1.5-flash");
            assert!(prompt.contains("Budget Q3"));
            assert!(prompt.contains("Please send the numbers.\nThanks"));
        }
    }

    #[tokio::test]
    async fn reply_example_builds_friendly_prompt() {
        let client = RecordingClient::ok("Subject: Re: Meeting\nBody: Sure!");
        let dispatcher = ActionDispatcher::new(client.clone(), "m");
        let request = ActionRequest::new(
            ActionKind::Reply,
            Draft::new("Meeting", "Can we reschedule to Friday?"),
        )
        .with_tone(Tone::Friendly);

        dispatcher.execute(&request).await.unwrap();
        let prompt = client.last_prompt().unwrap();
        assert!(prompt.contains("friendly tone"));
        assert!(prompt.contains("\"Meeting\""));
        assert!(prompt.contains("Can we reschedule to Friday?"));
        assert!(prompt.contains("Subject: [your reply subject line]\nBody:"));
    }

    #[tokio::test]
    async fn client_errors_propagate_unchanged() {
        let client = RecordingClient::failing("network timeout");
        let dispatcher = ActionDispatcher::new(client.clone(), "m");
        let request = ActionRequest::new(ActionKind::Summarize, Draft::new("", "x"));

        let err = dispatcher.execute(&request).await.unwrap_err();
        assert_eq!(err, GenerationError::new("network timeout"));
        assert_eq!(client.call_count(), 1);
    }
}
