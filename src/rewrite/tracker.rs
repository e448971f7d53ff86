use std::sync::{Mutex, MutexGuard};

use tracing::info;

use super::{RewriteClient, RewriteError, summary_prompt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Done(String),
    Failed(String),
}

impl RequestState {
    pub fn status_text(&self) -> String {
        match self {
            RequestState::Idle => String::new(),
            RequestState::Pending => "Sending to AI...".to_string(),
            RequestState::Done(_) => "AI done".to_string(),
            RequestState::Failed(msg) => format!("AI error: {msg}"),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    state: Mutex<RequestState>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.lock().clone()
    }

    pub fn begin(&self) -> Result<(), RewriteError> {
        let mut state = self.lock();
        if state.is_pending() {
            return Err(RewriteError::Busy);
        }
        *state = RequestState::Pending;
        Ok(())
    }

    pub fn finish(&self, outcome: &Result<String, RewriteError>) -> RequestState {
        let next = match outcome {
            Ok(text) => RequestState::Done(text.clone()),
            Err(err) => RequestState::Failed(err.to_string()),
        };
        *self.lock() = next.clone();
        next
    }

    pub async fn submit(
        &self,
        client: &RewriteClient,
        summary: &str,
    ) -> Result<String, RewriteError> {
        if summary.trim().is_empty() {
            return Err(RewriteError::MissingPrompt);
        }
        self.begin()?;
        info!(status = %RequestState::Pending.status_text(), "rewrite started");
        let outcome = client.rewrite(&summary_prompt(summary)).await;
        let state = self.finish(&outcome);
        info!(status = %state.status_text(), "rewrite settled");
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, RequestState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{STUB_KEY, spawn_stub};
    use super::*;
    use crate::config::RewriteConfig;

    #[test]
    fn starts_idle_and_refuses_second_begin() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.state(), RequestState::Idle);
        assert_eq!(tracker.state().status_text(), "");

        tracker.begin().expect("first begin");
        assert_eq!(tracker.state().status_text(), "Sending to AI...");
        assert!(matches!(tracker.begin(), Err(RewriteError::Busy)));
    }

    #[test]
    fn finish_records_outcome_and_allows_resubmission() {
        let tracker = RequestTracker::new();
        tracker.begin().expect("begin");
        let state = tracker.finish(&Ok("polished".to_string()));
        assert_eq!(state, RequestState::Done("polished".to_string()));
        assert_eq!(state.status_text(), "AI done");

        tracker.begin().expect("settled tracker accepts a new request");
        let state = tracker.finish(&Err(RewriteError::NotConfigured));
        assert_eq!(state.status_text(), "AI error: OpenAI key not configured");
    }

    #[tokio::test]
    async fn submit_wraps_summary_in_prompt() {
        let addr = spawn_stub().await;
        let client = RewriteClient::new(RewriteConfig {
            api_key: Some(STUB_KEY.to_string()),
            base_url: format!("http://{addr}/v1"),
            ..RewriteConfig::default()
        });
        let tracker = RequestTracker::new();

        let text = tracker
            .submit(&client, "You have 30 years.")
            .await
            .expect("stub answers");
        assert_eq!(text, format!("rewritten: {}", summary_prompt("You have 30 years.")));
        assert_eq!(tracker.state(), RequestState::Done(text));
    }

    #[tokio::test]
    async fn submit_while_pending_is_busy() {
        let client = RewriteClient::new(RewriteConfig::default());
        let tracker = RequestTracker::new();
        tracker.begin().expect("first request");
        assert!(matches!(
            tracker.submit(&client, "summary").await,
            Err(RewriteError::Busy)
        ));
        assert!(tracker.state().is_pending());
    }

    #[tokio::test]
    async fn empty_summary_is_not_sent() {
        let client = RewriteClient::new(RewriteConfig::default());
        let tracker = RequestTracker::new();
        assert!(matches!(
            tracker.submit(&client, "  ").await,
            Err(RewriteError::MissingPrompt)
        ));
        assert_eq!(tracker.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn failure_is_reported_as_status_text() {
        let client = RewriteClient::new(RewriteConfig::default());
        let tracker = RequestTracker::new();
        let err = tracker
            .submit(&client, "summary")
            .await
            .expect_err("no key configured");
        assert!(matches!(err, RewriteError::NotConfigured));
        assert_eq!(
            tracker.state().status_text(),
            "AI error: OpenAI key not configured"
        );
    }
}
