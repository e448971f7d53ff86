mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RewriteConfig;

pub use tracker::{RequestState, RequestTracker};

const SUMMARY_INSTRUCTION: &str =
    "Rewrite this financial planner summary in clear, concise professional tone:";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("No prompt provided")]
    MissingPrompt,
    #[error("OpenAI key not configured")]
    NotConfigured,
    #[error("A rewrite request is already pending")]
    Busy,
    #[error("OpenAI request failed: {status}")]
    Upstream { status: u16, body: String },
    #[error("OpenAI request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("OpenAI response could not be read: {0}")]
    MalformedResponse(String),
}

impl RewriteError {
    pub fn status_code(&self) -> u16 {
        match self {
            RewriteError::MissingPrompt => 400,
            RewriteError::NotConfigured => 500,
            RewriteError::Busy => 409,
            RewriteError::Upstream { status, .. } => *status,
            RewriteError::Transport(_) | RewriteError::MalformedResponse(_) => 502,
        }
    }

    pub fn body(&self) -> String {
        match self {
            RewriteError::Upstream { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

pub fn summary_prompt(summary: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{summary}")
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct RewriteClient {
    http: reqwest::Client,
    config: RewriteConfig,
}

impl RewriteClient {
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn rewrite(&self, prompt: &str) -> Result<String, RewriteError> {
        if prompt.trim().is_empty() {
            return Err(RewriteError::MissingPrompt);
        }
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(RewriteError::NotConfigured);
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "sending rewrite request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "rewrite upstream returned an error");
            return Err(RewriteError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header},
        response::{IntoResponse, Response},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    pub const STUB_KEY: &str = "sk-stub";

    async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {STUB_KEY}"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "bad key").into_response();
        }
        if body["model"].as_str().is_none() || body["max_tokens"].as_u64().is_none() {
            return (StatusCode::BAD_REQUEST, "missing fields").into_response();
        }

        let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
        if prompt.contains("rate-limit") {
            return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
        }
        if prompt.contains("no-choices") {
            return Json(json!({ "choices": [] })).into_response();
        }
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": format!("rewritten: {prompt}") } }]
        }))
        .into_response()
    }

    pub async fn spawn_stub() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let app = Router::new().route("/v1/chat/completions", post(completions));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });
        addr
    }
}
