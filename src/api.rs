use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::config::BackendConfig;
use crate::form::ResearchRequest;
use crate::models::{ChatMessage, ResearchResult, Role};

pub const RESEARCH_PATH: &str = "/api/research";
pub const CHAT_PATH: &str = "/api/chat";

const CHAT_FAILED: &str = "Failed to get a response from the assistant.";

/// Any way a backend call can go wrong, already phrased for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestFailure {
    #[error("Please sign in before starting a research session.")]
    NotSignedIn,
    #[error("Could not reach the research service: {0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Malformed(String),
}

impl RequestFailure {
    fn transport(err: reqwest::Error) -> Self {
        RequestFailure::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    chat_history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    ai_message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct ResearchClient {
    base_url: String,
    client: reqwest::Client,
    identity: Identity,
}

impl ResearchClient {
    pub fn with_config(config: &BackendConfig, identity: Identity) -> Self {
        ResearchClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match self.identity.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult, RequestFailure> {
        self.identity.ensure_signed_in()?;

        let form = request.to_multipart().map_err(RequestFailure::transport)?;
        let response = self
            .post(RESEARCH_PATH)
            .multipart(form)
            .send()
            .await
            .map_err(RequestFailure::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP error! Status: {}", status.as_u16()));
            tracing::warn!(status = status.as_u16(), error = %message, "Research endpoint rejected request");
            return Err(RequestFailure::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(RequestFailure::transport)?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "Unreadable research response");
            RequestFailure::Malformed(format!("The research service sent an unreadable response: {}", e))
        })
    }

    pub async fn chat(&self, history: &[ChatMessage]) -> Result<ChatMessage, RequestFailure> {
        self.identity.ensure_signed_in()?;

        let response = self
            .post(CHAT_PATH)
            .json(&ChatRequest { chat_history: history })
            .send()
            .await
            .map_err(RequestFailure::transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Chat endpoint rejected request");
            return Err(RequestFailure::Rejected {
                status: status.as_u16(),
                message: CHAT_FAILED.to_string(),
            });
        }

        let body = response.bytes().await.map_err(RequestFailure::transport)?;
        let reply = serde_json::from_slice::<ChatResponse>(&body)
            .map_err(|e| {
                tracing::warn!(error = %e, "Unreadable chat response");
                RequestFailure::Malformed(CHAT_FAILED.to_string())
            })?
            .ai_message;

        if reply.role() != Role::Assistant {
            return Err(RequestFailure::Malformed(CHAT_FAILED.to_string()));
        }
        Ok(reply)
    }
}
