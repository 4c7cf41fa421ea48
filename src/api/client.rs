use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::state::GradingMode;

/// The grading request body. Field names match the server's JSON contract;
/// a missing reference image is transmitted as an explicit `null`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
    pub rubric: String,
    pub context: String,
    pub reference_image: Option<String>,
    pub student_image: String,
    pub grading_mode: GradingMode,
}

#[derive(Deserialize)]
struct GradingReply {
    mode: String,
    feedback: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Successful grading result, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingOutcome {
    pub mode: GradingMode,
    pub feedback: String,
}

/// Client for the grading endpoint.
#[derive(Debug, Clone)]
pub struct GradingClient {
    client: Client,
    grade_url: String,
}

impl GradingClient {
    pub fn new(grade_url: String) -> Self {
        Self {
            client: Client::new(),
            grade_url,
        }
    }

    /// Submit one grading request.
    ///
    /// Non-2xx responses carry a JSON `{error}` body whose text is surfaced
    /// verbatim; an unreadable error body falls back to the raw text.
    pub async fn submit(&self, request: &GradingRequest) -> Result<GradingOutcome> {
        log::info!(
            "📡 Submitting {} grading request to {}",
            serde_json::to_string(&request.grading_mode).unwrap_or_default(),
            self.grade_url
        );

        let response = self
            .client
            .post(&self.grade_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::info!("📥 Grading response status: {status}");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            let message = serde_json::from_str::<ErrorReply>(&body)
                .map(|reply| reply.error)
                .unwrap_or(body);

            return Err(AppError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GradingReply = response.json().await?;

        Ok(GradingOutcome {
            mode: GradingMode::from_wire(&reply.mode),
            feedback: reply.feedback,
        })
    }
}
