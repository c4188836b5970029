//! HTTP client for reporting completions to a running backend.

use lesson_core::ExerciseCompleted;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ProgressClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// The subset of the lesson progress row the client cares about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressAck {
    pub lesson_id: String,
    pub status: String,
    pub current_exercise_index: i32,
}

pub struct ProgressClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl ProgressClient {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("ReChess/1.0")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/progress/exercise", self.base_url)
    }

    pub async fn report(&self, event: &ExerciseCompleted) -> Result<ProgressAck, ProgressClientError> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProgressClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = ProgressClient::new("http://localhost:8000/", "token").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/progress/exercise");
    }
}
