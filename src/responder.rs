//! HTTP client for the remote helpdesk responder.
//!
//! The contract is a single POST carrying the user's latest utterance;
//! the service keeps whatever context it wants on its side. Anything
//! other than a success status with a well-formed body is an error.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Local development server, used when no endpoint is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001/api/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Clone)]
pub struct ResponderClient {
    client: Client,
    url: String,
}

impl ResponderClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// Send one utterance and return the assistant's reply.
    pub async fn send(&self, message: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "helpdesk request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ResponderClient {
        ResponderClient::new(&format!("{}/api/chat", server.uri()))
    }

    #[tokio::test]
    async fn send_posts_message_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({ "message": "Reset password" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "Here's how to reset it." })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client.send("Reset password").await.unwrap();
        assert_eq!(reply, "Here's how to reset it.");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "error": "unavailable" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.send("hello").await.is_err());
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.send("hello").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Nothing listens here; reqwest fails at the transport level.
        let client = ResponderClient::new("http://127.0.0.1:1/api/chat");
        assert!(client.send("hello").await.is_err());
    }
}
