use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::transcript::BotReply;

#[derive(Serialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
    error: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one message to the chat endpoint and classify the reply.
    ///
    /// Any non-2xx status, network error, or unparseable body comes back as
    /// an `Err` and is treated uniformly as a transport failure by the caller.
    pub async fn send(&self, message: &str) -> Result<BotReply> {
        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}. Is the backend running at {}?",
                response.status(),
                self.endpoint
            ));
        }

        let chat_response: ChatResponse = response.json().await?;
        if let Some(text) = chat_response.response {
            Ok(BotReply::Text(text))
        } else if let Some(detail) = chat_response.error {
            Ok(BotReply::ServerError(detail))
        } else {
            Ok(BotReply::Empty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> ChatClient {
        ChatClient::new(&format!("{}/api/chat", server.url()))
    }

    #[tokio::test]
    async fn response_field_becomes_text_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("content-type", "application/json")
            .match_body(r#"{"message":"hello"}"#)
            .with_status(200)
            .with_body(r#"{"response":"hi"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let reply = client.send("hello").await.unwrap();

        assert!(matches!(reply, BotReply::Text(ref t) if t == "hi"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_field_becomes_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"error":"model exploded"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let reply = client.send("hello").await.unwrap();

        assert!(matches!(reply, BotReply::ServerError(_)));
    }

    #[tokio::test]
    async fn payload_with_neither_field_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        let reply = client.send("hello").await.unwrap();

        assert!(matches!(reply, BotReply::Empty));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("internal server error")
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.send("hello").await.is_err());
    }

    #[tokio::test]
    async fn unparseable_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.send("hello").await.is_err());
    }
}
