//! HTTP client for a running comicnet server's `POST /classify` endpoint.

use comicnet_core::Classification;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for a classification server.
pub struct ClassifierClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClassifierClient {
    /// Create a client for the given server base URL.
    ///
    /// `base_url` should be like `http://localhost:5000` (a trailing slash is
    /// tolerated).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/classify", self.base_url)
    }

    /// Send encoded image bytes and return the top classification.
    pub async fn classify(&self, image: Vec<u8>) -> Result<Classification, ClientError> {
        let url = self.endpoint();

        debug!(url = %url, bytes = image.len(), "classifying image");
        let resp = self.client.post(&url).body(image).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let classification: Classification = serde_json::from_str(&body)?;
        info!(
            label = %classification.label,
            probability = classification.probability,
            "classification"
        );
        Ok(classification)
    }

    /// Whether the server's top label for this image is `label`.
    pub async fn is_label(&self, image: Vec<u8>, label: &str) -> Result<bool, ClientError> {
        Ok(self.classify(image).await?.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use axum::routing::post;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn echo_len(body: Bytes) -> String {
        let label = if body.len() > 3 { "comic" } else { "not_comic" };
        format!(r#"{{"probability": 0.75, "label": "{label}"}}"#)
    }

    #[test]
    fn trailing_slash_trimmed() {
        let client = ClassifierClient::new("http://localhost:5000/".into());
        assert_eq!(client.endpoint(), "http://localhost:5000/classify");
    }

    #[tokio::test]
    async fn classify_parses_response() {
        let base = spawn(Router::new().route("/classify", post(echo_len))).await;
        let client = ClassifierClient::new(base);

        let result = client.classify(vec![1, 2, 3, 4]).await.unwrap();
        assert_eq!(result, Classification::new(0.75, "comic"));
    }

    #[tokio::test]
    async fn is_label_compares_top_label() {
        let base = spawn(Router::new().route("/classify", post(echo_len))).await;
        let client = ClassifierClient::new(base);

        assert!(client.is_label(vec![0; 10], "comic").await.unwrap());
        assert!(!client.is_label(vec![0; 2], "comic").await.unwrap());
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let router = Router::new().route(
            "/classify",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "image decode error: bad") }),
        );
        let client = ClassifierClient::new(spawn(router).await);

        match client.classify(b"junk".to_vec()).await {
            Err(ClientError::Server { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("decode"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_json_error() {
        let router = Router::new().route("/classify", post(|| async { "not json" }));
        let client = ClassifierClient::new(spawn(router).await);
        assert!(matches!(
            client.classify(vec![1]).await,
            Err(ClientError::Json(_))
        ));
    }
}
