use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Hosted model used when the config doesn't name one
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("API request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeminiError>;

/// Client for the `generateContent` endpoint of the Gemini API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, GEMINI_API_BASE.to_string(), DEFAULT_MODEL.to_string())
    }

    /// For proxies, regional endpoints and tests
    pub fn with_base_url(api_key: Option<String>, base_url: String, model: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("FleetTrack/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single-turn prompt and return the concatenated text of the first candidate
    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("POST {} ({} prompt bytes)", url, prompt.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::RequestFailed {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let raw = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw)?;
        parsed.text().ok_or(GeminiError::EmptyResponse)
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate joined together, `None` when there are none
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer it with `status` and `body`, hand back the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let client = GeminiClient::new(None).unwrap();
        assert!(!client.has_api_key());

        let err = client.generate_content("hello").await.unwrap_err();
        assert!(matches!(err, GeminiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_blank_api_key_counts_as_missing() {
        let client = GeminiClient::new(Some("   ".to_string())).unwrap();
        assert!(!client.has_api_key());
    }

    #[tokio::test]
    async fn test_generate_content_returns_candidate_text() {
        let (base_url, server) = serve_once(
            "200 OK",
            r###"{"candidates":[{"content":{"parts":[{"text":"## Fleet"},{"text":" is fine"}]}}]}"###,
        )
        .await;

        let client =
            GeminiClient::with_base_url(Some("secret".to_string()), base_url, DEFAULT_MODEL.to_string())
                .unwrap();
        let text = client.generate_content("analyze this").await.unwrap();
        assert_eq!(text, "## Fleet is fine");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /models/gemini-2.5-flash:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: secret"));
        assert!(request.contains(r#""text":"analyze this""#));
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced_with_message() {
        let (base_url, server) = serve_once(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        )
        .await;

        let client =
            GeminiClient::with_base_url(Some("bad".to_string()), base_url, DEFAULT_MODEL.to_string())
                .unwrap();
        let err = client.generate_content("x").await.unwrap_err();
        match err {
            GeminiError::RequestFailed { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let (base_url, server) = serve_once("200 OK", r#"{"candidates":[]}"#).await;

        let client =
            GeminiClient::with_base_url(Some("k".to_string()), base_url, DEFAULT_MODEL.to_string())
                .unwrap();
        let err = client.generate_content("x").await.unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
        server.await.unwrap();
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
        assert_eq!(
            error_message(r#"{"error":{"message":"quota exceeded"}}"#),
            "quota exceeded"
        );
    }

    #[test]
    fn test_response_text_skips_parts_without_text() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{}},{"text":"ok"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("ok"));
    }
}
