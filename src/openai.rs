//! OpenAI text-completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/completions";

/// Model used when the config does not override `engine`.
pub const DEFAULT_ENGINE: &str = "gpt-3.5-turbo-instruct";

/// Anything that can continue a prompt.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, Error>;
}

/// Fixed sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    /// Biases the model away from repeating itself.
    pub presence_penalty: f64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.9,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.6,
        }
    }
}

pub struct Client {
    api_key: String,
    engine: String,
    sampling: Sampling,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
}

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

impl Client {
    pub fn new(api_key: String, engine: Option<String>) -> Self {
        Self {
            api_key,
            engine: engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            sampling: Sampling::default(),
            http: reqwest::Client::new(),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    fn request<'a>(&'a self, prompt: &'a str, stop: &'a [String]) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.engine,
            prompt,
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
            stop,
        }
    }
}

#[async_trait]
impl Completer for Client {
    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, Error> {
        let request = self.request(prompt, stop);

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        first_choice(api_response)
    }
}

fn first_choice(response: ApiResponse) -> Result<String, Error> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.text.trim().to_string())
        .ok_or(Error::Empty)
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
    Timeout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
            Error::Timeout => write!(f, "Completion timed out"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_engine() {
        let client = Client::new("sk-test".to_string(), None);
        assert_eq!(client.engine(), DEFAULT_ENGINE);

        let client = Client::new("sk-test".to_string(), Some("davinci-002".to_string()));
        assert_eq!(client.engine(), "davinci-002");
    }

    #[test]
    fn test_request_body_carries_sampling() {
        let client = Client::new("sk-test".to_string(), Some("davinci-002".to_string()));
        let stop = vec!["Alice:".to_string(), "Bob:".to_string()];
        let body = serde_json::to_value(client.request("A bot\n\nBotty:", &stop)).unwrap();

        assert_eq!(body["model"], "davinci-002");
        assert_eq!(body["prompt"], "A bot\n\nBotty:");
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["stop"], json!(["Alice:", "Bob:"]));
        let presence = body["presence_penalty"].as_f64().unwrap();
        assert!((presence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_empty_stop_is_omitted() {
        let client = Client::new("sk-test".to_string(), None);
        let body = serde_json::to_value(client.request("x", &[])).unwrap();
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_first_choice_is_trimmed() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"choices": [{"text": "  hello there\n"}, {"text": "other"}]}"#).unwrap();
        assert_eq!(first_choice(response).unwrap(), "hello there");
    }

    #[test]
    fn test_no_choices_is_empty_error() {
        let response: ApiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_choice(response), Err(Error::Empty)));
    }
}
