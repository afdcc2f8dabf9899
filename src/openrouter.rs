//! Language-model oracle over an OpenAI-compatible chat-completions API
//! (OpenRouter by default).

use crate::config::OracleSettings;
use crate::error::OracleError;
use crate::oracle::{Oracle, OracleRequest};
use crate::{debug_log, info_log};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const RULES: &str = "You are playing a number guessing game. The rules are:
1. Each player has a secret 4-digit number where all digits are unique (0-9)
2. Players take turns guessing each other's number
3. After each guess, the player learns:
   - How many digits are in the correct position (exact matches)
   - How many digits exist in the number but in wrong positions (partial matches)
4. Use the feedback from previous guesses to make intelligent guesses
5. Respond ONLY with a valid 4-digit number as your guess";

const GUIDANCE: &str = "Based on this feedback, make an intelligent guess. Stick to the following:
- All digits must be unique
- Only respond with a 4-digit number, with no repeated digits
- You can't guess the same number twice
- Don't guess a number that contradicts the feedback you got from the previous guesses
- Make guesses that give you the most information

The most important thing: only respond with a 4-digit number.";

const FIRST_QUESTION: &str = "What is your next guess?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// System prompt: the rules plus the oracle's own guesses so far.
#[must_use]
pub fn system_prompt(request: &OracleRequest) -> String {
    let mut prompt = format!("{RULES}\n\nYour previous guesses and their results:\n");
    if request.history.is_empty() {
        prompt.push_str("(none yet)\n");
    }
    for record in &request.history {
        prompt.push_str(&format!(
            "Your guess {}: {}\n",
            record.code(),
            record.feedback()
        ));
    }
    prompt.push('\n');
    prompt.push_str(GUIDANCE);
    prompt
}

/// Conversation sent for `request`; a retry replays the rejected answer and
/// the explanation.
#[must_use]
pub fn build_messages(request: &OracleRequest) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::new("system", system_prompt(request)),
        ChatMessage::new("user", FIRST_QUESTION),
    ];
    if let Some(retry) = &request.retry {
        messages.push(ChatMessage::new("assistant", retry.rejected.clone()));
        messages.push(ChatMessage::new(
            "user",
            format!(
                "{} Please make a different guess that doesn't contradict the previous feedback.",
                retry.explanation
            ),
        ));
    }
    messages
}

pub struct OpenRouterOracle {
    client: Client,
    settings: OracleSettings,
    api_key: String,
}

impl OpenRouterOracle {
    /// Build an oracle using the key from the configured environment variable.
    pub fn from_settings(settings: &OracleSettings) -> Result<Self, OracleError> {
        let api_key = settings.api_key().ok_or_else(|| {
            OracleError::NotConfigured(format!("environment variable {} is not set", settings.api_key_env))
        })?;
        Self::new(settings.clone(), api_key)
    }

    pub fn new(settings: OracleSettings, api_key: String) -> Result<Self, OracleError> {
        // The request timeout bounds every call, including a stalled retry.
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        info_log!(
            "OpenRouterOracle - model {} at {}",
            settings.model,
            settings.api_url
        );
        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.api_url.trim_end_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| OracleError::NotConfigured("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

fn transport_error(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout
    } else if let Some(status) = err.status() {
        OracleError::Status(status.as_u16())
    } else {
        OracleError::Transport(err.to_string())
    }
}

impl Oracle for OpenRouterOracle {
    fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: build_messages(request),
            temperature: self.settings.temperature,
        };
        debug_log!(
            "OpenRouterOracle::ask() - {} messages, retry={}",
            body.messages.len(),
            request.retry.is_some()
        );

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;

        let completion: ChatResponse = response.json().map_err(transport_error)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}
