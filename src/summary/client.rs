use crate::config::SummaryConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const TIMEOUT_SECS: u64 = 60;
const MAX_TOKENS: u32 = 600;
const TEMPERATURE: f32 = 0.2;

/// Tried in order when no preferred model is configured, or after it fails
const CANDIDATE_MODELS: &[&str] = &["gpt-5", "gpt-5-mini", "gpt-4o-mini"];

const SYSTEM_PROMPT: &str = "You are a medical scribe. Produce a concise, plain-language summary \
                             of a patient's health history based on provided records. Use short \
                             paragraphs and bullet points. Avoid PHI leakage and avoid \
                             speculation; if uncertain, say so.";

/// OpenAI-compatible chat-completions client for the summarization step
pub struct SummaryClient {
    api_key: Option<String>,
    api_url: String,
    preferred_model: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl SummaryClient {
    pub fn new(config: &SummaryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        if config.api_key.is_some() {
            info!("Summarization API client initialized");
        } else {
            info!("No summarization API key configured; placeholder summaries only");
        }

        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            preferred_model: config.model.clone(),
            client,
        }
    }

    /// Generate a summary, walking the candidate model list until one answers
    ///
    /// Returns the content and the model that produced it.
    pub async fn generate(&self, prompt: &str) -> Result<(String, String)> {
        let api_key = self
            .api_key
            .as_deref()
            .context("no summarization API key configured")?;

        let mut last_error = None;

        for model in self.candidate_models() {
            match self.try_model(api_key, model, prompt).await {
                Ok(content) => return Ok((content, model.to_string())),
                Err(e) => {
                    warn!("Summary model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => anyhow!("all candidate models failed, last error: {e}"),
            None => anyhow!("no candidate models configured"),
        })
    }

    fn candidate_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::new();
        if let Some(preferred) = self.preferred_model.as_deref() {
            models.push(preferred);
        }
        for model in CANDIDATE_MODELS {
            if self.preferred_model.as_deref() != Some(*model) {
                models.push(model);
            }
        }
        models
    }

    async fn try_model(&self, api_key: &str, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("summarization request failed")?
            .error_for_status()
            .context("summarization API returned an error status")?;

        let body: ChatResponse = response
            .json()
            .await
            .context("failed to decode summarization response")?;

        let content = body
            .choices
            .into_iter()
            .next()
            .context("summarization response had no choices")?
            .message
            .content
            .trim()
            .to_string();

        Ok(content)
    }
}
