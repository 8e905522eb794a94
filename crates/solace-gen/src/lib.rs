//! HTTP implementation of the generation-provider boundary.
//!
//! Talks to a messages-style completion endpoint: one user message in,
//! concatenated text blocks out. Credentials and the request timeout live
//! here; the engine never sees transport concerns.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use solace_core::provider::{GenerationProvider, ProviderError};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the generation endpoint, deserialised from the
/// server's `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
  pub endpoint:   String,
  pub api_key:    String,
  pub model:      String,
  #[serde(default = "default_max_tokens")]
  pub max_tokens: u32,
  /// Transport-level timeout; the engine applies its own overall bound
  /// on top.
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,
}

fn default_max_tokens() -> u32 { 1024 }

fn default_timeout_secs() -> u64 { 30 }

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerationRequest<'a> {
  model:      &'a str,
  max_tokens: u32,
  messages:   [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
  content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
  #[serde(default)]
  text: String,
}

// ─── Provider ────────────────────────────────────────────────────────────────

pub struct HttpGenerationProvider {
  client: reqwest::Client,
  config: GenerationConfig,
}

impl HttpGenerationProvider {
  pub fn new(config: GenerationConfig) -> Result<Self, ProviderError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .build()
      .map_err(|e| ProviderError::Request(e.to_string()))?;
    Ok(Self { client, config })
  }
}

impl GenerationProvider for HttpGenerationProvider {
  async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
    let request = GenerationRequest {
      model:      &self.config.model,
      max_tokens: self.config.max_tokens,
      messages:   [Message { role: "user", content: prompt }],
    };

    let response = self
      .client
      .post(&self.config.endpoint)
      .header("x-api-key", &self.config.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          ProviderError::Timeout
        } else {
          ProviderError::Request(e.to_string())
        }
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(ProviderError::Request(format!(
        "provider returned {status}"
      )));
    }

    let body: GenerationResponse = response
      .json()
      .await
      .map_err(|e| ProviderError::Request(e.to_string()))?;

    tracing::debug!(blocks = body.content.len(), "generation response received");
    Ok(
      body
        .content
        .into_iter()
        .map(|block| block.text)
        .collect::<Vec<_>>()
        .concat(),
    )
  }
}

// ─── Disabled provider ───────────────────────────────────────────────────────

/// Stand-in when no generation endpoint is configured. Every call fails,
/// so the search pipeline degrades to its lower tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProvider;

impl GenerationProvider for DisabledProvider {
  async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
    Err(ProviderError::Request("generation is not configured".into()))
  }
}
