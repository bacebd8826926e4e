// Gemini generative-language API client

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::GeminiConfig;
use crate::log_debug;

/// Seam between the session controller and the remote completion endpoint.
///
/// `Ok(None)` means the endpoint answered with a decodable body that carried
/// no candidate text. Transport failures, non-2xx statuses and undecodable
/// bodies all fold into `Err`.
#[async_trait]
pub trait CompletionApi: Send + Sync {
	/// One completion attempt for a single combined prompt. No retry,
	/// no timeout, no streaming.
	async fn complete(&self, prompt: &str) -> Result<Option<String>>;
}

/// Stateless HTTP wrapper around the generateContent endpoint
pub struct GeminiClient {
	config: GeminiConfig,
	client: Client,
}

impl GeminiClient {
	pub fn new(config: GeminiConfig) -> Self {
		Self {
			config,
			client: Client::new(),
		}
	}

	// The key rides in the query string, so the URL must never be logged
	fn endpoint(&self) -> Result<String> {
		let api_key = self.config.api_key.as_deref().ok_or_else(|| {
			anyhow::anyhow!("Gemini API key not found in config or GEMINI_API_KEY environment")
		})?;

		Ok(format!(
			"{}/models/{}:generateContent?key={}",
			self.config.base_url.trim_end_matches('/'),
			self.config.model,
			api_key
		))
	}
}

/// Build the request body. Field names are fixed by the remote contract.
pub fn build_request_body(prompt: &str) -> Value {
	serde_json::json!({
		"contents": [
			{
				"parts": [
					{ "text": prompt }
				]
			}
		]
	})
}

/// Pull the first candidate's first text part out of a decoded response
pub fn extract_candidate_text(response: &Value) -> Option<String> {
	response
		.get("candidates")
		.and_then(|candidates| candidates.get(0))
		.and_then(|candidate| candidate.get("content"))
		.and_then(|content| content.get("parts"))
		.and_then(|parts| parts.get(0))
		.and_then(|part| part.get("text"))
		.and_then(|text| text.as_str())
		.map(|text| text.to_string())
}

#[async_trait]
impl CompletionApi for GeminiClient {
	async fn complete(&self, prompt: &str) -> Result<Option<String>> {
		let url = self.endpoint()?;
		let request_body = build_request_body(prompt);

		log_debug!("Gemini request: {}", request_body);

		let response = self
			.client
			.post(&url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		let status = response.status();
		let response_text = response.text().await?;

		let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
			anyhow::anyhow!(
				"Failed to parse response JSON: {}. Response: {}",
				e,
				response_text
			)
		})?;

		if !status.is_success() {
			let error_msg = response_json
				.get("error")
				.and_then(|error| error.get("message"))
				.and_then(|message| message.as_str())
				.unwrap_or("Unknown API error");

			return Err(anyhow::anyhow!(
				"Gemini API error ({}): {}",
				status,
				error_msg
			));
		}

		log_debug!("Gemini response: {}", response_json);

		Ok(extract_candidate_text(&response_json))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_request_body_shape() {
		let body = build_request_body("hello");
		assert_eq!(
			body,
			serde_json::json!({
				"contents": [ { "parts": [ { "text": "hello" } ] } ]
			})
		);
	}

	#[test]
	fn test_extract_candidate_text() {
		let response = serde_json::json!({
			"candidates": [
				{
					"content": {
						"parts": [
							{ "text": "Plot A is 25 lakh." },
							{ "text": "ignored second part" }
						]
					}
				}
			]
		});
		assert_eq!(
			extract_candidate_text(&response),
			Some("Plot A is 25 lakh.".to_string())
		);
	}

	#[test]
	fn test_extract_handles_missing_path() {
		assert_eq!(extract_candidate_text(&serde_json::json!({})), None);
		assert_eq!(
			extract_candidate_text(&serde_json::json!({ "candidates": [] })),
			None
		);
		assert_eq!(
			extract_candidate_text(&serde_json::json!({
				"candidates": [ { "content": { "parts": [] } } ]
			})),
			None
		);
		assert_eq!(
			extract_candidate_text(&serde_json::json!({
				"candidates": [ { "content": { "parts": [ { "text": 42 } ] } } ]
			})),
			None
		);
	}

	#[test]
	fn test_endpoint_templating() {
		let client = GeminiClient::new(GeminiConfig {
			api_key: Some("test-key".to_string()),
			model: "gemini-1.5-flash".to_string(),
			base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
		});

		let url = client.endpoint().unwrap();
		assert_eq!(
			url,
			"https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=test-key"
		);
	}

	#[test]
	fn test_endpoint_requires_api_key() {
		let client = GeminiClient::new(GeminiConfig::default());
		assert!(client.endpoint().is_err());
	}
}
