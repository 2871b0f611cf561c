//! Vendor client adapters: a single async operation that
//! translates vendor-neutral messages into each vendor's wire format and
//! returns the model's reply text, or `None` on any failure — never an
//! exception.

use serde_json::Value;

use crate::config::ProviderConfig;
use crate::types::Vendor;

/// A turn in a vendor-neutral conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

const MAX_TOKENS: u32 = 500;

/// Seam the executor calls through, so tests can script
/// vendor replies without opening a socket. `VendorClient` is the only
/// production implementation; `#[cfg(test)]` implementations live in
/// `runner.rs`'s test module.
pub trait VendorCaller: Send + Sync {
    fn call_boxed<'a>(
        &'a self,
        config: &'a ProviderConfig,
        messages: &'a [Message],
        model: &'a str,
        temperature: f64,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Option<String>> + Send + 'a>>;
}

impl VendorCaller for VendorClient {
    fn call_boxed<'a>(
        &'a self,
        config: &'a ProviderConfig,
        messages: &'a [Message],
        model: &'a str,
        temperature: f64,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(self.call(config, messages, model, temperature))
    }
}

/// Shared HTTP client used to call any of the five vendor APIs.
#[derive(Debug, Clone)]
pub struct VendorClient {
    client: reqwest::Client,
}

impl VendorClient {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    /// Calls `vendor` with `messages` and returns its reply text, or `None`
    /// on a missing API key, transport error, non-2xx response, or a
    /// response missing the expected text field. Never retries; exactly
    /// one attempt per call.
    pub async fn call(
        &self,
        config: &ProviderConfig,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> Option<String> {
        let api_key = config.api_key.as_ref()?;
        let outcome = match config.vendor {
            Vendor::OpenAi | Vendor::DeepSeek | Vendor::Xai => {
                self.call_openai_family(config, api_key, messages, model, temperature).await
            }
            Vendor::Claude => self.call_anthropic(config, api_key, messages, model, temperature).await,
            Vendor::Gemini => self.call_gemini(config, api_key, messages, model, temperature).await,
        };
        match outcome {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(vendor = %config.vendor, model, "vendor call failed: {e}");
                None
            }
        }
    }

    async fn call_openai_family(
        &self,
        config: &ProviderConfig,
        api_key: &str,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": openai_messages(messages),
            "temperature": temperature,
            "max_tokens": MAX_TOKENS,
        });

        let resp = self
            .client
            .post(&config.endpoint)
            .timeout(config.timeout)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("non-2xx status: {}", resp.status());
        }

        let parsed: Value = resp.json().await?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("response missing choices[0].message.content"))
    }

    async fn call_anthropic(
        &self,
        config: &ProviderConfig,
        api_key: &str,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "temperature": temperature,
            "messages": openai_messages(messages),
        });

        let resp = self
            .client
            .post(&config.endpoint)
            .timeout(config.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("non-2xx status: {}", resp.status());
        }

        let parsed: Value = resp.json().await?;
        parsed["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("response missing content[0].text"))
    }

    async fn call_gemini(
        &self,
        config: &ProviderConfig,
        api_key: &str,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:generateContent", config.endpoint, model);

        let body = serde_json::json!({
            "contents": gemini_contents(messages),
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": MAX_TOKENS,
            },
        });

        let resp = self
            .client
            .post(&url)
            .timeout(config.timeout)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("non-2xx status: {}", resp.status());
        }

        let parsed: Value = resp.json().await?;
        parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("response missing candidates[0].content.parts[0].text"))
    }
}

impl Default for VendorClient {
    fn default() -> Self {
        Self::new()
    }
}

fn openai_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": m.content })
        })
        .collect()
}

fn gemini_contents(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_messages_map_assistant_to_assistant_role() {
        let messages = [Message::user("hi"), Message::assistant("reply")];
        let mapped = openai_messages(&messages);
        assert_eq!(mapped[0]["role"], "user");
        assert_eq!(mapped[1]["role"], "assistant");
    }

    #[test]
    fn gemini_contents_map_assistant_to_model_role() {
        let messages = [Message::user("hi"), Message::assistant("reply")];
        let mapped = gemini_contents(&messages);
        assert_eq!(mapped[0]["role"], "user");
        assert_eq!(mapped[1]["role"], "model");
        assert_eq!(mapped[1]["parts"][0]["text"], "reply");
    }
}
