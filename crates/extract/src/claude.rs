//! Minimal Anthropic Messages API client, tool-use forced so the response
//! is a single schema-validated JSON object. Mirrors the shape of a
//! `Claude::new(key, model).extract::<T>(system, user)` call without
//! depending on a provider SDK crate.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ExtractError;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_TOKENS: u32 = 4096;

pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Calls the model with `system`/`user` prompts, forcing a single
    /// tool-use turn whose `input` is validated against `T`'s JSON schema.
    pub async fn extract<T>(&self, system: &str, user: &str) -> Result<T, ExtractError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = schema_for!(T);
        let input_schema = serde_json::to_value(&schema.schema)
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": [{ "role": "user", "content": user }],
            "tools": [{
                "name": "emit_result",
                "description": "Emit the structured extraction result.",
                "input_schema": input_schema,
            }],
            "tool_choice": { "type": "tool", "name": "emit_result" },
        });

        let resp = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Network(format!("{status}: {text}")));
        }

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        let tool_input = parsed["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b.get("type").and_then(Value::as_str) == Some("tool_use"))
            })
            .and_then(|block| block.get("input"))
            .ok_or_else(|| ExtractError::Malformed("no tool_use block in response".into()))?;

        serde_json::from_value(tool_input.clone())
            .map_err(|e| ExtractError::SchemaMismatch(e.to_string()))
    }
}
