use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{session_id_from, AssistantOverrides, VoiceProvider};
use crate::models::CallDetail;

pub struct VapiProvider {
    api_key: String,
    assistant_id: String,
    base_url: String,
    client: reqwest::Client,
    /// Live-call control endpoints by session id, learned from start responses.
    control_urls: Mutex<HashMap<String, String>>,
}

impl VapiProvider {
    pub fn new(api_key: String, assistant_id: String, base_url: String) -> Self {
        Self {
            api_key,
            assistant_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            control_urls: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VoiceProvider for VapiProvider {
    async fn start_session(
        &self,
        overrides: &AssistantOverrides,
    ) -> anyhow::Result<serde_json::Value> {
        let body = json!({
            "assistantId": self.assistant_id,
            "assistantOverrides": overrides,
        });

        let resp = self
            .client
            .post(format!("{}/call/web", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Vapi start")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Vapi start response")?;

        if !status.is_success() {
            anyhow::bail!("Vapi start error ({}): {}", status, data);
        }

        let control_url = data["monitor"]["controlUrl"]
            .as_str()
            .or_else(|| data["call"]["monitor"]["controlUrl"].as_str());
        if let (Some(id), Some(url)) = (session_id_from(&data), control_url) {
            if let Ok(mut urls) = self.control_urls.lock() {
                urls.insert(id, url.to_string());
            }
        }

        Ok(data)
    }

    async fn stop_session(&self, session_id: &str) -> anyhow::Result<()> {
        let control_url = self
            .control_urls
            .lock()
            .map_err(|_| anyhow::anyhow!("control url map poisoned"))?
            .remove(session_id)
            .ok_or_else(|| anyhow::anyhow!("no control url for call {session_id}"))?;

        self.client
            .post(&control_url)
            .json(&json!({ "type": "end-call" }))
            .send()
            .await
            .context("failed to send Vapi end-call")?
            .error_for_status()
            .context("Vapi end-call returned error")?;

        Ok(())
    }

    async fn get_call_detail(&self, session_id: &str) -> anyhow::Result<CallDetail> {
        let resp = self
            .client
            .get(format!("{}/call/{}", self.base_url, session_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to call Vapi call details")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vapi call details error ({}): {}", status, text);
        }

        resp.json()
            .await
            .context("failed to parse Vapi call details")
    }

    fn release_session(&self, session_id: &str) {
        if let Ok(mut urls) = self.control_urls.lock() {
            urls.remove(session_id);
        }
    }
}
