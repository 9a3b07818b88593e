pub mod vapi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::CallDetail;

/// Values injected into the assistant's prompt for one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    pub variable_values: VariableValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableValues {
    #[serde(rename = "previousConversationHistory")]
    pub previous_conversation_history: String,
    #[serde(flatten)]
    pub profile: CaregiverProfile,
}

/// Optional intake answers the assistant can refer to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaregiverProfile {
    #[serde(rename = "motherAge", skip_serializing_if = "Option::is_none")]
    pub mother_age: Option<String>,
    #[serde(rename = "childAge", skip_serializing_if = "Option::is_none")]
    pub child_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_problems: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccination_history: Option<String>,
    #[serde(rename = "feedingConcerns", skip_serializing_if = "Option::is_none")]
    pub feeding_concerns: Option<String>,
}

impl AssistantOverrides {
    pub fn new(history: String, profile: CaregiverProfile) -> Self {
        Self {
            variable_values: VariableValues {
                previous_conversation_history: history,
                profile,
            },
        }
    }
}

#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Asks the provider to open a session. The raw response is returned
    /// because the id may not be assigned yet; see [`session_id_from`].
    async fn start_session(&self, overrides: &AssistantOverrides)
        -> anyhow::Result<serde_json::Value>;

    async fn stop_session(&self, session_id: &str) -> anyhow::Result<()>;

    async fn get_call_detail(&self, session_id: &str) -> anyhow::Result<CallDetail>;

    /// Drops anything kept for a session once its summary has run.
    fn release_session(&self, _session_id: &str) {}
}

/// Reads the session id from a start response, either `id` or `call.id`.
pub fn session_id_from(response: &serde_json::Value) -> Option<String> {
    response["id"]
        .as_str()
        .or_else(|| response["call"]["id"].as_str())
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

/// Reads the URL a client uses to join the call, `webCallUrl` or `call.webCallUrl`.
pub fn join_url_from(response: &serde_json::Value) -> Option<String> {
    response["webCallUrl"]
        .as_str()
        .or_else(|| response["call"]["webCallUrl"].as_str())
        .filter(|url| !url.is_empty())
        .map(|url| url.to_string())
}
