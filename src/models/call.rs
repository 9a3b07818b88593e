use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CallDetail, HealthAlerts, SymptomObservation};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    #[default]
    Idle,
    Starting,
    Active,
    Stopping,
    Ended,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Starting => "starting",
            CallState::Active => "active",
            CallState::Stopping => "stopping",
            CallState::Ended => "ended",
        }
    }

    /// A new call may only begin once the previous one is fully wound down.
    pub fn can_start(&self) -> bool {
        matches!(self, CallState::Idle | CallState::Ended)
    }
}

/// Lifecycle events emitted by the voice SDK, forwarded by the UI shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProviderEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    VolumeLevel { level: f32 },
}

/// Changes published to subscribers of the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    StateChanged {
        call_id: Option<String>,
        state: CallState,
    },
    Connected {
        call_id: Option<String>,
    },
    Speaking {
        speaking: bool,
    },
    Volume {
        level: f32,
    },
    PipelineFinished {
        call_id: String,
        failures: Vec<StepFailure>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    DetailFetch,
    SummarySubmit,
    AnalysisSubmit,
    AlertCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepFailure {
    pub step: PipelineStep,
    pub message: String,
}

/// Outcome of one post-call summary run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineReport {
    pub call_id: String,
    pub detail: Option<CallDetail>,
    pub summary_stored: bool,
    pub symptoms: Option<Vec<SymptomObservation>>,
    pub symptoms_submitted: bool,
    pub alerts: Option<HealthAlerts>,
    pub failures: Vec<StepFailure>,
}

impl PipelineReport {
    pub fn new(call_id: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            detail: None,
            summary_stored: false,
            symptoms: None,
            symptoms_submitted: false,
            alerts: None,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self, step: PipelineStep) -> bool {
        self.failures.iter().any(|f| f.step == step)
    }
}

/// A call the provider has accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartedCall {
    pub call_id: String,
    /// Where the client joins the call; absent for providers that dial out.
    pub web_call_url: Option<String>,
}

/// Snapshot of the controller's single call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallSession {
    pub session_id: Option<String>,
    pub web_call_url: Option<String>,
    pub state: CallState,
    pub connected: bool,
    pub assistant_speaking: bool,
    pub volume_level: f32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_report: Option<PipelineReport>,
}
