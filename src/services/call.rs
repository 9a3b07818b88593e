//! Drives one voice-assistant call from start through the post-call summary.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::CallTiming;
use crate::errors::CallError;
use crate::models::{
    CallEvent, CallSession, CallState, PipelineReport, PipelineStep, ProviderEvent,
    SessionContext, StartedCall,
};
use crate::services::backend::HealthBackend;
use crate::services::pipeline::SummaryPipeline;
use crate::services::symptoms::SymptomExtractor;
use crate::services::voice::{join_url_from, session_id_from, AssistantOverrides, VoiceProvider};

#[derive(Default)]
struct Inner {
    session: CallSession,
    /// Kept after the call ends so the summary can be resubmitted.
    context: Option<SessionContext>,
    /// The provider reported `call-end` before a session id arrived.
    ended_early: bool,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Owns at most one call at a time. Cloning shares the same call.
#[derive(Clone)]
pub struct CallController {
    voice: Arc<dyn VoiceProvider>,
    pipeline: SummaryPipeline,
    timing: CallTiming,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<CallEvent>,
}

impl CallController {
    pub fn new(
        voice: Arc<dyn VoiceProvider>,
        backend: Arc<dyn HealthBackend>,
        timing: CallTiming,
    ) -> Self {
        Self::with_extractor(voice, backend, Arc::new(SymptomExtractor::default()), timing)
    }

    pub fn with_extractor(
        voice: Arc<dyn VoiceProvider>,
        backend: Arc<dyn HealthBackend>,
        extractor: Arc<SymptomExtractor>,
        timing: CallTiming,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            pipeline: SummaryPipeline::new(Arc::clone(&voice), backend, extractor, timing),
            voice,
            timing,
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    pub fn snapshot(&self) -> CallSession {
        lock_inner(&self.inner).session.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.events.subscribe()
    }

    /// Starts a call and returns it once the provider assigns a session id.
    /// If the provider reports `call-end` while the call is still starting,
    /// the summary pipeline is scheduled as soon as the id arrives.
    pub async fn start(
        &self,
        ctx: SessionContext,
        overrides: AssistantOverrides,
    ) -> Result<StartedCall, CallError> {
        {
            let mut inner = lock_inner(&self.inner);
            if !inner.session.state.can_start() {
                return Err(CallError::InvalidState {
                    action: "start",
                    state: inner.session.state,
                });
            }
            inner.session = CallSession {
                state: CallState::Starting,
                ..Default::default()
            };
            inner.context = None;
            inner.ended_early = false;
        }
        self.publish_state(None, CallState::Starting);

        match self.wait_for_session(&overrides).await {
            Ok(started) => {
                let ended_early = {
                    let mut inner = lock_inner(&self.inner);
                    inner.session.session_id = Some(started.call_id.clone());
                    inner.session.web_call_url = started.web_call_url.clone();
                    inner.session.state = CallState::Active;
                    inner.context = Some(ctx);
                    std::mem::take(&mut inner.ended_early)
                };
                tracing::info!(call_id = %started.call_id, "assistant call started");
                self.publish_state(Some(started.call_id.clone()), CallState::Active);

                if ended_early {
                    tracing::info!(call_id = %started.call_id, "call ended before setup finished");
                    if let Ok((id, ctx)) = self.begin_stopping("end call") {
                        self.schedule_summary(id, ctx);
                    }
                }
                Ok(started)
            }
            Err(e) => {
                {
                    let mut inner = lock_inner(&self.inner);
                    inner.session.state = CallState::Idle;
                    inner.ended_early = false;
                }
                tracing::error!(error = %e, "call setup failed");
                self.publish_state(None, CallState::Idle);
                Err(e)
            }
        }
    }

    async fn wait_for_session(&self, overrides: &AssistantOverrides) -> Result<StartedCall, CallError> {
        let attempts = self.timing.start_max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.voice.start_session(overrides).await {
                Ok(resp) => match session_id_from(&resp) {
                    Some(call_id) => {
                        return Ok(StartedCall {
                            call_id,
                            web_call_url: join_url_from(&resp),
                        })
                    }
                    None => tracing::warn!(attempt, "waiting for assistant session id"),
                },
                Err(e) => tracing::warn!(attempt, error = %e, "assistant start attempt failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(self.timing.start_retry_delay).await;
            }
        }
        Err(CallError::SessionStartFailure { attempts })
    }

    /// Ends the active call and schedules the summary pipeline. The returned
    /// handle resolves once every post-call step has been attempted.
    pub async fn stop(&self) -> Result<JoinHandle<PipelineReport>, CallError> {
        let (id, ctx) = self.begin_stopping("stop")?;

        if let Err(e) = self.voice.stop_session(&id).await {
            tracing::warn!(call_id = %id, error = %e, "provider stop failed");
        }

        Ok(self.schedule_summary(id, ctx))
    }

    /// Applies one SDK event. A `call-end` during an active call schedules
    /// the summary pipeline just like [`CallController::stop`].
    pub fn dispatch(&self, event: ProviderEvent) -> Option<JoinHandle<PipelineReport>> {
        match event {
            ProviderEvent::CallStart => {
                let call_id = {
                    let mut inner = lock_inner(&self.inner);
                    inner.session.connected = true;
                    inner.session.session_id.clone()
                };
                self.publish(CallEvent::Connected { call_id });
            }
            ProviderEvent::CallEnd => {
                let state = {
                    let mut inner = lock_inner(&self.inner);
                    inner.session.connected = false;
                    inner.session.assistant_speaking = false;
                    if inner.session.state == CallState::Starting {
                        inner.ended_early = true;
                    }
                    inner.session.state
                };
                match state {
                    CallState::Active => match self.begin_stopping("end call") {
                        Ok((id, ctx)) => {
                            tracing::info!(call_id = %id, "call ended by provider");
                            return Some(self.schedule_summary(id, ctx));
                        }
                        Err(e) => tracing::debug!(error = %e, "ignoring call-end"),
                    },
                    CallState::Starting => {
                        tracing::info!("call ended while starting, summary deferred");
                    }
                    _ => tracing::debug!(state = state.as_str(), "ignoring call-end"),
                }
            }
            ProviderEvent::SpeechStart | ProviderEvent::SpeechEnd => {
                let speaking = event == ProviderEvent::SpeechStart;
                lock_inner(&self.inner).session.assistant_speaking = speaking;
                self.publish(CallEvent::Speaking { speaking });
            }
            ProviderEvent::VolumeLevel { level } => {
                let level = if level.is_finite() {
                    level.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                lock_inner(&self.inner).session.volume_level = level;
                self.publish(CallEvent::Volume { level });
            }
        }
        None
    }

    /// Stores the last fetched call record's summary again.
    pub async fn resubmit_summary(&self) -> Result<(), CallError> {
        let (call_id, ctx, detail) = {
            let inner = lock_inner(&self.inner);
            let report = inner.session.last_report.as_ref();
            match (
                report.and_then(|r| r.detail.clone().map(|d| (r.call_id.clone(), d))),
                inner.context.clone(),
            ) {
                (Some((call_id, detail)), Some(ctx)) => (call_id, ctx, detail),
                _ => return Err(CallError::NoSummaryToRetry),
            }
        };

        self.pipeline.resubmit(&ctx, &call_id, &detail).await?;
        tracing::info!(call_id = %call_id, "summary resubmitted");

        let mut inner = lock_inner(&self.inner);
        if let Some(report) = inner.session.last_report.as_mut() {
            if report.call_id == call_id {
                report.summary_stored = true;
                report.failures.retain(|f| f.step != PipelineStep::SummarySubmit);
            }
        }
        Ok(())
    }

    fn begin_stopping(&self, action: &'static str) -> Result<(String, SessionContext), CallError> {
        let mut inner = lock_inner(&self.inner);
        let state = inner.session.state;
        match (state, inner.session.session_id.clone(), inner.context.clone()) {
            (CallState::Active, Some(id), Some(ctx)) => {
                inner.session.state = CallState::Stopping;
                drop(inner);
                self.publish_state(Some(id.clone()), CallState::Stopping);
                Ok((id, ctx))
            }
            _ => Err(CallError::InvalidState { action, state }),
        }
    }

    fn schedule_summary(&self, id: String, ctx: SessionContext) -> JoinHandle<PipelineReport> {
        let pipeline = self.pipeline.clone();
        let voice = Arc::clone(&self.voice);
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();

        tokio::spawn(async move {
            let report = pipeline.run(&ctx, &id).await;
            voice.release_session(&id);
            {
                let mut guard = lock_inner(&inner);
                guard.session.state = CallState::Ended;
                if let Some(detail) = &report.detail {
                    guard.session.started_at = detail.started_at;
                    guard.session.ended_at = detail.ended_at;
                }
                guard.session.last_report = Some(report.clone());
            }
            tracing::info!(call_id = %id, failures = report.failures.len(), "call summary finished");

            let _ = events.send(CallEvent::StateChanged {
                call_id: Some(id.clone()),
                state: CallState::Ended,
            });
            let _ = events.send(CallEvent::PipelineFinished {
                call_id: id,
                failures: report.failures.clone(),
            });
            report
        })
    }

    fn publish_state(&self, call_id: Option<String>, state: CallState) {
        tracing::debug!(call_id = ?call_id, state = state.as_str(), "call state changed");
        self.publish(CallEvent::StateChanged { call_id, state });
    }

    fn publish(&self, event: CallEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
