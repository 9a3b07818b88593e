use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::errors::CallError;
use crate::models::{CallSession, CallState, ProviderEvent, SessionContext};
use crate::services::history::load_history;
use crate::services::voice::{AssistantOverrides, CaregiverProfile};
use crate::state::AppState;

fn session_context(headers: &HeaderMap) -> Result<SessionContext, CallError> {
    SessionContext::from_bearer(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
    )
}

// POST /api/call/start
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Prior conversation text; loaded from the backend when absent.
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub profile: CaregiverProfile,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub call_id: String,
    /// Room the browser joins to take part in the call.
    pub web_call_url: Option<String>,
}

pub async fn start_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<StartRequest>,
) -> Result<Json<StartResponse>, CallError> {
    let ctx = session_context(&headers)?;

    let history = match payload.history {
        Some(history) => history,
        None => load_history(state.backend.as_ref(), &ctx).await,
    };
    let overrides = AssistantOverrides::new(history, payload.profile);

    let started = state.calls.start(ctx, overrides).await?;
    Ok(Json(StartResponse {
        call_id: started.call_id,
        web_call_url: started.web_call_url,
    }))
}

// POST /api/call/stop
#[derive(Serialize)]
pub struct StopResponse {
    pub call_id: Option<String>,
    pub state: CallState,
}

pub async fn stop_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<StopResponse>), CallError> {
    session_context(&headers)?;

    // The summary runs in the background; failures there are only logged.
    let _ = state.calls.stop().await?;

    let session = state.calls.snapshot();
    Ok((
        StatusCode::ACCEPTED,
        Json(StopResponse {
            call_id: session.session_id,
            state: session.state,
        }),
    ))
}

// POST /api/call/events
pub async fn provider_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(event): Json<ProviderEvent>,
) -> Result<StatusCode, CallError> {
    session_context(&headers)?;
    state.calls.dispatch(event);
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/call/status
pub async fn call_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CallSession>, CallError> {
    session_context(&headers)?;
    Ok(Json(state.calls.snapshot()))
}

// POST /api/call/summary/retry
pub async fn retry_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, CallError> {
    session_context(&headers)?;
    state.calls.resubmit_summary().await?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/call/stream (SSE)
#[derive(Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}

pub async fn call_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, CallError> {
    // EventSource can't set headers
    SessionContext::new(query.token.unwrap_or_default())?;

    let snapshot = state.calls.snapshot();
    let rx = state.calls.subscribe();

    let initial = tokio_stream::once({
        let data = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("call_status"))
    });

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("call_event")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = initial.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}
