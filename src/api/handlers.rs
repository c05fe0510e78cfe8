//! HTTP endpoint handlers
//!
//! Each handler delivers one event to the worker and answers only after the
//! event's work has settled.

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response as HttpResponse,
    },
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use super::responses::{ApiResponse, ClickResponse, HealthResponse, NotificationClickRequest, StatusResponse};
use crate::{
    protocol::{ActionMessage, Request},
    services::{ClientEvent, ClientHub, ClientId, ClientType, NotificationRecord, NotificationSink},
    state::AppState,
    worker::NOTIFICATION_TAG,
};

/// Handle POST /sw/install - Re-run the install step
pub async fn install_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_event("install");
    match state.worker.install().await {
        Ok(()) => Ok(Json(ApiResponse::handled(
            format!("Installed {}", state.worker.cache_name()),
            state.worker.snapshot(),
        ))),
        Err(e) => {
            error!("Install failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /sw/activate - Re-run the activate step
pub async fn activate_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_event("activate");
    match state.worker.activate().await {
        Ok(()) => Ok(Json(ApiResponse::handled(
            format!("Activated {}", state.worker.cache_name()),
            state.worker.snapshot(),
        ))),
        Err(e) => {
            error!("Activate failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /sw/message - Deliver a message from a foreground window
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.record_event("message");

    let message = match serde_json::from_value::<ActionMessage>(body) {
        Ok(message) => message,
        Err(e) => {
            warn!("Ignoring message: {}", e);
            return Ok(Json(ApiResponse::ignored(e.to_string(), state.worker.snapshot())));
        }
    };
    let kind = message.kind();

    match state.worker.message(message).await {
        Ok(Some(snapshot)) => Ok(Json(ApiResponse::handled(format!("{} merged", kind), snapshot))),
        Ok(None) => Ok(Json(ApiResponse::ignored(
            format!("{} has no effect on the worker", kind),
            state.worker.snapshot(),
        ))),
        Err(e) => {
            error!("Failed to handle {}: {}", kind, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /sw/notificationclick - A notification button or body was clicked
pub async fn notification_click_handler(
    State(state): State<Arc<AppState>>,
    Json(click): Json<NotificationClickRequest>,
) -> Result<Json<ClickResponse>, StatusCode> {
    state.record_event("notificationclick");
    let tag = click.tag.as_deref().unwrap_or(NOTIFICATION_TAG);

    match state.worker.notification_click(click.action.as_deref(), tag).await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) => {
            error!("Notification click failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Page the window is showing
    #[serde(default)]
    pub url: Option<String>,
}

/// Removes the client from the hub when its event stream is dropped
struct ConnectionGuard {
    hub: Arc<ClientHub>,
    id: ClientId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}

fn to_sse(event: ClientEvent) -> Event {
    match event {
        ClientEvent::Message(message) => Event::default()
            .event("message")
            .json_data(&message)
            .unwrap_or_else(|_| Event::default().event("message").data(message.kind())),
        ClientEvent::Focus => Event::default().event("focus").data("focus"),
    }
}

/// Handle GET /sw/clients - Register a window and stream worker messages to it
pub async fn clients_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (info, rx) = state
        .clients
        .connect(ClientType::Window, query.url.unwrap_or_else(|| "/".to_string()));
    let guard = ConnectionGuard {
        hub: Arc::clone(&state.clients),
        id: info.id,
    };

    let hello = stream::once(async move {
        Ok::<Event, Infallible>(Event::default().event("connected").data(info.id.to_string()))
    });
    let events = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        Some((Ok::<Event, Infallible>(to_sse(event)), (rx, guard)))
    });

    Sse::new(hello.chain(events)).keep_alive(KeepAlive::default())
}

/// Handle GET /sw/notifications - Notifications currently displayed
pub async fn notifications_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NotificationRecord>>, StatusCode> {
    match state.notifications.displayed().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            error!("Failed to list notifications: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /sw/state - Mirrored timer state and worker status
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_event, last_event_time) = state.get_last_event();

    Json(StatusResponse {
        state: state.worker.snapshot(),
        phase: state.worker.phase(),
        mode: state.worker.mode(),
        cache_name: state.worker.cache_name().to_string(),
        scope: state.worker.scope().to_string(),
        clients: state.clients.len(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_event,
        last_event_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Resolve a request path against the app scope, never leaving it
pub fn request_url(scope: &Url, uri: &Uri) -> Result<Url, url::ParseError> {
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    scope.join(&format!("./{}", path_and_query.trim_start_matches('/')))
}

/// Fallback for every other route: a fetch event for the app's own assets
pub async fn fetch_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResponse {
    let url = match request_url(state.worker.scope(), &uri) {
        Ok(url) => url,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let mut request = Request::new(method.as_str(), url);
    request.headers = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    request.body = body.to_vec();

    match state.worker.fetch(&request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            info!("Passthrough {} {} failed: {}", request.method, request.url, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_stays_in_scope() {
        let scope = Url::parse("https://app.example/hypertrofia/").unwrap();

        let root = request_url(&scope, &Uri::from_static("/")).unwrap();
        assert_eq!(root.as_str(), "https://app.example/hypertrofia/");

        let page = request_url(&scope, &Uri::from_static("/index.html?v=2")).unwrap();
        assert_eq!(page.as_str(), "https://app.example/hypertrofia/index.html?v=2");

        let sneaky = request_url(&scope, &Uri::from_static("/https://evil.example/x")).unwrap();
        assert_eq!(sneaky.origin(), scope.origin());
    }
}
