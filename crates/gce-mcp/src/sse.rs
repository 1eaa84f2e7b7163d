//! HTTP + Server-Sent Events transport
//!
//! `GET /sse` opens a session. Its first event is `endpoint`, whose data is
//! the URL the client must POST JSON-RPC messages to
//! (`/messages?session_id=<uuid>`). Each POST is answered `202 Accepted`
//! and handled on its own task; the JSON-RPC response, if any, is pushed to
//! the session's stream as a `message` event.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::server::GceMcpServer;
use crate::{Error, Result};

/// Path that opens an event stream
pub const SSE_PATH: &str = "/sse";

/// Path clients POST messages to
pub const MESSAGES_PATH: &str = "/messages";

const SESSION_BUFFER: usize = 32;

/// Open sessions: session id to the sender feeding its event stream
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, mpsc::Sender<String>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its id and message receiver
    pub fn open(&self) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.lock().insert(id, tx);
        (id, rx)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn remove(&self, id: &Uuid) {
        self.lock().remove(id);
    }

    /// Queue a message on a session's stream.
    ///
    /// Returns false when the session is unknown or its stream has gone away;
    /// a gone session is removed.
    pub async fn deliver(&self, id: &Uuid, message: String) -> bool {
        let Some(sender) = self.lock().get(id).cloned() else {
            return false;
        };
        if sender.send(message).await.is_err() {
            tracing::debug!(session = %id, "Session stream closed");
            self.remove(id);
            return false;
        }
        true
    }

    /// Wait until the session's stream is dropped, then forget the session
    pub async fn remove_when_closed(&self, id: Uuid) {
        let Some(sender) = self.lock().get(&id).cloned() else {
            return;
        };
        sender.closed().await;
        self.remove(&id);
        tracing::info!(session = %id, "SSE session closed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, mpsc::Sender<String>>> {
        // A poisoned map is still a valid map
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared state of the SSE router
#[derive(Clone)]
pub struct SseState {
    pub server: Arc<GceMcpServer>,
    pub sessions: SessionRegistry,
}

impl SseState {
    pub fn new(server: Arc<GceMcpServer>) -> Self {
        Self {
            server,
            sessions: SessionRegistry::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageParams {
    pub session_id: Uuid,
}

/// Build the SSE router
pub fn router(state: SseState) -> Router {
    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGES_PATH, post(post_message))
        .with_state(state)
}

/// Bind `addr` and serve the SSE transport until the process exits
pub async fn serve(server: Arc<GceMcpServer>, addr: &str) -> Result<()> {
    if !server.is_initialized() {
        return Err(Error::NotInitialized);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(address = %local, "MCP server ready, listening for SSE connections");

    axum::serve(listener, router(SseState::new(server))).await?;
    Ok(())
}

/// Endpoint URL announced to a new session
pub fn endpoint_for(id: &Uuid) -> String {
    format!("{}?session_id={}", MESSAGES_PATH, id)
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.sessions.open();
    tracing::info!(session = %id, "SSE session opened");

    let sessions = state.sessions.clone();
    tokio::spawn(async move { sessions.remove_when_closed(id).await });

    let endpoint = Event::default().event("endpoint").data(endpoint_for(&id));
    let messages =
        ReceiverStream::new(rx).map(|message| Event::default().event("message").data(message));
    let stream = tokio_stream::once(endpoint)
        .chain(messages)
        .map(Ok::<Event, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<SseState>,
    Query(params): Query<MessageParams>,
    body: String,
) -> StatusCode {
    let id = params.session_id;
    if !state.sessions.contains(&id) {
        tracing::warn!(session = %id, "Message for unknown session");
        return StatusCode::NOT_FOUND;
    }

    tokio::spawn(async move {
        let response = match state.server.handle_message(&body).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(session = %id, error = %e, "Failed to handle message");
                GceMcpServer::internal_error(&e)
            }
        };
        if !response.is_empty() && !state.sessions.deliver(&id, response).await {
            tracing::warn!(session = %id, "Dropped response for closed session");
        }
    });

    StatusCode::ACCEPTED
}
