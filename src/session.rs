//! Server-side session driving the SSE push channel
//!
//! `McpSession::connect` hands out one `SseConnection` per GET. Each connection
//! is a stream that first announces the POST endpoint and then forwards every
//! notification broadcast on the session until the client goes away, the
//! session shuts down, or the broadcast channel closes.

use std::{
    convert::Infallible,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Instant,
};

use axum::response::sse::Event;
use futures_util::{stream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};
use tracing::{debug, info, warn};

use crate::mcp::rpc::JSONRPC_VERSION;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug)]
pub struct McpSession {
    endpoint: Arc<str>,
    events: broadcast::Sender<Arc<Notification>>,
    shutdown: watch::Sender<bool>,
    open: Arc<AtomicUsize>,
}

impl McpSession {
    pub fn new(endpoint: impl Into<Arc<str>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        Self {
            endpoint: endpoint.into(),
            events,
            shutdown,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connect(&self) -> SseConnection {
        let guard = ConnectionGuard::open(Arc::clone(&self.open));
        let closed = Arc::clone(&guard.closed);
        let state = PushState {
            endpoint: Some(Arc::clone(&self.endpoint)),
            events: self.events.subscribe(),
            shutdown: self.shutdown.subscribe(),
            _guard: guard,
        };

        let events = stream::unfold(state, next_event)
            .map(Ok::<Event, Infallible>)
            .boxed();

        SseConnection { events, closed }
    }

    /// Broadcasts a notification to every open connection, returning how many
    /// connections received it.
    pub fn notify(&self, method: impl Into<String>, params: Option<Value>) -> usize {
        let notification = Arc::new(Notification {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        });
        self.events.send(notification).unwrap_or(0)
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        info!(open = self.open_connections(), "session shutting down");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// One open push stream. Dropping it releases the connection.
pub struct SseConnection {
    events: stream::BoxStream<'static, Result<Event, Infallible>>,
    closed: Arc<AtomicBool>,
}

impl SseConnection {
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

impl Stream for SseConnection {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

struct PushState {
    endpoint: Option<Arc<str>>,
    events: broadcast::Receiver<Arc<Notification>>,
    shutdown: watch::Receiver<bool>,
    _guard: ConnectionGuard,
}

async fn next_event(mut state: PushState) -> Option<(Event, PushState)> {
    if let Some(endpoint) = state.endpoint.take() {
        let event = Event::default().event("endpoint").data(&*endpoint);
        return Some((event, state));
    }

    loop {
        if *state.shutdown.borrow_and_update() {
            debug!("push loop stopped by session shutdown");
            return None;
        }

        tokio::select! {
            changed = state.shutdown.changed() => {
                if changed.is_err() {
                    return None;
                }
            }
            received = state.events.recv() => match received {
                Ok(notification) => match serde_json::to_string(notification.as_ref()) {
                    Ok(data) => return Some((Event::default().event("message").data(data), state)),
                    Err(err) => warn!(error = %err, "dropping unserializable notification"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "sse subscriber lagged, skipping notifications");
                }
                Err(RecvError::Closed) => {
                    debug!("push loop stopped, event channel closed");
                    return None;
                }
            },
        }
    }
}

struct ConnectionGuard {
    open: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    opened_at: Instant,
}

impl ConnectionGuard {
    fn open(open: Arc<AtomicUsize>) -> Self {
        let count = open.fetch_add(1, Ordering::SeqCst) + 1;
        info!(open = count, "sse connection opened");
        Self {
            open,
            closed: Arc::new(AtomicBool::new(false)),
            opened_at: Instant::now(),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        let count = self.open.fetch_sub(1, Ordering::SeqCst) - 1;
        info!(
            open = count,
            lifetime_ms = self.opened_at.elapsed().as_millis(),
            "sse connection closed"
        );
    }
}
