//! # Voice WebSocket Handler
//!
//! Duplex connection for a live interview. Clients connect to `/ws/voice/{session_id}`
//! once the session has been started over HTTP.
//!
//! ## WebSocket Protocol:
//! 1. **Connection**: the session must exist and be active, otherwise the socket is
//!    closed with code 4004 (not found) or 4003 (not active)
//! 2. **Acknowledgement**: the server sends a `connection` event
//! 3. **Turns**: the client sends `audio_chunk` or `text_message` JSON frames and receives
//!    `status`, `transcription`, `text_response` and `audio_response` events in order
//! 4. **Keepalive**: JSON `ping` is answered with `pong`; transport pings run every 30s
//!
//! ## Actor Model:
//! The actor only owns the socket. Each connection gets a worker task
//! ([`InterviewOrchestrator::serve`]) fed through an unbounded channel, so a slow turn
//! never blocks frame handling and events of one connection are processed in order.

use crate::error::AppError;
use crate::state::AppState;
use crate::voice::events::{ClientEvent, ErrorCode, ServerEvent};
use crate::voice::orchestrator::InterviewOrchestrator;
use crate::voice::registry::{ConnectionClosed, ConnectionRegistry, EventSink};

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

const CLOSE_SESSION_NOT_FOUND: u16 = 4004;
const CLOSE_SESSION_NOT_ACTIVE: u16 = 4003;

/// Server event queued for delivery on the socket.
#[derive(Message)]
#[rtype(result = "()")]
struct Outbound(ServerEvent);

/// Sink that forwards events to the connection actor's mailbox.
struct ActorSink {
    addr: Addr<VoiceWebSocket>,
}

#[async_trait]
impl EventSink for ActorSink {
    async fn send(&self, event: ServerEvent) -> Result<(), ConnectionClosed> {
        self.addr.send(Outbound(event)).await.map_err(|_| ConnectionClosed)
    }
}

/// Close frame for a connection refused at upgrade time.
fn rejection_reason(err: &AppError) -> ws::CloseReason {
    let (code, description) = match err {
        AppError::NotFound(_) => (CLOSE_SESSION_NOT_FOUND, "Session not found"),
        _ => (CLOSE_SESSION_NOT_ACTIVE, "Session not active"),
    };
    ws::CloseReason {
        code: ws::CloseCode::Other(code),
        description: Some(description.to_string()),
    }
}

pub struct VoiceWebSocket {
    session_id: String,
    orchestrator: Arc<InterviewOrchestrator>,
    connections: Arc<ConnectionRegistry>,

    /// Set when the session failed authorization; the socket closes on start
    rejection: Option<ws::CloseReason>,

    connection_id: Option<Uuid>,
    /// Inbound half of the worker channel. Dropping it ends the worker.
    events: Option<mpsc::UnboundedSender<ClientEvent>>,

    last_heartbeat: Instant,
}

impl VoiceWebSocket {
    fn new(session_id: String, state: &AppState, rejection: Option<ws::CloseReason>) -> Self {
        Self {
            session_id,
            orchestrator: state.orchestrator.clone(),
            connections: state.connections.clone(),
            rejection,
            connection_id: None,
            events: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_event(&self, ctx: &mut ws::WebsocketContext<Self>, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => ctx.text(json),
            Err(e) => error!(
                session_id = %self.session_id,
                error = %e,
                "Failed to encode server event"
            ),
        }
    }

    fn forward(&self, event: ClientEvent) {
        let delivered = self
            .events
            .as_ref()
            .is_some_and(|events| events.send(event).is_ok());
        if !delivered {
            warn!(session_id = %self.session_id, "Voice worker is gone, dropping client event");
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    session_id = %act.session_id,
                    "WebSocket heartbeat timeout, closing connection"
                );
                ctx.stop();
            } else {
                ctx.ping(b"");
            }
        });
    }
}

impl Actor for VoiceWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(reason) = self.rejection.take() {
            info!(
                session_id = %self.session_id,
                reason = ?reason.description,
                "Rejecting voice connection"
            );
            ctx.close(Some(reason));
            ctx.stop();
            return;
        }

        let sink: Arc<dyn EventSink> = Arc::new(ActorSink { addr: ctx.address() });
        let connection_id = self.orchestrator.register_connection(&self.session_id, sink.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        self.connection_id = Some(connection_id);
        self.events = Some(tx);

        let orchestrator = self.orchestrator.clone();
        let session_id = self.session_id.clone();
        actix::spawn(async move {
            orchestrator.serve(session_id, connection_id, rx, sink).await;
        });

        info!(session_id = %self.session_id, %connection_id, "Voice connection started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.events = None;
        if let Some(connection_id) = self.connection_id.take() {
            self.connections.deregister(&self.session_id, connection_id);
            info!(session_id = %self.session_id, %connection_id, "Voice connection stopped");
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for VoiceWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match ClientEvent::parse(&text) {
                    Ok(event) => self.forward(event),
                    Err(err) => {
                        debug!(session_id = %self.session_id, error = %err, "Invalid JSON frame");
                        let event = ServerEvent::error(
                            ErrorCode::InvalidJson,
                            format!("Invalid JSON: {}", err),
                        );
                        self.send_event(ctx, &event);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                let event = ServerEvent::error(
                    ErrorCode::UnsupportedFrame,
                    "Binary frames are not supported, send JSON text frames",
                );
                self.send_event(ctx, &event);
            }
            Ok(ws::Message::Ping(data)) => {
                ctx.pong(&data);
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                info!(session_id = %self.session_id, ?reason, "WebSocket closed by client");
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                warn!("Received unexpected continuation frame");
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                error!(session_id = %self.session_id, error = %err, "WebSocket protocol error");
                ctx.stop();
            }
        }
    }
}

impl Handler<Outbound> for VoiceWebSocket {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        self.send_event(ctx, &msg.0);
    }
}

/// WebSocket endpoint handler.
///
/// ## Endpoint: `GET /ws/voice/{session_id}`
///
/// The upgrade always succeeds; an unknown or inactive session is refused with a
/// close frame so the client can read the reason.
pub async fn voice_websocket(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let session_id = path.into_inner();
    info!(
        session_id = %session_id,
        peer = ?req.connection_info().peer_addr(),
        "New voice connection request"
    );

    let rejection = state
        .orchestrator
        .authorize(&session_id)
        .err()
        .map(|err| rejection_reason(&err));

    ws::start(VoiceWebSocket::new(session_id, &state, rejection), &req, stream)
}
