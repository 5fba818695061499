//! Per-connection feed socket.
//!
//! Keeps WebSocket framing and heartbeats at the edge while the domain
//! [`FeedSession`] owns the feeds and the change subscription. One task
//! drains heartbeats, client frames and change events, so the feeds are
//! only mutated from here. The public contract pings every 5s and considers
//! a connection idle after 10s without client traffic. Tests shorten these
//! intervals. A socket closes when its account's email changes, since the
//! inbox it holds belongs to the old address.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::{AdminSession, ChangeEvent, FeedAction, FeedSession, FeedUpdate, UserId};
use crate::inbound::ws::messages::{
    ClientFrame, ErrorFrame, SnapshotFrame, UnreadCounts, UpdateFrame,
};
use crate::inbound::ws::state::WsState;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_feed_session(
    state: WsState,
    admin: AdminSession,
    session: Session,
    stream: MessageStream,
) {
    let feed = FeedSession::open(
        state.feeds.as_ref(),
        state.feed_commands.clone(),
        admin.email().clone(),
    )
    .await;
    FeedSocket {
        feed,
        user_id: admin.user_id().clone(),
    }
    .run(session, stream)
    .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    AccountChanged,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

enum Event {
    Heartbeat,
    Client(Option<Result<Message, ProtocolError>>),
    Change(Option<ChangeEvent>),
}

struct FeedSocket {
    feed: FeedSession,
    user_id: UserId,
}

impl FeedSocket {
    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let snapshot = SnapshotFrame {
            notifications: self.feed.notifications(),
            inbox: self.feed.inbox(),
        };
        if let Err(error) = send_json(&mut session, &snapshot).await {
            warn!(error = %error, "failed to send feed snapshot");
            self.feed.close();
            return;
        }

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let mut changes_open = true;

        loop {
            let event = tokio::select! {
                _ = heartbeat.tick() => Event::Heartbeat,
                message = stream.recv() => Event::Client(message),
                change = self.feed.next_change(), if changes_open => Event::Change(change),
            };

            let result = match event {
                Event::Heartbeat => handle_heartbeat_tick(&mut session, &last_heartbeat).await,
                Event::Client(message) => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
                Event::Change(Some(change)) => self.handle_change(&mut session, change).await,
                Event::Change(None) => {
                    info!("change stream ended; serving client actions only");
                    changes_open = false;
                    Ok(())
                }
            };

            if let Err(error) = result {
                log_shutdown_reason(&error);
                self.feed.close();
                close_session_if_needed(session, close_action_for(&error)).await;
                return;
            }
        }
    }

    async fn handle_stream_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(error = %error, "Rejected malformed WebSocket payload");
                return Err(SessionError::InvalidPayload);
            }
        };

        let action = FeedAction::from(frame);
        match self.feed.perform(action).await {
            Ok(Some(update)) => self.send_update(session, update).await,
            Ok(None) => {
                debug!(?action, "feed action changed nothing locally");
                Ok(())
            }
            Err(error) => {
                warn!(?action, error = %error, "feed action failed");
                send_json(session, &ErrorFrame::from(&error)).await
            }
        }
        .map_err(SessionError::Network)
    }

    async fn handle_change(
        &mut self,
        session: &mut Session,
        change: ChangeEvent,
    ) -> Result<(), SessionError> {
        if let ChangeEvent::AccountEmailChanged(user_id) = &change {
            if *user_id == self.user_id {
                return Err(SessionError::AccountChanged);
            }
        }
        match self.feed.apply_change(change) {
            Some(update) => self
                .send_update(session, update)
                .await
                .map_err(SessionError::Network),
            None => Ok(()),
        }
    }

    async fn send_update(&self, session: &mut Session, update: FeedUpdate) -> Result<(), Closed> {
        let frame = UpdateFrame {
            change: update.into(),
            unread: UnreadCounts {
                notifications: self.feed.notifications().unread_count(),
                emails: self.feed.inbox().feed().unread_count(),
            },
        };
        send_json(session, &frame).await
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }

    session.ping(b"").await.map_err(SessionError::Network)
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            // Debug builds fail fast so frame drift is fixed; release builds log and keep the connection.
            if cfg!(debug_assertions) {
                panic!("feed frames must serialize: {error}");
            } else {
                warn!(error = %error, "Failed to serialize WebSocket payload");
            }
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::AccountChanged => {
            info!("account email changed; closing feed socket");
        }
        SessionError::InvalidPayload | SessionError::ClientClosed(_) | SessionError::StreamClosed => {
            debug!("feed socket closed");
        }
    }
}

fn close_action_for(error: &SessionError) -> CloseAction {
    match error {
        SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("heartbeat timeout".to_owned()),
        })),
        SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Protocol,
            description: Some("protocol error".to_owned()),
        })),
        SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Policy,
            description: Some("invalid payload".to_owned()),
        })),
        SessionError::AccountChanged => CloseAction::Close(Some(CloseReason {
            code: CloseCode::Normal,
            description: Some("account email changed".to_owned()),
        })),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

async fn close_session_if_needed(session: Session, close_action: CloseAction) {
    if let CloseAction::Close(reason) = close_action {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "Failed to close WebSocket session");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
