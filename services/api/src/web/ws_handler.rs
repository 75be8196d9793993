//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a reading connection.
//! Each WebSocket connection owns one reading session. Messages are handled one
//! at a time, so a choice is never processed while the previous one is still
//! being stored.

use crate::web::{
    protocol::{ClientMessage, ErrorKind, LetterStyle, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use letter_core::{Progress, ReadingSession};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Whether the connection should stay open after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

#[derive(Deserialize, Debug)]
pub struct ReadParams {
    /// Lets a shared link open the letter without a separate `open` message.
    pub token: Option<String>,
}

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ReadParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, params.token))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, token: Option<String>) {
    info!("New reading connection established.");
    let (mut sender, mut receiver) = socket.split();
    let mut session: Option<ReadingSession> = None;

    // --- 1. Token from the link, if any ---
    if let Some(token) = token {
        let (replies, flow) = respond(&app_state, &mut session, ClientMessage::Open { token }).await;
        if !send_all(&mut sender, &replies).await || flow == Flow::Close {
            close(&mut sender).await;
            return;
        }
    }

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        let (replies, flow) = match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(client_msg) => respond(&app_state, &mut session, client_msg).await,
                Err(e) => {
                    warn!("Failed to deserialize client message: {}", e);
                    (
                        vec![ServerMessage::error(
                            ErrorKind::InvalidMessage,
                            "Message could not be understood.",
                        )],
                        Flow::Continue,
                    )
                }
            },
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => continue,
        };

        if !send_all(&mut sender, &replies).await || flow == Flow::Close {
            close(&mut sender).await;
            break;
        }
    }

    info!("Reading connection closed.");
}

/// Applies one client message to the connection's reading session.
///
/// Returns the messages to send back, in order. Any error ends the session;
/// no summary is stored for a session that ended in an error.
pub async fn respond(
    app_state: &AppState,
    session: &mut Option<ReadingSession>,
    msg: ClientMessage,
) -> (Vec<ServerMessage>, Flow) {
    match msg {
        ClientMessage::Open { token } => {
            if session.is_some() {
                warn!("Received subsequent Open message, which is ignored.");
                return (Vec::new(), Flow::Continue);
            }
            match app_state.reading.open(&token).await {
                Ok((opened, progress)) => {
                    let config = &opened.letter.config;
                    let opened_msg = ServerMessage::LetterOpened {
                        title: opened.letter.display_title().to_string(),
                        style: LetterStyle {
                            theme: config.theme.clone(),
                            text_size: config.text_size.css_value().to_string(),
                            custom_styles: config.custom_styles.clone(),
                        },
                        section: progress.view().clone(),
                    };
                    *session = Some(opened);
                    let mut replies = vec![opened_msg];
                    let flow = match progress {
                        Progress::Continue(_) => Flow::Continue,
                        Progress::Complete { summary, .. } => {
                            replies.push(ServerMessage::journey_complete(summary));
                            Flow::Close
                        }
                    };
                    (replies, flow)
                }
                Err(e) => {
                    warn!("Failed to open letter: {}", e);
                    (vec![ServerMessage::from(&e)], Flow::Close)
                }
            }
        }
        ClientMessage::Choose { choice_index } => {
            let Some(current) = session.as_mut() else {
                error!("Choice received before a letter was opened.");
                return (
                    vec![ServerMessage::error(
                        ErrorKind::InvalidMessage,
                        "Open a letter before choosing.",
                    )],
                    Flow::Close,
                );
            };
            match app_state.reading.choose(current, choice_index).await {
                Ok(Progress::Continue(view)) => {
                    (vec![ServerMessage::Section { section: view }], Flow::Continue)
                }
                Ok(Progress::Complete { view, summary }) => (
                    vec![
                        ServerMessage::Section { section: view },
                        ServerMessage::journey_complete(summary),
                    ],
                    Flow::Close,
                ),
                Err(e) => {
                    error!("Reading session aborted: {}", e);
                    (vec![ServerMessage::from(&e)], Flow::Close)
                }
            }
        }
    }
}

/// Sends every reply in order. Returns `false` once the client is gone.
async fn send_all(sender: &mut SplitSink<WebSocket, Message>, replies: &[ServerMessage]) -> bool {
    for reply in replies {
        let json = match serde_json::to_string(reply) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                return false;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            error!("Failed to send message to client.");
            return false;
        }
    }
    true
}

async fn close(sender: &mut SplitSink<WebSocket, Message>) {
    if let Err(e) = sender.close().await {
        warn!("Failed to close connection cleanly: {}", e);
    }
}
