//! One client-facing channel for the lifetime of one job-observation
//! session.
//!
//! On connect the session binds its outbound channel into the
//! [`ProgressRegistry`] under the job id from the request path. The
//! receive loop waits for inbound activity up to a fixed idle timeout;
//! when the timeout elapses it sends a heartbeat frame so the client
//! can distinguish a silent queue from a dead connection. Every exit
//! path unbinds the channel (guarded by channel identity, so a
//! reconnect's newer binding survives) and tears the session down.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, Stream, StreamExt};
use murmur_core::job::JobId;
use tokio::sync::mpsc;

use crate::engine::ProgressRegistry;
use crate::state::AppState;

/// Idle window before a heartbeat is sent.
const HEARTBEAT_IDLE: Duration = Duration::from_secs(30);

/// GET /api/v1/transcribe/ws/{job_id} -- upgrade to a job observation
/// session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(job_id): Path<JobId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, job_id, state.registry))
}

/// Outbound frame sent on idle timeout.
fn heartbeat_frame() -> Message {
    Message::Text(r#"{"type":"heartbeat"}"#.into())
}

/// Reply to an inbound `"ping"` text frame.
fn pong_frame() -> Message {
    Message::Text(r#"{"type":"pong"}"#.into())
}

/// What the receive loop should do with one inbound message.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    /// Reply with a pong frame.
    Pong,
    /// Nothing to do; keep waiting.
    Ignore,
    /// The client is gone; end the session.
    Disconnect,
}

fn classify_inbound(msg: &Message) -> Inbound {
    match msg {
        Message::Text(text) if text.trim() == "ping" => Inbound::Pong,
        Message::Close(_) => Inbound::Disconnect,
        _ => Inbound::Ignore,
    }
}

/// Manage a single observation session after upgrade.
async fn handle_socket(socket: WebSocket, job_id: JobId, registry: Arc<ProgressRegistry>) {
    tracing::info!(%job_id, "Observer connected");

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    registry.bind(job_id, tx.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward queued frames (progress, heartbeats, pongs)
    // to the WebSocket sink.
    let sender_job_id = job_id;
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(job_id = %sender_job_id, "WebSocket sink closed");
                break;
            }
        }
    });

    receive_loop(&mut stream, job_id, &tx, HEARTBEAT_IDLE).await;

    // Teardown, regardless of which exit path was taken.
    registry.unbind(job_id, &tx).await;
    send_task.abort();
    tracing::info!(%job_id, "Observer disconnected");
}

/// Drive the inbound side of one session until it ends.
///
/// Waits for inbound activity up to `idle` per iteration; on timeout a
/// heartbeat goes out through `tx`. A failed control-frame send means
/// the sender task already observed a closed sink, so it doubles as
/// disconnect detection.
async fn receive_loop<S>(
    stream: &mut S,
    job_id: JobId,
    tx: &mpsc::UnboundedSender<Message>,
    idle: Duration,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match tokio::time::timeout(idle, stream.next()).await {
            Err(_) => {
                if tx.send(heartbeat_frame()).is_err() {
                    tracing::debug!(%job_id, "Heartbeat send failed; treating as disconnect");
                    break;
                }
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(%job_id, error = %e, "WebSocket receive error");
                break;
            }
            Ok(Some(Ok(msg))) => match classify_inbound(&msg) {
                Inbound::Pong => {
                    if tx.send(pong_frame()).is_err() {
                        break;
                    }
                }
                Inbound::Ignore => {}
                Inbound::Disconnect => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_text_gets_a_pong() {
        assert_eq!(classify_inbound(&Message::Text("ping".into())), Inbound::Pong);
        assert_eq!(
            classify_inbound(&Message::Text(" ping \n".into())),
            Inbound::Pong
        );
    }

    #[test]
    fn close_frame_disconnects() {
        assert_eq!(
            classify_inbound(&Message::Close(None)),
            Inbound::Disconnect
        );
    }

    #[test]
    fn other_traffic_is_ignored() {
        assert_eq!(
            classify_inbound(&Message::Text("hello".into())),
            Inbound::Ignore
        );
        assert_eq!(
            classify_inbound(&Message::Binary(vec![1, 2, 3].into())),
            Inbound::Ignore
        );
        assert_eq!(
            classify_inbound(&Message::Pong(Default::default())),
            Inbound::Ignore
        );
    }

    #[test]
    fn control_frames_have_expected_payloads() {
        assert!(matches!(
            heartbeat_frame(),
            Message::Text(t) if t == r#"{"type":"heartbeat"}"#
        ));
        assert!(matches!(
            pong_frame(),
            Message::Text(t) if t == r#"{"type":"pong"}"#
        ));
    }

    // -- receive loop --

    fn inbound(text: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(text.into()))
    }

    fn payload(msg: Message) -> String {
        match msg {
            Message::Text(t) => t.to_string(),
            other => panic!("Expected Text frame, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_loop_emits_heartbeats_until_channel_closes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut stream = futures::stream::pending::<Result<Message, axum::Error>>();
            receive_loop(&mut stream, JobId::nil(), &tx, HEARTBEAT_IDLE).await;
        });

        // A silent client sees a heartbeat each idle window.
        assert_eq!(payload(rx.recv().await.unwrap()), r#"{"type":"heartbeat"}"#);
        assert_eq!(payload(rx.recv().await.unwrap()), r#"{"type":"heartbeat"}"#);

        // Once the outbound channel is gone the next heartbeat send
        // fails and the loop ends.
        drop(rx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn ping_gets_pong_then_idle_resumes_heartbeats() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut stream = futures::stream::iter([inbound("ping")])
                .chain(futures::stream::pending());
            receive_loop(&mut stream, JobId::nil(), &tx, HEARTBEAT_IDLE).await;
        });

        assert_eq!(payload(rx.recv().await.unwrap()), r#"{"type":"pong"}"#);
        assert_eq!(payload(rx.recv().await.unwrap()), r#"{"type":"heartbeat"}"#);

        drop(rx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn close_frame_ends_the_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut stream = futures::stream::iter([Ok(Message::Close(None))]);

        receive_loop(&mut stream, JobId::nil(), &tx, HEARTBEAT_IDLE).await;

        drop(tx);
        assert!(rx.recv().await.is_none(), "no frames expected on close");
    }

    #[tokio::test]
    async fn exhausted_stream_ends_the_loop() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut stream = futures::stream::iter(Vec::<Result<Message, axum::Error>>::new());

        receive_loop(&mut stream, JobId::nil(), &tx, HEARTBEAT_IDLE).await;
    }
}
