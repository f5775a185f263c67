use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use shared::protocol::{RTPI_MESSAGE, RT_MESSAGE};
use tokio::net::TcpListener;

use super::*;

#[derive(Clone)]
struct ServerState {
    greetings: Vec<String>,
    close_after_greetings: bool,
    received: mpsc::UnboundedSender<Frame>,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: ServerState, mut socket: WebSocket) {
    for greeting in &state.greetings {
        socket
            .send(WsMessage::Text(greeting.clone()))
            .await
            .expect("send greeting");
    }

    if state.close_after_greetings {
        let _ = socket.send(WsMessage::Close(None)).await;
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let WsMessage::Text(text) = message {
            let frame = serde_json::from_str::<Frame>(&text).expect("decode frame");
            if state.received.send(frame).is_err() {
                break;
            }
        }
    }
}

async fn spawn_ws_server(state: ServerState) -> String {
    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("ws://{addr}")
}

fn encode(frame: &Frame) -> String {
    serde_json::to_string(frame).expect("encode frame")
}

#[tokio::test]
async fn frames_flow_in_both_directions() {
    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(ServerState {
        greetings: vec![encode(&Frame::new(RT_MESSAGE, "welcome"))],
        close_after_greetings: false,
        received: received_tx,
    })
    .await;

    let (channel, mut signals) = WsChannel::connect(&url).await.expect("connect");

    let first = signals.recv().await.expect("greeting signal");
    assert_eq!(
        first,
        ChannelSignal::Message {
            channel: RT_MESSAGE.to_string(),
            payload: "welcome".to_string(),
        }
    );

    channel.send(RTPI_MESSAGE, "{\"pirequest\":{}}".to_string());
    let frame = received_rx.recv().await.expect("server-side frame");
    assert_eq!(frame, Frame::new(RTPI_MESSAGE, "{\"pirequest\":{}}"));
}

#[tokio::test]
async fn invalid_inbound_frames_are_dropped() {
    let (received_tx, _received_rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(ServerState {
        greetings: vec![
            "not a frame".to_string(),
            encode(&Frame::new(RT_MESSAGE, "after junk")),
        ],
        close_after_greetings: false,
        received: received_tx,
    })
    .await;

    let (_channel, mut signals) = WsChannel::connect(&url).await.expect("connect");

    // The undecodable text never surfaces; the next valid frame does.
    let first = signals.recv().await.expect("signal");
    assert_eq!(
        first,
        ChannelSignal::Message {
            channel: RT_MESSAGE.to_string(),
            payload: "after junk".to_string(),
        }
    );
}

#[tokio::test]
async fn peer_close_surfaces_exactly_one_termination() {
    let (received_tx, _received_rx) = mpsc::unbounded_channel();
    let url = spawn_ws_server(ServerState {
        greetings: vec![encode(&Frame::new(RT_MESSAGE, "goodbye"))],
        close_after_greetings: true,
        received: received_tx,
    })
    .await;

    let (_channel, mut signals) = WsChannel::connect(&url).await.expect("connect");

    let first = signals.recv().await.expect("greeting signal");
    assert!(matches!(first, ChannelSignal::Message { .. }));

    let second = signals.recv().await.expect("termination signal");
    assert!(matches!(second, ChannelSignal::Terminated { .. }));

    // Reader task ends after termination; the stream yields nothing else.
    assert!(signals.recv().await.is_none());
}

#[tokio::test]
async fn connect_rejects_unknown_scheme() {
    let err = WsChannel::connect("ftp://127.0.0.1:6181").await.err().expect("scheme error");
    assert!(matches!(err, ChannelError::Transport(_)));
}

#[test]
fn normalizes_http_scheme_and_appends_endpoint() {
    assert_eq!(
        normalize_ws_url("http://127.0.0.1:6181").expect("normalize"),
        "ws://127.0.0.1:6181/ws"
    );
    assert_eq!(
        normalize_ws_url("https://example.com/").expect("normalize"),
        "wss://example.com/ws"
    );
    assert_eq!(
        normalize_ws_url("ws://127.0.0.1:6181").expect("normalize"),
        "ws://127.0.0.1:6181/ws"
    );
}
