use std::convert::Infallible;
use futures_util::{StreamExt, SinkExt, future::select};
use tokio::sync::broadcast::{Sender, error::RecvError};
use warp::{Filter, Rejection, Reply, ws::{Message as WsMsg, WebSocket}};
use emg_stream_lib::{codec::encode_samples, Message};
use log::info;

/// Cloneable filter for broadcasting
fn with_tx(
    tx: Sender<Message>,
) -> impl Filter<Extract = (Sender<Message>,), Error = Infallible> + Clone {
    warp::any().map(move || tx.clone())
}

/// Build the WebSocket route under `/ws`
pub fn ws_routes(
    tx: Sender<Message>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    // allow CORS for WS handshake
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["sec-websocket-protocol", "origin", "upgrade"]);

    warp::path("ws")
        .and(warp::ws())
        .and(with_tx(tx))
        .map(|ws: warp::ws::Ws, tx| {
            ws.on_upgrade(move |socket| handle_ws(socket, tx))
        })
        .with(cors)
}

async fn handle_ws(ws: WebSocket, tx: Sender<Message>) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut rx = tx.subscribe();

    // Viewers only listen; drain until they hang up
    let inbound = async {
        while let Some(result) = ws_rx.next().await {
            if result.map(|msg| msg.is_close()).unwrap_or(true) {
                break;
            }
        }
    };

    // Outgoing broadcast → client: packets as BINARY frames in wire order,
    // gap notices as JSON text
    let outbound = async {
        loop {
            match rx.recv().await {
                Ok(Message::Packet { samples, .. }) => {
                    if ws_tx.send(WsMsg::binary(encode_samples(&samples))).await.is_err() {
                        break; // client disconnected
                    }
                }

                Ok(gap @ Message::Gap { .. }) => {
                    let Ok(txt) = serde_json::to_string(&gap) else { continue };
                    if ws_tx.send(WsMsg::text(txt)).await.is_err() {
                        break;
                    }
                }

                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("WS client lagged, dropped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    // Run inbound and outbound until one finishes
    select(Box::pin(inbound), Box::pin(outbound)).await;
    info!("WebSocket client disconnected");
}
