use std::convert::Infallible;
use async_stream::stream;
use bytes::Bytes;
use tokio::sync::broadcast::Sender;
use emg_stream_lib::{Message, SharedIngest, Source};
use warp::{Filter, Rejection, Reply, http::StatusCode, sse::{Event, reply, keep_alive}};
use log::{debug, warn};

/// Largest body accepted on `POST /data`.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// `POST /data` (node uploads) and `GET /stream` (SSE of decoded packets).
pub fn ingest_routes(
    ingest: SharedIngest,
    tx: Sender<Message>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    // POST /data, body is the raw packet
    let post = warp::post()
        .and(warp::path("data"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .map(move |body: Bytes| {
            let result = match ingest.lock() {
                Ok(mut guard) => guard.accept(&body, Source::Http),
                Err(poisoned) => poisoned.into_inner().accept(&body, Source::Http),
            };
            match result {
                Ok(count) => {
                    debug!("POST /data: {} samples", count);
                    StatusCode::NO_CONTENT
                }
                Err(e) => {
                    warn!("POST /data rejected: {}", e);
                    StatusCode::BAD_REQUEST
                }
            }
        });

    // GET /stream → SSE
    let sse_route = warp::get()
        .and(warp::path("stream"))
        .and(warp::path::end())
        .map(move || {
            // subscribe inside the closure
            let mut rx = tx.subscribe();
            // build a fresh stream for each client
            let event_stream = stream! {
                while let Ok(msg) = rx.recv().await {
                    match serde_json::to_string(&msg) {
                        Ok(json) => yield Ok::<_, Infallible>(Event::default().data(json)),
                        Err(e) => warn!("SSE encode failed: {}", e),
                    }
                }
            };
            // reply sets up text/event-stream headers for you
            reply(keep_alive().stream(event_stream))
        });

    // Build CORS once, apply to both routes
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["OPTIONS", "GET", "POST"])
        .allow_headers(vec!["content-type", "accept", "last-event-id", "origin"]);

    post.or(sse_route).with(cors)
}
