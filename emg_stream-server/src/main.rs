// src/main.rs

mod ingest_http;
mod stream_ws;
use dotenv::dotenv;
use std::{env, error::Error, net::SocketAddr};
use log::{info, error};
use warp::Filter;
use emg_stream_lib::{
    config::{DEFAULT_SAMPLES_PER_PACKET, DEFAULT_SAMPLE_INTERVAL_US, DEFAULT_UDP_PORT},
    Context,                  // broadcast context
    CsvRecorder,
    Ingest,
    StreamMonitor,
    VoltageScale,
    run_udp_ingest,           // datagrams → broadcast
};

/* RUST_LOG=emg_stream_lib=debug,emg_stream_server=info \
cargo run -p emg_stream-server */

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn Error>> {
    // ──────── ① Load .env if present ────────
    if let Err(e) = dotenv() {
        eprintln!("No .env loaded ({}), using process environment", e);
    }

    // initialize logger and panic hook
    env_logger::init();
    std::panic::set_hook(Box::new(|info| {
        error!("Thread panic: {:?}", info);
    }));

    // ──────── ② Listener and stream settings ────────
    let udp_addr: SocketAddr = env_or("EMG_UDP_LISTEN", SocketAddr::from(([0, 0, 0, 0], DEFAULT_UDP_PORT)))?;
    let http_port: u16 = env_or("EMG_HTTP_LISTEN_PORT", 3030)?;
    let ws_port: u16 = env_or("EMG_WS_PORT", 3032)?;
    let samples_per_packet: usize = env_or("EMG_SAMPLES_PER_PACKET", DEFAULT_SAMPLES_PER_PACKET)?;
    let interval_us: u32 = env_or("EMG_SAMPLE_INTERVAL_US", DEFAULT_SAMPLE_INTERVAL_US)?;

    // build shared broadcast context (holds a broadcast::Sender<_>)
    let ctx = Context::new(1024);

    let mut ingest = Ingest::new(ctx.clone(), StreamMonitor::new(samples_per_packet, interval_us));
    if let Ok(path) = env::var("EMG_RECORD_CSV") {
        let recorder = CsvRecorder::create(&path, VoltageScale::default())
            .map_err(|e| format!("Cannot create capture file {}: {}", path, e))?;
        info!("Recording samples to {}", path);
        ingest = ingest.with_recorder(recorder);
    }
    let ingest = ingest.shared();

    // ──────── 1) Datagram listener ────────
    let udp_ingest = ingest.clone();
    tokio::spawn(async move {
        if let Err(e) = run_udp_ingest(udp_ingest, udp_addr).await {
            error!("UDP ingest failed: {}", e);
        }
    });

    // ──────── 2) WebSocket viewers ────────
    let ws_routes = stream_ws::ws_routes(ctx.tx.clone());
    tokio::spawn(async move {
        info!("WebSocket : 0.0.0.0:{}/ws", ws_port);
        warp::serve(ws_routes).run(([0, 0, 0, 0], ws_port)).await;
    });

    // ──────── 3) Periodic CSV flush ────────
    let flush_ingest = ingest.clone();
    tokio::spawn(async move {
        let mut every = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            every.tick().await;
            if let Ok(mut guard) = flush_ingest.lock() {
                guard.flush();
            }
        }
    });

    // ──────── 4) HTTP (health + static + ingest + SSE) ────────
    let health       = warp::path!("health").map(|| "OK");
    let static_files = warp::path("static")
    .and(warp::fs::dir("static"))
    .with(warp::reply::with::header("cache-control", "no-cache, no-store"));
    let routes       = health
        .or(static_files)
        .or(ingest_http::ingest_routes(ingest.clone(), ctx.tx.clone()));

    info!("HTTP  : 0.0.0.0:{} (health, static, POST /data, SSE /stream)", http_port);
    info!("UDP   : {}", udp_addr);
    info!("Stream: {} samples/packet, {}us interval", samples_per_packet, interval_us);

    warp::serve(routes).run(([0, 0, 0, 0], http_port)).await;
    Ok(())
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Environment variable {} has invalid value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
