// src/main.rs

use dotenv::dotenv;
use std::error::Error;
use log::{info, error, warn};
use emg_stream_lib::{
    link::{self, HostLink},
    Acquisition, AdcChannel, DifferentialSampler, Endpoint, HardwareAdc, HttpTransport,
    MonotonicClock, NodeConfig, PacketAssembler, PacketTransport, SyntheticAdc, Ticker,
    UdpTransport,
};

/* RUST_LOG=emg_stream_lib=debug,emg_stream_node=info \
cargo run -p emg_stream-node */

const SIGNAL: AdcChannel = AdcChannel(1);
const REFERENCE: AdcChannel = AdcChannel(2);

fn main() -> Result<(), Box<dyn Error>> {
    // ──────── ① Load .env if present ────────
    if let Err(e) = dotenv() {
        eprintln!("No .env loaded ({}), using process environment", e);
    }

    // initialize logger and panic hook
    env_logger::init();
    std::panic::set_hook(Box::new(|info| {
        error!("Thread panic: {:?}", info);
    }));

    // ──────── ② Configuration is read once, never mutated ────────
    let cfg = NodeConfig::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;
    info!(
        "Configured {:?} transport, {}us interval, {} samples/packet, {}-bit ADC",
        cfg.endpoint.kind(),
        cfg.sample_interval_us,
        cfg.samples_per_packet,
        cfg.resolution.bits()
    );

    // ──────── ③ Link bring-up: fatal without hardware, else retry forever ────────
    let target = match &cfg.endpoint {
        Endpoint::Udp { remote, .. } => remote.to_string(),
        Endpoint::Http { host, port, .. } => format!("{}:{}", host, port),
    };
    let mut host_link = HostLink::new(target);
    if let Err(e) = link::bring_up(&mut host_link, &cfg.credentials, cfg.retry_delay) {
        link::halt(&e);
    }

    // ──────── ④ ADC ────────
    let mut adc = SyntheticAdc::new(SIGNAL, REFERENCE);
    adc.configure(cfg.resolution, cfg.speed)?;

    // ──────── ⑤ Transport ────────
    let transport: Box<dyn PacketTransport> = match &cfg.endpoint {
        Endpoint::Udp { remote, local_port } => Box::new(UdpTransport::bind(*local_port, *remote)?),
        Endpoint::Http { host, port, path } => {
            if cfg.connect_timeout.is_none() {
                warn!("No connect timeout: an unreachable receiver stalls acquisition");
            }
            Box::new(
                HttpTransport::new(host.clone(), *port, path.clone())
                    .with_connect_timeout(cfg.connect_timeout),
            )
        }
    };

    // ──────── ⑥ Acquire forever ────────
    let mut acquisition = Acquisition::new(
        Ticker::new(MonotonicClock::new(), cfg.sample_interval_us),
        DifferentialSampler::new(adc, SIGNAL, REFERENCE).with_resolution(cfg.resolution),
        PacketAssembler::new(cfg.samples_per_packet),
        transport,
    );
    acquisition.run_forever()
}
