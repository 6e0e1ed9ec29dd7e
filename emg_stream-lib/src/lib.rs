//! emg_stream-lib: fixed-rate differential acquisition, packet streaming,
//! and the receiver-side decoder for the resulting byte stream

// acquisition core (runs on the node):
pub mod clock;
pub mod adc;
pub mod sampler;
pub mod packet;
pub mod transport;
pub mod acquisition;
pub mod link;
pub mod config;

// receiver side:
pub mod codec;
pub mod context;
pub mod message;
pub mod recorder;
pub mod ingest;

// re-exports for ergonomic imports:
pub use acquisition::{Acquisition, AcquisitionState, AcquisitionStats, StepOutcome};
pub use adc::{AdcChannel, AdcError, AdcResolution, HardwareAdc, SpeedMode, SyntheticAdc};
pub use clock::{Clock, MonotonicClock, Ticker};
pub use config::{Endpoint, NodeConfig};
pub use packet::PacketAssembler;
pub use sampler::{DifferentialSampler, Sample};
pub use transport::{HttpTransport, PacketTransport, TransportError, TransportKind, UdpTransport};

pub use codec::{decode_packet, DecodeError, StreamMonitor, VoltageScale};
pub use context::Context;
pub use ingest::{run_udp_ingest, Ingest, SharedIngest};
pub use message::{Message, Source};
pub use recorder::CsvRecorder;
