use serde::{Deserialize, Serialize};

/// Which transport a packet came in on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Udp,
    Http,
}

/// Events fanned out to viewers:
/// - `Packet` for one decoded packet
/// - `Gap`    when the arrival gap suggests packets were lost
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    Packet {
        source:       Source,
        received_at:  i64,          // unix nanos
        first_sample: u64,          // nominal index from arrival order
        samples:      Vec<i16>,
    },
    Gap { received_at: i64, missing_packets: u64 },
}
