use std::net::UdpSocket;
use std::time::Duration;
use emg_stream_lib::{
    decode_packet, AcquisitionStats, AdcChannel, AdcError, AdcResolution, Acquisition, Clock,
    DifferentialSampler, HardwareAdc, PacketAssembler, SpeedMode, StepOutcome, Ticker,
    UdpTransport,
};

const SIGNAL: AdcChannel = AdcChannel(1);
const REFERENCE: AdcChannel = AdcChannel(2);

struct StepClock {
    now: u32,
    step: u32,
}

impl Clock for StepClock {
    fn now_micros(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step);
        now
    }
}

/// Signal follows `signal_at(tick)`, reference is constant.
struct PatternAdc {
    tick: u32,
    reference: u16,
    signal_at: fn(u32) -> u16,
}

impl HardwareAdc for PatternAdc {
    fn configure(&mut self, _: AdcResolution, _: SpeedMode) -> Result<(), AdcError> {
        Ok(())
    }

    fn read(&mut self, channel: AdcChannel) -> u16 {
        if channel == SIGNAL {
            let v = (self.signal_at)(self.tick);
            self.tick += 1;
            v
        } else {
            self.reference
        }
    }
}

fn receiver() -> UdpSocket {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    sock
}

#[test]
fn first_tick_offset_decodes_in_order() {
    let rx = receiver();
    let adc = PatternAdc { tick: 0, reference: 500, signal_at: |t| if t == 0 { 600 } else { 500 } };
    let mut acq = Acquisition::new(
        Ticker::new(StepClock { now: u32::MAX - 500, step: 13 }, 40),
        DifferentialSampler::new(adc, SIGNAL, REFERENCE),
        PacketAssembler::new(256),
        UdpTransport::bind(0, rx.local_addr().unwrap()).unwrap(),
    );

    let stats = acq.run_for(256);
    assert_eq!(stats, AcquisitionStats { samples: 256, packets_sent: 1, packets_dropped: 0 });

    let mut buf = [0u8; 2048];
    let n = rx.recv(&mut buf).unwrap();
    assert_eq!(n, 512);
    assert_eq!(&buf[..4], &[0x64, 0x00, 0x00, 0x00]);

    let samples = decode_packet(&buf[..n]).unwrap();
    assert_eq!(samples[0], 100);
    assert!(samples[1..].iter().all(|&s| s == 0));
}

#[test]
fn negative_differential_round_trips() {
    let rx = receiver();
    let adc = PatternAdc { tick: 0, reference: 500, signal_at: |_| 300 };
    let mut acq = Acquisition::new(
        Ticker::new(StepClock { now: 0, step: 40 }, 40),
        DifferentialSampler::new(adc, SIGNAL, REFERENCE),
        PacketAssembler::new(256),
        UdpTransport::bind(0, rx.local_addr().unwrap()).unwrap(),
    );
    acq.run_for(256);

    let mut buf = [0u8; 2048];
    let n = rx.recv(&mut buf).unwrap();
    assert_eq!(&buf[..2], &[0x38, 0xFF]);
    assert!(decode_packet(&buf[..n]).unwrap().iter().all(|&s| s == -200));
}

#[test]
fn partial_packet_is_never_sent() {
    let rx = receiver();
    rx.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
    let adc = PatternAdc { tick: 0, reference: 0, signal_at: |t| (t % 1024) as u16 };
    let mut acq = Acquisition::new(
        Ticker::new(StepClock { now: 0, step: 40 }, 40),
        DifferentialSampler::new(adc, SIGNAL, REFERENCE),
        PacketAssembler::new(256),
        UdpTransport::bind(0, rx.local_addr().unwrap()).unwrap(),
    );

    let outcomes: Vec<StepOutcome> = (0..255).map(|_| acq.step()).collect();
    assert!(outcomes.iter().all(|o| matches!(o, StepOutcome::Sampled(_))));
    let mut buf = [0u8; 2048];
    assert!(rx.recv(&mut buf).is_err());

    assert_eq!(acq.step(), StepOutcome::Sent);
    let n = rx.recv(&mut buf).unwrap();
    let samples = decode_packet(&buf[..n]).unwrap();
    let expected: Vec<i16> = (0..256).collect();
    assert_eq!(samples, expected);
}
