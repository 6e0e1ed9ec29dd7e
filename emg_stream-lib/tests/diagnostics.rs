use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use log::{Level, LevelFilter, Log, Metadata, Record};
use emg_stream_lib::{
    Acquisition, AcquisitionStats, AdcChannel, DifferentialSampler, HttpTransport,
    MonotonicClock, PacketAssembler, StepOutcome, SyntheticAdc, Ticker,
};

static WARNINGS: AtomicUsize = AtomicUsize::new(0);

struct CountingLogger;

impl Log for CountingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Warn {
            WARNINGS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

static LOGGER: CountingLogger = CountingLogger;

#[test]
fn refused_connection_emits_one_notice_and_no_retry() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Warn);

    // nothing listens on a port we just released
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let transport = HttpTransport::new("127.0.0.1", port, "/data")
        .with_connect_timeout(Some(Duration::from_millis(500)));

    let adc = SyntheticAdc::new(AdcChannel(1), AdcChannel(2));
    let mut acq = Acquisition::new(
        Ticker::new(MonotonicClock::new(), 40),
        DifferentialSampler::new(adc, AdcChannel(1), AdcChannel(2)),
        PacketAssembler::new(16),
        transport,
    );

    let outcomes: Vec<StepOutcome> = (0..16).map(|_| acq.step()).collect();
    assert_eq!(outcomes[15], StepOutcome::Dropped);
    assert_eq!(WARNINGS.load(Ordering::SeqCst), 1);
    assert_eq!(acq.transport().attempts(), 1);

    // the next cycle starts from an empty buffer and keeps sampling
    assert!(matches!(acq.step(), StepOutcome::Sampled(_)));
    let stats = acq.stats();
    assert_eq!(stats, AcquisitionStats { samples: 17, packets_sent: 0, packets_dropped: 1 });
}
