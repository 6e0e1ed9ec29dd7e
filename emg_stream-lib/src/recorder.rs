use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::codec::VoltageScale;

/// Appends received samples to a CSV capture as `Sample_Index,Voltage_V`.
pub struct CsvRecorder<W: Write> {
    out: BufWriter<W>,
    scale: VoltageScale,
    next_index: u64,
}

impl CsvRecorder<File> {
    pub fn create(path: impl AsRef<Path>, scale: VoltageScale) -> std::io::Result<Self> {
        Self::new(File::create(path)?, scale)
    }
}

impl<W: Write> CsvRecorder<W> {
    pub fn new(writer: W, scale: VoltageScale) -> std::io::Result<Self> {
        let mut out = BufWriter::new(writer);
        writeln!(out, "Sample_Index,Voltage_V")?;
        Ok(Self { out, scale, next_index: 0 })
    }

    pub fn record(&mut self, samples: &[i16]) -> std::io::Result<()> {
        for &s in samples {
            writeln!(self.out, "{},{:.6}", self.next_index, self.scale.to_volts(s))?;
            self.next_index += 1;
        }
        Ok(())
    }

    pub fn recorded(&self) -> u64 {
        self.next_index
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> std::io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}
