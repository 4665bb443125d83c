use anyhow::{Context as _, Result};

use crate::device::{FrameSource, RawFrame, SensorReading, Temperature, interpret};

/// A complete measurement: both fields are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub temperature: Temperature,

    pub co2_ppm: u16,
}

/// In-progress measurement. Later readings of a kind overwrite earlier ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialMeasurement {
    pub temperature: Option<Temperature>,

    pub co2_ppm: Option<u16>,
}

impl PartialMeasurement {
    pub fn merge(&mut self, reading: SensorReading) {
        match reading {
            SensorReading::Temperature(t) => self.temperature = Some(t),
            SensorReading::Co2 { ppm } => self.co2_ppm = Some(ppm),
            SensorReading::Humidity { .. } | SensorReading::Unknown { .. } => {}
        }
    }

    pub fn complete(&self) -> Option<Measurement> {
        Some(Measurement {
            temperature: self.temperature?,
            co2_ppm: self.co2_ppm?,
        })
    }
}

#[derive(Debug, Default)]
pub struct MeasurementAccumulator {
    state: PartialMeasurement,
}

impl MeasurementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PartialMeasurement {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = PartialMeasurement::default();
    }

    /// Runs one raw frame through decrypt, validate, interpret and merge.
    ///
    /// Returns the measurement once both temperature and CO2 are known and
    /// resets the state for the next cycle. Corrupt frames are logged and
    /// dropped without touching the state.
    pub fn feed(&mut self, raw: RawFrame) -> Option<Measurement> {
        let frame = raw.decrypt();
        if !frame.is_valid() {
            log::warn!("checksum mismatch: raw [{raw}] decrypted [{frame}]");
            return None;
        }

        let reading = interpret(&frame);
        match reading {
            SensorReading::Co2 { ppm } => log::debug!("co2: {ppm} ppm"),
            SensorReading::Temperature(t) => log::debug!("temperature: {t} C"),
            SensorReading::Humidity { percent } => log::info!("humidity: {percent}%"),
            SensorReading::Unknown { operation, value } => {
                log::trace!("unknown operation 0x{operation:02x}: {value}")
            }
        }

        self.state.merge(reading);
        let measurement = self.state.complete()?;
        self.reset();
        Some(measurement)
    }

    /// Pulls frames from `source` until a complete measurement is assembled.
    ///
    /// Each cycle starts from an empty state. The only await point is the
    /// frame pull, so dropping the returned future cancels between frames.
    pub async fn accumulate<S: FrameSource>(&mut self, source: &mut S) -> Result<Measurement> {
        self.reset();
        loop {
            let raw = source
                .read_frame()
                .await
                .context("failed to read frame while accumulating")?;
            if let Some(measurement) = self.feed(raw) {
                return Ok(measurement);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HidrawFrameSource, encrypt, plain_frame};

    fn raw(operation: u8, value: u16) -> RawFrame {
        encrypt(plain_frame(operation, value))
    }

    fn corrupt() -> RawFrame {
        let mut frame = plain_frame(0x50, 900);
        frame.0[3] ^= 0xff;
        encrypt(frame)
    }

    fn stream(frames: &[RawFrame]) -> Vec<u8> {
        frames.iter().flat_map(|f| f.0).collect()
    }

    #[test]
    fn ignores_humidity_and_unknown() {
        let mut acc = MeasurementAccumulator::new();
        assert_eq!(acc.feed(raw(0x44, 40)), None);
        assert_eq!(acc.feed(raw(0x50, 842)), None);
        assert_eq!(acc.feed(raw(0x6d, 7)), None);
        assert_eq!(
            acc.feed(raw(0x42, 4711)),
            Some(Measurement {
                temperature: Temperature::from_deci_celsius(213),
                co2_ppm: 842,
            })
        );
    }

    #[test]
    fn later_reading_overwrites() {
        let mut acc = MeasurementAccumulator::new();
        assert_eq!(acc.feed(raw(0x42, 4700)), None);
        assert_eq!(acc.feed(raw(0x42, 4711)), None);
        let m = acc.feed(raw(0x50, 500)).unwrap();
        assert_eq!(m.temperature.to_string(), "21.3");
        assert_eq!(m.co2_ppm, 500);
    }

    #[test]
    fn state_resets_after_completion() {
        let mut acc = MeasurementAccumulator::new();
        acc.feed(raw(0x50, 842));
        assert!(acc.feed(raw(0x42, 4711)).is_some());
        assert_eq!(acc.state(), &PartialMeasurement::default());
        assert_eq!(acc.feed(raw(0x42, 4711)), None);
    }

    #[test]
    fn corrupt_frame_is_skipped() {
        let mut acc = MeasurementAccumulator::new();
        acc.feed(raw(0x50, 842));
        assert_eq!(acc.feed(corrupt()), None);
        assert_eq!(acc.state().co2_ppm, Some(842));
        let m = acc.feed(raw(0x42, 4711)).unwrap();
        assert_eq!(m.co2_ppm, 842);
    }

    #[tokio::test]
    async fn accumulates_from_source() {
        let bytes = stream(&[raw(0x44, 40), raw(0x50, 842), raw(0x6d, 7), raw(0x42, 4711)]);
        let mut source = HidrawFrameSource::new(bytes.as_slice());
        let mut acc = MeasurementAccumulator::new();

        let m = acc.accumulate(&mut source).await.unwrap();
        assert_eq!(m.temperature.to_string(), "21.3");
        assert_eq!(m.co2_ppm, 842);
    }

    #[tokio::test]
    async fn consecutive_cycles_do_not_leak() {
        let bytes = stream(&[
            raw(0x50, 842),
            raw(0x42, 4711),
            raw(0x42, 4700),
            raw(0x50, 1000),
        ]);
        let mut source = HidrawFrameSource::new(bytes.as_slice());
        let mut acc = MeasurementAccumulator::new();

        let first = acc.accumulate(&mut source).await.unwrap();
        let second = acc.accumulate(&mut source).await.unwrap();
        assert_eq!(first.co2_ppm, 842);
        assert_eq!(second.co2_ppm, 1000);
        assert_eq!(second.temperature, Temperature::from_raw(4700));
    }

    #[tokio::test]
    async fn corrupt_frame_does_not_abort_cycle() {
        let bytes = stream(&[raw(0x50, 842), corrupt(), raw(0x42, 4711)]);
        let mut source = HidrawFrameSource::new(bytes.as_slice());
        let mut acc = MeasurementAccumulator::new();

        let m = acc.accumulate(&mut source).await.unwrap();
        assert_eq!(m.co2_ppm, 842);
        assert_eq!(m.temperature.to_string(), "21.3");
    }

    #[tokio::test]
    async fn end_of_stream_aborts_cycle() {
        let bytes = stream(&[raw(0x50, 842)]);
        let mut source = HidrawFrameSource::new(bytes.as_slice());
        let mut acc = MeasurementAccumulator::new();

        let err = acc.accumulate(&mut source).await.unwrap_err();
        assert!(format!("{err:#}").contains("short read"));
    }
}
