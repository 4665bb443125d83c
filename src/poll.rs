use std::{future::Future, io::Write, pin::pin};

use anyhow::{Context as _, Result};
use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::{
    device::{FrameSource, MeasurementAccumulator},
    report::Reporter,
};

/// Runs one accumulation cycle per tick against a single frame source.
///
/// Cycles never overlap: a cycle that outlasts the interval delays the
/// next tick.
#[derive(Debug)]
pub struct PollingDriver<S, W> {
    source: S,
    reporter: Reporter<W>,
    interval: Duration,
    accumulator: MeasurementAccumulator,
}

impl<S: FrameSource, W: Write> PollingDriver<S, W> {
    pub fn new(source: S, reporter: Reporter<W>, interval: Duration) -> Self {
        Self {
            source,
            reporter,
            interval,
            accumulator: MeasurementAccumulator::new(),
        }
    }

    /// Polls until `shutdown` resolves or the source fails.
    ///
    /// Shutdown interrupts a running cycle at its next frame pull and the
    /// partial measurement is discarded.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut shutdown = pin!(shutdown);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let measurement = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.accumulator.accumulate(&mut self.source) => {
                    result.context("failed to accumulate measurement")?
                }
            };

            log::debug!(
                "measurement: temp={} co2={}",
                measurement.temperature,
                measurement.co2_ppm
            );
            self.reporter
                .report(Utc::now(), &measurement)
                .context("failed to report measurement")?;
        }

        log::info!("polling stopped");
        Ok(())
    }
}
