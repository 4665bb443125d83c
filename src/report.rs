use std::{io::Write, str::FromStr};

use anyhow::{Context as _, Error, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::device::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Log,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Log => "log",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "log" => Ok(OutputFormat::Log),
            _ => bail!("unknown output format: {}", s),
        }
    }
}

// Field names are consumed downstream; keep them stable.
#[derive(Debug, Serialize)]
struct JsonRecord {
    temp: String,
    co2: String,
}

impl From<&Measurement> for JsonRecord {
    fn from(m: &Measurement) -> Self {
        Self {
            temp: m.temperature.to_string(),
            co2: m.co2_ppm.to_string(),
        }
    }
}

/// Writes one line per completed measurement.
#[derive(Debug)]
pub struct Reporter<W> {
    writer: W,
    format: OutputFormat,
    timezone: Tz,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W, format: OutputFormat, timezone: Tz) -> Self {
        Self {
            writer,
            format,
            timezone,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn report(&mut self, measured_at: DateTime<Utc>, measurement: &Measurement) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, &JsonRecord::from(measurement))
                    .context("failed to serialize measurement")?;
                writeln!(self.writer).context("failed to write measurement")?;
            }
            OutputFormat::Log => {
                let measured_at = measured_at
                    .with_timezone(&self.timezone)
                    .to_rfc3339_opts(SecondsFormat::Secs, false);
                writeln!(
                    self.writer,
                    "{measured_at} temp={} co2={}",
                    measurement.temperature, measurement.co2_ppm
                )
                .context("failed to write measurement")?;
            }
        }

        self.writer.flush().context("failed to flush output")
    }
}
