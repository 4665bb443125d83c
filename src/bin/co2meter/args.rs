use std::{num::NonZeroU64, path::PathBuf};

use chrono_tz::Tz;
use clap::Parser;
use co2meter::report::OutputFormat;

/// Polls a USB CO2 meter and prints temperature and CO2 readings.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// HID raw device, e.g. /dev/hidraw0
    #[arg(env = "CO2METER_DEVICE", value_parser = parse_device)]
    pub device: PathBuf,

    /// Polling interval in seconds
    #[arg(long, env = "CO2METER_INTERVAL", default_value = "5")]
    pub interval: NonZeroU64,

    /// Output format: json or log
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,
}

fn parse_device(s: &str) -> Result<PathBuf, String> {
    if s.trim().is_empty() {
        return Err("device path must not be empty".to_string());
    }
    Ok(PathBuf::from(s))
}
