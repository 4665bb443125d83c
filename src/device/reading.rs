use std::fmt;

use crate::device::DecryptedFrame;

const CO2_OPERATION: u8 = 0x50;
const TEMPERATURE_OPERATION: u8 = 0x42;
const HUMIDITY_OPERATION: u8 = 0x44;

// 273.15 K in eighths of a tenth of a degree.
const KELVIN_OFFSET_EIGHTH_DECI: i32 = 21852;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCode {
    Co2,
    Temperature,
    Humidity,
    Unknown(u8),
}

impl OperationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCode::Co2 => "co2",
            OperationCode::Temperature => "temperature",
            OperationCode::Humidity => "humidity",
            OperationCode::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for OperationCode {
    fn from(v: u8) -> Self {
        match v {
            CO2_OPERATION => OperationCode::Co2,
            TEMPERATURE_OPERATION => OperationCode::Temperature,
            HUMIDITY_OPERATION => OperationCode::Humidity,
            other => OperationCode::Unknown(other),
        }
    }
}

/// Temperature in tenths of a degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature {
    deci_celsius: i32,
}

impl Temperature {
    /// Converts the sensor's raw value (Kelvin * 16) to Celsius, rounding
    /// half away from zero to one decimal place.
    pub fn from_raw(raw: u16) -> Self {
        // raw / 16 K == raw * 5 / 8 tenths of a degree
        let eighths = raw as i32 * 5 - KELVIN_OFFSET_EIGHTH_DECI;
        Self {
            deci_celsius: (eighths.abs() + 4) / 8 * eighths.signum(),
        }
    }

    pub fn from_deci_celsius(deci_celsius: i32) -> Self {
        Self { deci_celsius }
    }

    pub fn deci_celsius(&self) -> i32 {
        self.deci_celsius
    }

    pub fn celsius(&self) -> f64 {
        self.deci_celsius as f64 / 10.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.deci_celsius < 0 { "-" } else { "" };
        let abs = self.deci_celsius.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorReading {
    Co2 { ppm: u16 },
    Temperature(Temperature),
    Humidity { percent: u16 },
    Unknown { operation: u8, value: u16 },
}

/// Maps a checksum-validated frame to a reading.
pub fn interpret(frame: &DecryptedFrame) -> SensorReading {
    let value = frame.value();
    match OperationCode::from(frame.operation()) {
        OperationCode::Co2 => SensorReading::Co2 { ppm: value },
        OperationCode::Temperature => SensorReading::Temperature(Temperature::from_raw(value)),
        OperationCode::Humidity => SensorReading::Humidity { percent: value },
        OperationCode::Unknown(operation) => SensorReading::Unknown { operation, value },
    }
}
