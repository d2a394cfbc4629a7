//! Telemetry sample supplied by the sensor collaborator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel names shared by sample conversion and frame layouts.
pub mod channel {
    pub const FLIGHT_STATE: &str = "flight_state";
    pub const ERROR_FLAGS: &str = "error_flags";
    pub const ACCEL_X: &str = "accel_x";
    pub const ACCEL_Y: &str = "accel_y";
    pub const ACCEL_Z: &str = "accel_z";
    pub const GYRO_X: &str = "gyro_x";
    pub const GYRO_Y: &str = "gyro_y";
    pub const GYRO_Z: &str = "gyro_z";
    pub const ROLL: &str = "roll";
    pub const PITCH: &str = "pitch";
    pub const YAW: &str = "yaw";
    pub const ALTITUDE: &str = "altitude";
    pub const TEMPERATURE: &str = "temperature";
    pub const VOLTAGE: &str = "voltage";
    pub const RESERVED: &str = "reserved";
}

/// Error flag bits carried in the 6-bit error field.
pub mod error_flags {
    pub const MPU_MAIN: u8 = 0x01;
    pub const MPU_AUX: u8 = 0x02;
    pub const BARO: u8 = 0x04;
    pub const GPIO: u8 = 0x08;
    pub const RADIO: u8 = 0x10;
    pub const STORAGE: u8 = 0x20;
}

/// Named channel values in engineering units, keyed by channel name.
pub type FieldValues = BTreeMap<&'static str, f64>;

/// Error flag set reported by the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorFlags(pub u8);

impl ErrorFlags {
    /// Create a flag set from raw bits.
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set.
    pub fn is_set(&self, bit: u32) -> bool {
        bit < 8 && (self.0 & (1 << bit)) != 0
    }

    /// Check if any bit of `flag` is set.
    pub fn has_flag(&self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Set the bits of `flag`.
    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Get the raw value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Three-axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Fused orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// One complete sensor reading, read-only input to the frame codec.
///
/// Units: acceleration in g, angular rate in deg/s, attitude in degrees,
/// altitude in metres, temperature in degrees Celsius, supply in volts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySample {
    /// Flight profile state code.
    pub flight_state: u8,
    /// Subsystem error bits.
    pub error_flags: ErrorFlags,
    pub accel: Axes,
    pub gyro: Axes,
    pub attitude: Attitude,
    pub altitude: f64,
    pub temperature: f64,
    pub voltage: f64,
}

impl TelemetrySample {
    /// Flatten into named channel values.
    pub fn to_values(&self) -> FieldValues {
        use channel::*;
        BTreeMap::from([
            (FLIGHT_STATE, f64::from(self.flight_state)),
            (ERROR_FLAGS, f64::from(self.error_flags.value())),
            (ACCEL_X, self.accel.x),
            (ACCEL_Y, self.accel.y),
            (ACCEL_Z, self.accel.z),
            (GYRO_X, self.gyro.x),
            (GYRO_Y, self.gyro.y),
            (GYRO_Z, self.gyro.z),
            (ROLL, self.attitude.roll),
            (PITCH, self.attitude.pitch),
            (YAW, self.attitude.yaw),
            (ALTITUDE, self.altitude),
            (TEMPERATURE, self.temperature),
            (VOLTAGE, self.voltage),
            (RESERVED, 0.0),
        ])
    }

    /// Rebuild a sample from named channel values; missing channels read as zero.
    pub fn from_values(values: &FieldValues) -> Self {
        use channel::*;
        let get = |name: &str| values.get(name).copied().unwrap_or(0.0);
        Self {
            flight_state: get(FLIGHT_STATE) as u8,
            error_flags: ErrorFlags(get(ERROR_FLAGS) as u8),
            accel: Axes::new(get(ACCEL_X), get(ACCEL_Y), get(ACCEL_Z)),
            gyro: Axes::new(get(GYRO_X), get(GYRO_Y), get(GYRO_Z)),
            attitude: Attitude::new(get(ROLL), get(PITCH), get(YAW)),
            altitude: get(ALTITUDE),
            temperature: get(TEMPERATURE),
            voltage: get(VOLTAGE),
        }
    }
}

impl fmt::Display for TelemetrySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FPS = {}", self.flight_state)?;
        writeln!(f, "err = {:06b}", self.error_flags.value())?;
        writeln!(f, " Ax = {:.1}", self.accel.x)?;
        writeln!(f, " Ay = {:.1}", self.accel.y)?;
        writeln!(f, " Az = {:.1}", self.accel.z)?;
        writeln!(f, " Gx = {}", self.gyro.x)?;
        writeln!(f, " Gy = {}", self.gyro.y)?;
        writeln!(f, " Gz = {}", self.gyro.z)?;
        writeln!(f, "rol = {}", self.attitude.roll)?;
        writeln!(f, "pit = {}", self.attitude.pitch)?;
        writeln!(f, "yaw = {}", self.attitude.yaw)?;
        writeln!(f, "alt = {}", self.altitude)?;
        writeln!(f, " C  = {}", self.temperature)?;
        write!(f, " V  = {:.1}", self.voltage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_channel_map() {
        let sample = TelemetrySample {
            flight_state: 3,
            error_flags: ErrorFlags(error_flags::BARO | error_flags::RADIO),
            accel: Axes::new(0.5, -1.2, 9.8),
            gyro: Axes::new(10.0, -20.0, 1500.0),
            attitude: Attitude::new(45.0, -12.0, 170.0),
            altitude: 1234.0,
            temperature: -5.0,
            voltage: 12.6,
        };
        let values = sample.to_values();
        assert_eq!(values.len(), 15);
        assert_eq!(values[channel::RESERVED], 0.0);
        assert_eq!(TelemetrySample::from_values(&values), sample);
    }

    #[test]
    fn missing_channels_read_as_zero() {
        let sample = TelemetrySample::from_values(&FieldValues::new());
        assert_eq!(sample, TelemetrySample::default());
    }

    #[test]
    fn error_flag_operations() {
        let mut flags = ErrorFlags::new(0);
        flags.insert(error_flags::MPU_AUX);
        assert!(flags.is_set(1));
        assert!(!flags.is_set(0));
        assert!(!flags.is_set(40));
        assert!(flags.has_flag(error_flags::MPU_AUX | error_flags::BARO));
        assert!(!flags.has_flag(error_flags::BARO));
    }

    #[test]
    fn display_matches_ground_readout() {
        let sample = TelemetrySample { voltage: 12.0, ..Default::default() };
        let text = sample.to_string();
        assert!(text.starts_with("FPS = 0\n"));
        assert!(text.contains("err = 000000"));
        assert!(text.ends_with(" V  = 12.0"));
    }

    #[test]
    fn samples_deserialize_with_defaults() {
        let yaml = "flight_state: 2\naccel: { x: 0.1, y: 0.2, z: 1.0 }\naltitude: 300.0\n";
        let sample: TelemetrySample = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(sample.flight_state, 2);
        assert_eq!(sample.accel.z, 1.0);
        assert_eq!(sample.gyro, Axes::default());
        assert_eq!(sample.altitude, 300.0);
    }
}
