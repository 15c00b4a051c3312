//! Data models for the irrigation telemetry pipeline.
//!
//! Every measured quantity is an `Option<f64>`: `None` is the "no value"
//! marker for a field the device did not report. NaN is never used to mean
//! missing.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

/// One slot of the device's comma-separated reading vector, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Soil1,
    Soil2,
    Soil3,
    Soil4,
    ExtTempC,
    ExtRh,
    ExtTempF,
    IntTempC,
    IntRh,
    IntTempF,
    Flow1,
    Flow2,
}

impl Channel {
    /// All channels in the order the device transmits them.
    pub const ALL: [Channel; 12] = [
        Channel::Soil1,
        Channel::Soil2,
        Channel::Soil3,
        Channel::Soil4,
        Channel::ExtTempC,
        Channel::ExtRh,
        Channel::ExtTempF,
        Channel::IntTempC,
        Channel::IntRh,
        Channel::IntTempF,
        Channel::Flow1,
        Channel::Flow2,
    ];

    /// Column name used in the persisted log and CSV export.
    pub fn name(self) -> &'static str {
        // ---
        match self {
            Channel::Soil1 => "Soil1",
            Channel::Soil2 => "Soil2",
            Channel::Soil3 => "Soil3",
            Channel::Soil4 => "Soil4",
            Channel::ExtTempC => "ExtTemp_C",
            Channel::ExtRh => "ExtRH",
            Channel::ExtTempF => "ExtTemp_F",
            Channel::IntTempC => "IntTemp_C",
            Channel::IntRh => "IntRH",
            Channel::IntTempF => "IntTemp_F",
            Channel::Flow1 => "Flow1",
            Channel::Flow2 => "Flow2",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One polled sample from the field device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    // ---
    pub timestamp: DateTime<Utc>,
    pub soil1: Option<f64>,
    pub soil2: Option<f64>,
    pub soil3: Option<f64>,
    pub soil4: Option<f64>,
    pub ext_temp_c: Option<f64>,
    pub ext_rh: Option<f64>,
    pub ext_temp_f: Option<f64>,
    pub int_temp_c: Option<f64>,
    pub int_rh: Option<f64>,
    pub int_temp_f: Option<f64>,
    pub flow1: Option<f64>,
    pub flow2: Option<f64>,
    /// Source text of each token as received, indexed by channel.
    #[serde(skip)]
    raw_tokens: [Option<String>; 12],
}

impl SensorReading {
    /// A reading with every field missing.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        // ---
        SensorReading {
            timestamp,
            soil1: None,
            soil2: None,
            soil3: None,
            soil4: None,
            ext_temp_c: None,
            ext_rh: None,
            ext_temp_f: None,
            int_temp_c: None,
            int_rh: None,
            int_temp_f: None,
            flow1: None,
            flow2: None,
            raw_tokens: Default::default(),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        // ---
        match channel {
            Channel::Soil1 => self.soil1,
            Channel::Soil2 => self.soil2,
            Channel::Soil3 => self.soil3,
            Channel::Soil4 => self.soil4,
            Channel::ExtTempC => self.ext_temp_c,
            Channel::ExtRh => self.ext_rh,
            Channel::ExtTempF => self.ext_temp_f,
            Channel::IntTempC => self.int_temp_c,
            Channel::IntRh => self.int_rh,
            Channel::IntTempF => self.int_temp_f,
            Channel::Flow1 => self.flow1,
            Channel::Flow2 => self.flow2,
        }
    }

    /// Overwrite one field. Any source text kept for it is dropped.
    pub fn set(&mut self, channel: Channel, value: Option<f64>) {
        // ---
        self.raw_tokens[channel as usize] = None;
        let slot = match channel {
            Channel::Soil1 => &mut self.soil1,
            Channel::Soil2 => &mut self.soil2,
            Channel::Soil3 => &mut self.soil3,
            Channel::Soil4 => &mut self.soil4,
            Channel::ExtTempC => &mut self.ext_temp_c,
            Channel::ExtRh => &mut self.ext_rh,
            Channel::ExtTempF => &mut self.ext_temp_f,
            Channel::IntTempC => &mut self.int_temp_c,
            Channel::IntRh => &mut self.int_rh,
            Channel::IntTempF => &mut self.int_temp_f,
            Channel::Flow1 => &mut self.flow1,
            Channel::Flow2 => &mut self.flow2,
        };
        *slot = value;
    }

    /// Record the token text a field was parsed from.
    pub fn set_parsed(&mut self, channel: Channel, value: Option<f64>, token: &str) {
        // ---
        self.set(channel, value);
        self.raw_tokens[channel as usize] = Some(token.to_string());
    }

    /// Re-encode the reading in the device's wire format.
    ///
    /// Fields parsed from a payload come back as their exact source text;
    /// other fields are formatted from their value, missing ones empty.
    pub fn to_payload(&self) -> String {
        // ---
        Channel::ALL
            .iter()
            .map(|&ch| match &self.raw_tokens[ch as usize] {
                Some(token) => token.clone(),
                None => format_value(self.get(ch)),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Render an optional value as a delimited-text cell.
pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Current conditions block of a forecast response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub time: Option<DateTime<Utc>>,
    pub temperature_c: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub rain_mm: Option<f64>,
    pub is_day: Option<bool>,
}

/// One hourly forecast point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub relative_humidity: Option<f64>,
}

/// Result of one forecast fetch.
///
/// `hourly` is sorted by timestamp ascending; the nearest-sample lookup in
/// [`crate::enrich`] relies on this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    // ---
    pub latitude: f64,
    pub longitude: f64,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlySample>,
    /// Daily shortwave radiation sums, MJ/m².
    pub daily_radiation_mj_m2: Vec<Option<f64>>,
}

impl WeatherSnapshot {
    /// Today's shortwave radiation sum converted to kWh/m²/day.
    pub fn radiation_kwh_m2_day(&self) -> Option<f64> {
        // ---
        self.daily_radiation_mj_m2
            .first()
            .copied()
            .flatten()
            .map(|mj| mj / 3.6)
    }
}

/// A sensor reading joined with the nearest hourly forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReading {
    // ---
    #[serde(flatten)]
    pub reading: SensorReading,
    pub forecast_temp: Option<f64>,
    pub forecast_rh: Option<f64>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 8, 13, 50, 0).unwrap()
    }

    #[test]
    fn test_get_and_set_cover_every_channel() {
        // ---
        let mut reading = SensorReading::empty(ts());
        for (i, ch) in Channel::ALL.iter().enumerate() {
            reading.set(*ch, Some(i as f64));
        }
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(reading.get(*ch), Some(i as f64), "channel {} mismatch", ch);
        }
        assert_eq!(reading.soil1, Some(0.0));
        assert_eq!(reading.flow2, Some(11.0));
    }

    #[test]
    fn test_payload_renders_missing_as_empty() {
        // ---
        let mut reading = SensorReading::empty(ts());
        reading.soil1 = Some(45.5);
        reading.flow2 = Some(3.2);

        assert_eq!(reading.to_payload(), "45.5,,,,,,,,,,,3.2");
    }

    #[test]
    fn test_set_drops_parsed_token_text() {
        // ---
        let mut reading = SensorReading::empty(ts());
        reading.set_parsed(Channel::Soil1, Some(45.0), "45.0");
        assert!(reading.to_payload().starts_with("45.0,"));

        reading.set(Channel::Soil1, Some(46.5));
        assert!(reading.to_payload().starts_with("46.5,"));
    }

    #[test]
    fn test_radiation_converts_megajoules_to_kwh() {
        // ---
        let snapshot = WeatherSnapshot {
            latitude: 31.6,
            longitude: 65.7,
            current: CurrentConditions::default(),
            hourly: Vec::new(),
            daily_radiation_mj_m2: vec![Some(18.0), Some(20.0)],
        };
        let kwh = snapshot.radiation_kwh_m2_day().unwrap();
        assert!((kwh - 5.0).abs() < 1e-12, "expected 5.0 kWh, got {}", kwh);

        let empty = WeatherSnapshot {
            daily_radiation_mj_m2: vec![None],
            ..snapshot
        };
        assert_eq!(empty.radiation_kwh_m2_day(), None);
    }
}
