//! Joins a sensor reading with the temporally nearest hourly forecast point.

use crate::models::{EnrichedReading, HourlySample, SensorReading, WeatherSnapshot};

// ---

/// Attach forecast temperature and humidity to `reading`.
///
/// Without a snapshot, or with an empty hourly series, both forecast fields
/// stay missing. There is no distance bound: a reading far outside the
/// forecast window still takes the chronologically nearest point.
pub fn join(reading: SensorReading, snapshot: Option<&WeatherSnapshot>) -> EnrichedReading {
    // ---
    let nearest = snapshot.and_then(|s| nearest_sample(&s.hourly, &reading));

    EnrichedReading {
        forecast_temp: nearest.and_then(|s| s.temperature_c),
        forecast_rh: nearest.and_then(|s| s.relative_humidity),
        reading,
    }
}

/// Minimum absolute time difference; ties go to the earliest sample.
fn nearest_sample<'a>(hourly: &'a [HourlySample], reading: &SensorReading) -> Option<&'a HourlySample> {
    // ---
    let mut best: Option<(&HourlySample, u64)> = None;
    for sample in hourly {
        let distance = (sample.timestamp - reading.timestamp)
            .num_milliseconds()
            .unsigned_abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((sample, distance)),
        }
    }
    best.map(|(sample, _)| sample)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::CurrentConditions;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 8, 12, 0, 0).unwrap()
    }

    fn sample(offset_min: i64, temp: f64, rh: f64) -> HourlySample {
        HourlySample {
            timestamp: t0() + Duration::minutes(offset_min),
            temperature_c: Some(temp),
            relative_humidity: Some(rh),
        }
    }

    fn snapshot(hourly: Vec<HourlySample>) -> WeatherSnapshot {
        WeatherSnapshot {
            latitude: 31.62,
            longitude: 65.71,
            current: CurrentConditions::default(),
            hourly,
            daily_radiation_mj_m2: vec![Some(25.0)],
        }
    }

    fn reading_at(offset_min: i64) -> SensorReading {
        let mut reading = SensorReading::empty(t0() + Duration::minutes(offset_min));
        reading.soil1 = Some(55.0);
        reading
    }

    #[test]
    fn test_selects_nearest_hour() {
        // ---
        let snap = snapshot(vec![sample(0, 20.0, 40.0), sample(60, 21.0, 41.0), sample(120, 22.0, 42.0)]);

        // 50 min: 10 min from T0+1h versus 50 min from T0
        let enriched = join(reading_at(50), Some(&snap));
        assert_eq!(enriched.forecast_temp, Some(21.0));
        assert_eq!(enriched.forecast_rh, Some(41.0));
        assert_eq!(enriched.reading.soil1, Some(55.0), "reading must pass through");
    }

    #[test]
    fn test_tie_goes_to_earliest_sample() {
        // ---
        let snap = snapshot(vec![sample(0, 20.0, 40.0), sample(60, 21.0, 41.0)]);
        let enriched = join(reading_at(30), Some(&snap));
        assert_eq!(enriched.forecast_temp, Some(20.0));
    }

    #[test]
    fn test_distant_reading_still_joins() {
        // ---
        let snap = snapshot(vec![sample(0, 20.0, 40.0), sample(60, 21.0, 41.0)]);

        let later = join(reading_at(60 * 24 * 5), Some(&snap));
        assert_eq!(later.forecast_temp, Some(21.0));

        let earlier = join(reading_at(-60 * 24 * 3), Some(&snap));
        assert_eq!(earlier.forecast_temp, Some(20.0));
    }

    #[test]
    fn test_missing_snapshot_or_series_leaves_forecast_empty() {
        // ---
        let no_snapshot = join(reading_at(0), None);
        assert_eq!(no_snapshot.forecast_temp, None);
        assert_eq!(no_snapshot.forecast_rh, None);

        let empty = snapshot(Vec::new());
        let no_series = join(reading_at(0), Some(&empty));
        assert_eq!(no_series.forecast_temp, None);
        assert_eq!(no_series.forecast_rh, None);
    }

    #[test]
    fn test_missing_forecast_value_propagates() {
        // ---
        let mut point = sample(0, 20.0, 40.0);
        point.temperature_c = None;
        let snap = snapshot(vec![point]);

        let enriched = join(reading_at(5), Some(&snap));
        assert_eq!(enriched.forecast_temp, None);
        assert_eq!(enriched.forecast_rh, Some(40.0));
    }
}
