//! Daily crop water demand from averaged climate inputs.
//!
//! Empirical reference evapotranspiration model with the deployment site's
//! elevation and daytime wind speed fixed. Inputs are not validated; out of
//! range or degenerate inputs yield whatever non-finite value the
//! arithmetic produces.

use serde::{Deserialize, Serialize};

use crate::models::EnrichedReading;

// ---

/// Site elevation above sea level, feet (1,010 m).
pub const SITE_ELEVATION_FT: f64 = 3310.0;

/// Assumed daytime wind speed, mph.
pub const DAYTIME_WIND_SPEED_MPH: f64 = 2.0;

const MM_PER_INCH: f64 = 25.4;

/// Estimate crop water demand in mm/day.
///
/// * `temp_c` - mean air temperature, °C
/// * `radiation_kwh_m2_day` - mean solar radiation, kWh/m²/day
/// * `rh_pct` - mean relative humidity, %
/// * `crop_coeff` - dimensionless crop coefficient
pub fn estimate(temp_c: f64, radiation_kwh_m2_day: f64, rh_pct: f64, crop_coeff: f64) -> f64 {
    // ---
    let t_f = temp_c * 9.0 / 5.0 + 32.0;
    let radiation = 85.98 * radiation_kwh_m2_day;

    // latent heat of vaporization
    let lambda = 1543.0 - 0.796 * t_f;

    // slope of the vapor pressure curve
    let delta = 0.051 * ((164.8 + t_f) / 157.0).powi(7);

    let pressure = 1.013 * (1.0 - SITE_ELEVATION_FT / 145_350.0).powf(5.26);
    let gamma = 0.339 * pressure / (0.622 * lambda);

    let w = DAYTIME_WIND_SPEED_MPH;
    let b_r = 1.06 - 0.0013 * rh_pct + 8.38e-4 * w - 3.73e-6 * rh_pct * w - 0.315e-4 * rh_pct.powi(2)
        - 3.82e-7 * w.powi(2);

    // inches/day
    let et = -0.012 + (delta / (delta + gamma)) * b_r * radiation / lambda;

    crop_coeff * et * MM_PER_INCH
}

/// Averaged climate inputs for one estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropWaterInputs {
    pub temp_c: f64,
    pub radiation_kwh_m2_day: f64,
    pub rh_pct: f64,
    pub crop_coeff: f64,
}

impl CropWaterInputs {
    pub fn estimate(&self) -> f64 {
        estimate(self.temp_c, self.radiation_kwh_m2_day, self.rh_pct, self.crop_coeff)
    }

    /// Average external temperature and humidity over `readings`, skipping
    /// missing values. `None` when either has no samples.
    pub fn from_readings(
        readings: &[EnrichedReading],
        radiation_kwh_m2_day: f64,
        crop_coeff: f64,
    ) -> Option<Self> {
        // ---
        let temp_c = mean(readings.iter().filter_map(|r| r.reading.ext_temp_c))?;
        let rh_pct = mean(readings.iter().filter_map(|r| r.reading.ext_rh))?;
        Some(Self {
            temp_c,
            radiation_kwh_m2_day,
            rh_pct,
            crop_coeff,
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
