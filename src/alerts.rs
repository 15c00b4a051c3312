//! Static operational bounds and the stateless threshold evaluator.
//!
//! Every call evaluates one reading on its own. A value hovering around a
//! bound alerts again on every cycle; there is no debounce.

use serde::Serialize;

use crate::models::{Channel, EnrichedReading};

// ---

/// How a downstream consumer should route an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Soil moisture out of band.
    Advisory,
    /// Flow out of band; likely a blocked or burst line.
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Breach {
    TooLow,
    TooHigh,
}

/// An inclusive operational band for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub channel: Channel,
    pub min: f64,
    pub max: f64,
    pub severity: Severity,
}

const fn soil(channel: Channel) -> Threshold {
    Threshold {
        channel,
        min: 40.0,
        max: 80.0,
        severity: Severity::Advisory,
    }
}

const fn flow(channel: Channel) -> Threshold {
    Threshold {
        channel,
        min: 0.10,
        max: 5.00,
        severity: Severity::Urgent,
    }
}

/// Fixed deployment thresholds.
pub const THRESHOLDS: [Threshold; 6] = [
    soil(Channel::Soil1),
    soil(Channel::Soil2),
    soil(Channel::Soil3),
    soil(Channel::Soil4),
    flow(Channel::Flow1),
    flow(Channel::Flow2),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    // ---
    pub severity: Severity,
    pub breach: Breach,
    pub message: String,
    pub field: Channel,
    pub value: f64,
    /// The bound that was crossed.
    pub threshold: f64,
}

impl Threshold {
    /// Check one value; `None` when the value is inside `[min, max]`.
    pub fn check(&self, value: f64) -> Option<AlertEvent> {
        // ---
        let (breach, bound, word) = if value < self.min {
            (Breach::TooLow, self.min, "too low")
        } else if value > self.max {
            (Breach::TooHigh, self.max, "too high")
        } else {
            return None;
        };

        Some(AlertEvent {
            severity: self.severity,
            breach,
            message: format!("{} {}: {} (limit {})", self.channel, word, value, bound),
            field: self.channel,
            value,
            threshold: bound,
        })
    }
}

/// Evaluate every configured threshold against `reading`.
///
/// Missing fields are not evaluated, so this never fails.
pub fn evaluate(reading: &EnrichedReading) -> Vec<AlertEvent> {
    // ---
    THRESHOLDS
        .iter()
        .filter_map(|t| reading.reading.get(t.channel).and_then(|v| t.check(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::SensorReading;
    use chrono::{TimeZone, Utc};

    fn enriched(set: &[(Channel, f64)]) -> EnrichedReading {
        // ---
        let mut reading = SensorReading::empty(Utc.with_ymd_and_hms(2025, 5, 8, 12, 0, 0).unwrap());
        for (ch, v) in set {
            reading.set(*ch, Some(*v));
        }
        EnrichedReading {
            reading,
            forecast_temp: None,
            forecast_rh: None,
        }
    }

    #[test]
    fn test_soil_bounds_are_inclusive() {
        // ---
        assert!(evaluate(&enriched(&[(Channel::Soil1, 40.0)])).is_empty());
        assert!(evaluate(&enriched(&[(Channel::Soil1, 80.0)])).is_empty());

        let low = evaluate(&enriched(&[(Channel::Soil1, 39.9)]));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].breach, Breach::TooLow);
        assert_eq!(low[0].threshold, 40.0);
        assert_eq!(low[0].severity, Severity::Advisory);

        let high = evaluate(&enriched(&[(Channel::Soil1, 80.1)]));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].breach, Breach::TooHigh);
        assert_eq!(high[0].threshold, 80.0);
    }

    #[test]
    fn test_flow_bounds_are_inclusive() {
        // ---
        assert!(evaluate(&enriched(&[(Channel::Flow1, 0.10), (Channel::Flow2, 5.00)])).is_empty());
        assert!(evaluate(&enriched(&[(Channel::Flow1, 5.00), (Channel::Flow2, 0.10)])).is_empty());

        let low = evaluate(&enriched(&[(Channel::Flow1, 0.09)]));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].breach, Breach::TooLow);
        assert_eq!(low[0].threshold, 0.10);
        assert_eq!(low[0].severity, Severity::Urgent);

        let high = evaluate(&enriched(&[(Channel::Flow2, 5.01)]));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].breach, Breach::TooHigh);
        assert_eq!(high[0].threshold, 5.00);
    }

    #[test]
    fn test_all_missing_produces_no_alerts() {
        // ---
        assert!(evaluate(&enriched(&[])).is_empty());
    }

    #[test]
    fn test_flow_breaches_are_urgent() {
        // ---
        let alerts = evaluate(&enriched(&[(Channel::Flow1, 0.05), (Channel::Flow2, 5.5)]));
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.severity == Severity::Urgent));
        assert_eq!(alerts[0].field, Channel::Flow1);
        assert_eq!(alerts[0].breach, Breach::TooLow);
        assert_eq!(alerts[1].field, Channel::Flow2);
        assert_eq!(alerts[1].breach, Breach::TooHigh);
    }

    #[test]
    fn test_each_field_evaluated_independently() {
        // ---
        let alerts = evaluate(&enriched(&[
            (Channel::Soil1, 10.0),
            (Channel::Soil2, 90.0),
            (Channel::Soil3, 20.0),
            (Channel::Soil4, 95.0),
            (Channel::Flow1, 0.0),
            (Channel::Flow2, 9.0),
            // untracked channels never alert
            (Channel::ExtTempC, 60.0),
        ]));
        assert_eq!(alerts.len(), 6);
        let fields: Vec<Channel> = alerts.iter().map(|a| a.field).collect();
        assert_eq!(
            fields,
            vec![Channel::Soil1, Channel::Soil2, Channel::Soil3, Channel::Soil4, Channel::Flow1, Channel::Flow2]
        );
    }

    #[test]
    fn test_repeated_evaluation_refires() {
        // ---
        let reading = enriched(&[(Channel::Soil2, 39.0)]);
        assert_eq!(evaluate(&reading), evaluate(&reading));
        assert_eq!(evaluate(&reading).len(), 1);
    }

    #[test]
    fn test_message_names_field_and_bound() {
        // ---
        let alerts = evaluate(&enriched(&[(Channel::Flow1, 0.05)]));
        assert_eq!(alerts[0].message, "Flow1 too low: 0.05 (limit 0.1)");
        assert_eq!(alerts[0].value, 0.05);
    }
}
