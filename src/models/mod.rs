use serde::{Deserialize, Serialize};

/// Topic suffixes the readings are published under, below the configured
/// base topic.
pub const TOPIC_CURRENT_POWER: &str = "power/current";
pub const TOPIC_TOTAL_ENERGY: &str = "power/total";

/// A normalized meter reading: scaler already applied, unit resolved to a
/// display string. `unit` is `None` when the meter sent the row without a
/// unit annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: Option<String>,
}

impl Measurement {
    /// Render for publishing with exactly one fractional digit. Display
    /// rounding only, the stored value keeps full precision.
    pub fn format(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{:.1} {}", self.value, unit),
            None => format!("{:.1}", self.value),
        }
    }
}

/// The two readings extracted per frame. Each slot is independently
/// optional; a slot stays `None` when the frame had no matching entry,
/// which is distinct from a true zero reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerReadings {
    pub current_power: Option<Measurement>,
    pub total_energy: Option<Measurement>,
}

impl PowerReadings {
    pub fn is_empty(&self) -> bool {
        self.current_power.is_none() && self.total_energy.is_none()
    }

    /// (topic suffix, formatted value) pairs for every present reading.
    pub fn publications(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(measurement) = &self.current_power {
            out.push((TOPIC_CURRENT_POWER, measurement.format()));
        }
        if let Some(measurement) = &self.total_energy {
            out.push((TOPIC_TOTAL_ENERGY, measurement.format()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_unit() {
        let measurement = Measurement {
            value: 163.5,
            unit: Some("W".to_string()),
        };
        assert_eq!(measurement.format(), "163.5 W");
    }

    #[test]
    fn test_format_without_unit() {
        let measurement = Measurement {
            value: 12374148.4,
            unit: None,
        };
        assert_eq!(measurement.format(), "12374148.4");
    }

    #[test]
    fn test_format_rounds_to_one_digit() {
        let measurement = Measurement {
            value: 163.0,
            unit: Some("W".to_string()),
        };
        assert_eq!(measurement.format(), "163.0 W");
    }

    #[test]
    fn test_publications_skip_absent_slots() {
        let readings = PowerReadings {
            current_power: Some(Measurement {
                value: 163.5,
                unit: Some("W".to_string()),
            }),
            total_energy: None,
        };
        assert_eq!(
            readings.publications(),
            vec![(TOPIC_CURRENT_POWER, "163.5 W".to_string())]
        );
    }

    #[test]
    fn test_empty_readings() {
        let readings = PowerReadings::default();
        assert!(readings.is_empty());
        assert!(readings.publications().is_empty());
    }
}
