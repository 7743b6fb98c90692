use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Cell tower / Wi-Fi based positioning.
    Network,
    /// Satellite positioning.
    Gps,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Gps => write!(f, "gps"),
        }
    }
}

/// One reported location sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub provider: Provider,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in metres. Lower is better.
    pub accuracy: f32,
    /// Milliseconds since the Unix epoch, as reported by the platform clock.
    pub timestamp: i64,
}

impl Fix {
    pub fn new(provider: Provider, latitude: f64, longitude: f64, accuracy: f32, timestamp: i64) -> Self {
        Self {
            provider,
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    /// Timestamp as a UTC date, if it falls in chrono's range.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}) ±{:.0}m via {}",
            self.latitude, self.longitude, self.accuracy, self.provider
        )?;
        match self.time() {
            Some(t) => write!(f, " at {}", t.to_rfc3339()),
            None => write!(f, " at t={}", self.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::Gps).unwrap(), "\"gps\"");
        let p: Provider = serde_json::from_str("\"network\"").unwrap();
        assert_eq!(p, Provider::Network);
        assert_eq!(Provider::Network.to_string(), "network");
    }

    #[test]
    fn fix_display_includes_time() {
        let fix = Fix::new(Provider::Gps, 37.7749, -122.4194, 12.0, 0);
        let text = fix.to_string();
        assert!(text.starts_with("(37.774900, -122.419400) ±12m via gps"));
        assert!(text.contains("1970-01-01T00:00:00"));
    }
}
