//! A [`LocationService`] that plays back a recorded track.
//!
//! Tracks are CSV files with a header row:
//!
//! ```text
//! provider,latitude,longitude,accuracy,time
//! network,37.7749,-122.4194,35,2024-03-01T12:00:00Z
//! gps,37.7751,-122.4190,8,1709294405000
//! ```
//!
//! `time` is either RFC 3339 or milliseconds since the Unix epoch.

use crate::error::{LocationError, Result};
use crate::events::{FixEvent, FixSubscription};
use crate::models::{Fix, Provider};
use crate::platform::LocationService;
use chrono::DateTime;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Deserialize)]
struct TrackRow {
    provider: Provider,
    latitude: f64,
    longitude: f64,
    accuracy: f32,
    time: String,
}

fn parse_time(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.timestamp_millis())
        .map_err(|e| LocationError::Track(format!("bad time '{}': {}", raw, e)))
}

/// Reads a track from CSV. Rows keep their file order.
pub fn load_track<R: Read>(reader: R) -> Result<Vec<Fix>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut fixes = Vec::new();
    for (i, result) in rdr.deserialize::<TrackRow>().enumerate() {
        // Header is line 1.
        let row = result.map_err(|e| LocationError::Track(format!("line {}: {}", i + 2, e)))?;
        let timestamp = parse_time(&row.time)?;
        fixes.push(Fix::new(row.provider, row.latitude, row.longitude, row.accuracy, timestamp));
    }
    Ok(fixes)
}

/// Replays a fixed list of fixes as if a platform were reporting them.
///
/// Permission, enabled providers and last-known fixes are set with the
/// builder methods. By default permission is granted, both providers are
/// enabled and nothing is cached.
pub struct ReplayService {
    track: Vec<Fix>,
    permission: bool,
    enabled: HashSet<Provider>,
    last_known: HashMap<Provider, Fix>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReplayService {
    pub fn new(track: Vec<Fix>) -> Self {
        Self {
            track,
            permission: true,
            enabled: [Provider::Network, Provider::Gps].into_iter().collect(),
            last_known: HashMap::new(),
            interval: Duration::ZERO,
            task: Mutex::new(None),
        }
    }

    /// Loads a CSV track from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| LocationError::Track(format!("{}: {}", path.display(), e)))?;
        let track = load_track(file)?;
        info!("Loaded {} fixes from {}", track.len(), path.display());
        Ok(Self::new(track))
    }

    pub fn with_permission(mut self, granted: bool) -> Self {
        self.permission = granted;
        self
    }

    /// Replaces the set of enabled providers.
    pub fn with_enabled(mut self, providers: &[Provider]) -> Self {
        self.enabled = providers.iter().copied().collect();
        self
    }

    pub fn with_last_known(mut self, fix: Fix) -> Self {
        self.last_known.insert(fix.provider, fix);
        self
    }

    /// Pause before each emitted fix.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn track(&self) -> &[Fix] {
        &self.track
    }

    fn stop_task(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        match task.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl LocationService for ReplayService {
    fn has_permission(&self) -> bool {
        self.permission
    }

    fn is_provider_enabled(&self, provider: Provider) -> bool {
        self.enabled.contains(&provider)
    }

    fn last_known_fix(&self, provider: Provider) -> Option<Fix> {
        self.last_known.get(&provider).copied()
    }

    fn subscribe(&self, provider: Provider) -> Result<FixSubscription> {
        if !self.permission {
            return Err(LocationError::PermissionDenied);
        }
        if !self.is_provider_enabled(provider) {
            return Err(LocationError::Subscription {
                provider,
                reason: "provider is disabled".to_string(),
            });
        }
        let runtime = Handle::try_current().map_err(|e| LocationError::Subscription {
            provider,
            reason: e.to_string(),
        })?;

        let (tx, subscription) = FixSubscription::channel(provider);
        let fixes: Vec<Fix> = self.track.iter().filter(|f| f.provider == provider).copied().collect();
        let interval = self.interval;

        let handle = runtime.spawn(async move {
            for fix in fixes {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(FixEvent::Location(fix)).is_err() {
                    break;
                }
            }
            debug!("Replay of {} provider finished", provider);
        });

        // One subscription at a time, like a single registered listener.
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = task.replace(handle) {
            old.abort();
        }
        Ok(subscription)
    }

    fn unsubscribe(&self) {
        if self.stop_task() {
            debug!("Replay stopped");
        }
    }
}
