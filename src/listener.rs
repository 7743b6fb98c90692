//! Best-location tracking on top of a [`LocationService`].
//!
//! [`LocationListener`] registers for updates from one provider, runs every
//! incoming fix through [`filter::is_better_fix`](crate::filter::is_better_fix)
//! and keeps the winner. Callers read the result through
//! [`latitude`](LocationListener::latitude) and
//! [`longitude`](LocationListener::longitude), which fall back to the
//! platform's last-known fix before any update has arrived.

use crate::error::{LocationError, Result};
use crate::events::{FixEvent, FixSubscription};
use crate::filter::{select_fix, FilterPolicy};
use crate::models::{Fix, Provider};
use crate::platform::LocationService;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const PERMISSION_HINT: &str = "Check to see if your location permissions have been enabled.";

#[derive(Debug, Default)]
struct TrackerState {
    best: Option<Fix>,
    previous: Option<Fix>,
    provider: Option<Provider>,
    // Set by the first successful init, never cleared.
    requested: bool,
}

/// Tracks the best fix reported by a location service.
///
/// Cloning yields another handle to the same tracker, so one clone can drive
/// the event stream while others read coordinates.
pub struct LocationListener<S> {
    service: Arc<S>,
    policy: FilterPolicy,
    state: Arc<Mutex<TrackerState>>,
}

impl<S> Clone for LocationListener<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            policy: self.policy,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: LocationService> LocationListener<S> {
    pub fn new(service: Arc<S>, policy: FilterPolicy) -> Self {
        Self {
            service,
            policy,
            state: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests location updates.
    ///
    /// The network provider is preferred; GPS is used when the network
    /// provider is off. The returned subscription must be driven with
    /// [`listen`](Self::listen) or [`spawn`](Self::spawn) for fixes to be
    /// tracked.
    ///
    /// # Errors
    ///
    /// [`LocationError::PermissionDenied`] without location permission,
    /// [`LocationError::NoProviderEnabled`] when both providers are off, or
    /// whatever the service reports when subscribing fails.
    pub fn init(&self) -> Result<FixSubscription> {
        if !self.service.has_permission() {
            error!("{}", PERMISSION_HINT);
            return Err(LocationError::PermissionDenied);
        }

        let provider = [Provider::Network, Provider::Gps]
            .into_iter()
            .find(|p| self.service.is_provider_enabled(*p))
            .ok_or_else(|| {
                error!("No location provider is enabled. {}", PERMISSION_HINT);
                LocationError::NoProviderEnabled
            })?;

        info!("Requesting location updates for {} provider", provider);
        let subscription = self.service.subscribe(provider)?;
        let mut state = self.state();
        state.provider = Some(provider);
        state.requested = true;
        Ok(subscription)
    }

    /// Stops location updates.
    ///
    /// The best fix found so far is kept, and the getters keep falling back
    /// to last-known fixes.
    pub fn unregister(&self) -> Result<()> {
        if !self.service.has_permission() {
            error!("{}", PERMISSION_HINT);
            return Err(LocationError::PermissionDenied);
        }
        self.service.unsubscribe();
        if let Some(provider) = self.state().provider.take() {
            info!("Removed location updates for {} provider", provider);
        }
        Ok(())
    }

    /// Feeds one fix through the quality filter.
    ///
    /// The fix is compared against the previously received fix, the winner
    /// becomes the best fix, and the incoming fix becomes the next baseline.
    pub fn on_fix(&self, fix: Fix) {
        let mut state = self.state();
        let best = select_fix(state.previous.as_ref(), &fix, &self.policy);
        if state.best != Some(best) {
            debug!("Best location is now {}", best);
        }
        state.best = Some(best);
        state.previous = Some(fix);
    }

    pub fn handle_event(&self, event: FixEvent) {
        match event {
            FixEvent::Location(fix) => self.on_fix(fix),
            FixEvent::StatusChanged { provider, status } => {
                debug!("{} provider status changed to {}", provider, status);
            }
            FixEvent::ProviderEnabled(provider) => info!("{} provider enabled", provider),
            FixEvent::ProviderDisabled(provider) => warn!("{} provider disabled", provider),
        }
    }

    /// Drains `subscription` until the provider stops sending.
    pub async fn listen(&self, mut subscription: FixSubscription) {
        while let Some(event) = subscription.next().await {
            self.handle_event(event);
        }
        debug!("{} subscription closed", subscription.provider());
    }

    /// Runs [`listen`](Self::listen) on a background task.
    pub fn spawn(&self, subscription: FixSubscription) -> JoinHandle<()>
    where
        S: 'static,
    {
        let listener = self.clone();
        tokio::spawn(async move { listener.listen(subscription).await })
    }

    /// The best fix seen on the event stream, if any.
    pub fn best_fix(&self) -> Option<Fix> {
        self.state().best
    }

    /// Whether [`init`](Self::init) succeeded and updates have not been removed since.
    pub fn is_tracking(&self) -> bool {
        self.state().provider.is_some()
    }

    pub fn active_provider(&self) -> Option<Provider> {
        self.state().provider
    }

    /// The fix that coordinates are read from.
    ///
    /// The best streamed fix when one exists, else the platform's last-known
    /// fix: GPS first, then network, each only when that provider is enabled.
    ///
    /// # Errors
    ///
    /// * [`LocationError::PermissionDenied`] - no streamed fix and no permission.
    /// * [`LocationError::NotTracking`] - no streamed fix and [`init`](Self::init)
    ///   has never succeeded.
    /// * [`LocationError::NoProviderEnabled`] - both providers are off.
    /// * [`LocationError::NoData`] - the enabled providers have no cached fix.
    pub fn current_fix(&self) -> Result<Fix> {
        let (best, requested) = {
            let state = self.state();
            (state.best, state.requested)
        };
        if let Some(best) = best {
            return Ok(best);
        }

        if !self.service.has_permission() {
            error!("{}", PERMISSION_HINT);
            return Err(LocationError::PermissionDenied);
        }
        if !requested {
            error!("Location updates were never requested. {}", PERMISSION_HINT);
            return Err(LocationError::NotTracking);
        }

        let enabled: Vec<Provider> = [Provider::Gps, Provider::Network]
            .into_iter()
            .filter(|p| self.service.is_provider_enabled(*p))
            .collect();
        if enabled.is_empty() {
            return Err(LocationError::NoProviderEnabled);
        }

        enabled
            .into_iter()
            .find_map(|p| self.service.last_known_fix(p))
            .ok_or_else(|| {
                warn!("No location fix has been received yet");
                LocationError::NoData
            })
    }

    pub fn latitude(&self) -> Result<f64> {
        self.current_fix().map(|fix| fix.latitude)
    }

    pub fn longitude(&self) -> Result<f64> {
        self.current_fix().map(|fix| fix.longitude)
    }
}
