//! Boundary to the host platform's location service.

use crate::error::Result;
use crate::events::FixSubscription;
use crate::models::{Fix, Provider};

/// What the listener needs from the platform.
///
/// Implementations decide how permissions are checked and how fixes are
/// produced. The listener only ever talks to the platform through this trait.
pub trait LocationService: Send + Sync {
    /// Whether fine or coarse location access has been granted.
    fn has_permission(&self) -> bool;

    fn is_provider_enabled(&self, provider: Provider) -> bool;

    /// The provider's cached fix from before this process subscribed.
    fn last_known_fix(&self, provider: Provider) -> Option<Fix>;

    /// Starts delivering events from `provider`.
    fn subscribe(&self, provider: Provider) -> Result<FixSubscription>;

    /// Stops delivery for every active subscription.
    fn unsubscribe(&self);
}
