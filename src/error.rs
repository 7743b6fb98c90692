use crate::models::Provider;
use thiserror::Error;

/// Failures surfaced by the listener and the platform boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission has not been granted")]
    PermissionDenied,
    #[error("no location provider is enabled")]
    NoProviderEnabled,
    #[error("location updates have not been requested")]
    NotTracking,
    #[error("no location fix is available")]
    NoData,
    #[error("could not subscribe to the {provider} provider: {reason}")]
    Subscription { provider: Provider, reason: String },
    #[error("invalid track: {0}")]
    Track(String),
}

pub type Result<T> = std::result::Result<T, LocationError>;
