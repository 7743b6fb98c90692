//! Best-location tracking over platform location providers.
//!
//! A [`LocationListener`] subscribes to the network or GPS provider of a
//! [`LocationService`], keeps the most trustworthy [`Fix`] according to
//! [`filter::is_better_fix`], and answers latitude/longitude queries.

pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod listener;
pub mod logging;
pub mod models;
pub mod platform;
pub mod replay;

pub use error::LocationError;
pub use events::{FixEvent, FixSubscription};
pub use filter::{is_better_fix, select_fix, FilterPolicy};
pub use listener::LocationListener;
pub use models::{Fix, Provider};
pub use platform::LocationService;
pub use replay::ReplayService;
