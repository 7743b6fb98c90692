//! Fix events and the subscription that delivers them.
//!
//! This module defines the [`FixEvent`] enum, which mirrors the callbacks a
//! platform location listener receives (new fix, status change, provider
//! toggled), and the [`FixSubscription`] returned by
//! [`LocationService::subscribe`](crate::platform::LocationService::subscribe).
//! Producers hold the sender half; the listener drains the receiver with
//! [`FixSubscription::next`].

use crate::models::{Fix, Provider};
use tokio::sync::mpsc;

/// Events delivered by a location provider.
#[derive(Debug, Clone, PartialEq)]
pub enum FixEvent {
    /// A new location sample.
    Location(Fix),
    /// The provider reported a status change. `status` is platform specific.
    StatusChanged { provider: Provider, status: i32 },
    /// The user switched the provider on.
    ProviderEnabled(Provider),
    /// The user switched the provider off.
    ProviderDisabled(Provider),
}

/// Receiving end of a provider subscription.
///
/// Holds an unbounded channel: the sender can be cloned and handed to
/// whatever produces events (a replay task, a platform callback shim), while
/// the receiver is consumed by [`next`](FixSubscription::next). The stream
/// ends once every sender has been dropped, which is how unsubscribing is
/// observed on this side.
#[derive(Debug)]
pub struct FixSubscription {
    provider: Provider,
    rx: mpsc::UnboundedReceiver<FixEvent>,
}

impl FixSubscription {
    /// Creates a subscription for `provider` and returns it with its sender.
    pub fn channel(provider: Provider) -> (mpsc::UnboundedSender<FixEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { provider, rx })
    }

    /// The provider this subscription was opened against.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Receives the next event.
    ///
    /// Returns `None` when all senders have been dropped (the provider was
    /// unsubscribed or the producer finished).
    pub async fn next(&mut self) -> Option<FixEvent> {
        self.rx.recv().await
    }
}
