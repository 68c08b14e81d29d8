//! Reactive state kinds
//!
//! Signals, derived signals, field accessors and stores, each carrying a
//! [`SubscriptionManager`]. These types hold state only; change tracking and
//! effect scheduling belong to the host runtime.

mod derived;
mod signal;
mod store;
mod subscription;

pub use derived::DerivedSignal;
pub use signal::{SignalCell, SignalField};
pub use store::{Store, StoreFlags};
pub(crate) use store::unwrap_store;
pub use subscription::{Subscriber, SubscriberKind, SubscriptionManager};
