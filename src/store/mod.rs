/// Singleton Store Layer
///
/// Whole-document state (flows, credentials, settings, sessions) with per-resource
/// revision tracking for optimistic concurrency.

pub mod singleton;

pub use singleton::{Resource, RevisionTracker, SingletonStore};
