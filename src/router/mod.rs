//! Router session and presence tracking
//!
//! - `devices`: tracked device records and classification
//! - `session`: authenticated gateway session, serialized client access
//! - `tracker`: background inventory polling and change signals

pub mod devices;
pub mod session;
pub mod tracker;

pub use devices::ConnectedDevice;
pub use session::RouterSession;
pub use tracker::PresenceTracker;
