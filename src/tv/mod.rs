//! Sony Bravia IP-control layer.
//!
//! Speaks the TV's JSON-RPC-over-HTTP interface and exposes the typed
//! operations the tool layer builds on.

mod client;
mod types;

pub use client::{BraviaClient, TvControl};
pub use types::{ContentItem, PowerStatus, SystemInformation, VolumeInformation};
