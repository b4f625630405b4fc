//! Capture providers: one per category of player state.
//!
//! The core never interprets a component's payload. It only drives the
//! uniform save / restore / remove contract, in priority order.

mod cached;
mod category;
mod error;
mod provider;
mod registry;
mod table;

pub use cached::{CachedProvider, ComponentSource};
pub use category::{Category, Priority};
pub use error::ProviderError;
pub use provider::SnapshotProvider;
pub use registry::{ProviderRegistry, Registration};
pub use table::ComponentTable;
