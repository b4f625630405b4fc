//! Bounded snapshot history.
//!
//! Trims a player's history down to `capacity` while guaranteeing that every
//! calendar day inside the `keep_days` window keeps its last snapshot.

mod policy;

pub use policy::RetentionPolicy;
