pub mod cache;
pub mod cohort;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod io;
pub mod paths;
pub mod reconcile;
pub mod record;
pub mod rotation;
pub mod store;
pub mod types;

pub use error::{ErrorKind, Result, RotaError};
pub use reconcile::{Reconciler, Resolution, Source};
