//! HTTP remote adapter for the fitsync queue.
//!
//! [`RemoteClient`] implements [`fitsync::RemoteSyncAdapter`] by posting each
//! queued mutation to `{base_url}/sync`. [`ConnectivityProbe`] optionally
//! drives the queue's network state from the backend's health endpoint.

pub mod client;
pub mod config;
pub mod probe;
pub mod types;

pub use client::RemoteClient;
pub use config::RemoteConfig;
pub use probe::ConnectivityProbe;
