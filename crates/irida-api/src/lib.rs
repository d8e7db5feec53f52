//! IRIDA API: remote ports for the IRIDA uploader
//!
//! This crate is the only place the uploader touches the network. The core
//! programs against the port traits; `IridaClient` implements them over the
//! IRIDA REST API.
//!
//! ## Layer 1 - Remote
//!
//! Focus: one error family (`ApiError`) for everything that can go wrong
//! remotely.
//!
//! ## Key Components
//!
//! - `RemoteState` / `RemoteUpload` / `RemoteProject`: the ports
//! - `IridaClient`: reqwest implementation with OAuth2 password grant
//! - `fakes`: in-memory and scripted implementations for tests

pub mod client;
mod error;
pub mod fakes;
pub mod ports;

pub use client::{IridaClient, IridaConfig};
pub use error::ApiError;
pub use ports::{ApiResult, IridaApi, RemoteProject, RemoteState, RemoteUpload, UploadId};
