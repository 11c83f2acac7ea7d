//! `rakshika` - A personal safety toolkit
//!
//! This library provides the core functionality for alerting trusted
//! contacts in an emergency, sharing live location for a bounded time and
//! surfacing static safety content. Host facilities (position, URL hand-off,
//! clipboard, notifications, alarm) sit behind traits so the same logic runs
//! against the desktop adapters in [`host`] or against test fakes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod account;
pub mod alarm;
pub mod alert;
pub mod app;
pub mod cli;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod error;
pub mod handoff;
pub mod host;
pub mod location;
pub mod logging;
pub mod message;
pub mod notify;
pub mod phone;
pub mod platform;
pub mod sharing;
pub mod sos;
pub mod storage;
pub mod tips;

#[cfg(test)]
pub(crate) mod testing;

pub use account::UserIdentity;
pub use alert::{AlertRecorder, SosAlert};
pub use app::AppContext;
pub use config::Config;
pub use contact::{ContactBackend, ContactStore, EmergencyContact};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use sharing::LiveLocationSession;
pub use sos::{DispatchReport, SosDispatcher};
pub use storage::{Storage, StorageStats};
