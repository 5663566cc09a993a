//! vSphere Admin - inventory reporting and scheduled task utilities
//!
//! This library provides the vNIC-to-VLAN resolver, the management client
//! abstraction with an inventory snapshot backend, and the scheduled task
//! operations used by the `vsphere-admin` command line tool.

pub mod config;
pub mod error;
pub mod report;
pub mod tasks;
pub mod vsphere;

pub use error::AppError;
