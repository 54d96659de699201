//! HotDrop Core - Domain types, ports and configuration
//!
//! This crate contains the pieces of the ingest pipeline that carry no I/O:
//! - **Domain types** - `DiscoveredFile`, `UploadJob`, `JobState`, identifier newtypes
//! - **Port definitions** - `IAssetService` (remote asset service) and
//!   `IRemoteSource` (polled origin such as an FTP drop)
//! - **Configuration** - YAML file with environment overrides
//!
//! # Architecture
//!
//! Adapter crates implement the ports; `hotdrop-pipeline` drives them.
//! No component reads ambient global state: everything is passed in through
//! [`config::Config`] and constructor arguments.

pub mod config;
pub mod domain;
pub mod ports;
