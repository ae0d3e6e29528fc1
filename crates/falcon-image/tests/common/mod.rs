//! Common test infrastructure for falcon-image integration tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Credentials, repository paths and tag inventories
//! - `mock_server`: Wiremock setup for the registry and the management API
//! - `fakes`: Counting in-memory implementations of the resolution seams

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
