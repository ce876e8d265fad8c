//! Common utilities module
//!
//! This module contains shared utilities used across the pyramid codec.

pub mod error;

pub use error::{CodecError, Result};
