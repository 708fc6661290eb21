//! Common utilities for the AMP optimizer.
//!
//! This crate provides shared infrastructure used by the optimizer and the CLI:
//! - **Remote fetching** - an injectable blocking GET capability
//! - **URL helpers** - absolute URL checks and origin extraction
//! - **Runtime version** - lookup of the current AMP runtime version

pub mod net;
pub mod runtime_version;
pub mod url;
