//! Shared infrastructure for end-to-end tests
//!
//! Each test binary compiles its own copy of this module, so not every test
//! uses every helper.
#![allow(dead_code)]

pub mod client;
pub mod constants;
pub mod fixtures;
pub mod mocks;
pub mod server;

pub use client::{assert_single_terminal, parse_sse_frames, TestClient};
pub use constants::*;
pub use mocks::{ScriptedCatalog, ScriptedLlm};
pub use server::TestServer;
