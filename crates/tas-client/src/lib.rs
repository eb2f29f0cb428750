//! tas-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does tas-client do? (for beginners)
//!
//! The control module is a small library injected into the running game.  It
//! listens on a local TCP port and, once it receives a compiled script,
//! starts a race with the requested configuration and replays the input
//! timeline tick by tick.
//!
//! The client:
//!
//! 1. Reads a script file from disk.
//! 2. Compiles it with `tas_core::compile_script`.  Any error stops here and
//!    nothing is sent.
//! 3. Connects to the control module and sends the payload framed as a
//!    `Script` message.
//!
//! It can also ask the control module to detach itself (`Unload`) or just
//! compile a script to a file for inspection.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: TCP transport and configuration storage.
pub mod infrastructure;
