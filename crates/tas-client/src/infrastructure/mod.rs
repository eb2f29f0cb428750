//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `application` and `tas_core`,
//! but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – TCP connection to the control module implementing
//!   [`crate::application::send_script::PayloadTransport`].
//!
//! - **`storage`** – TOML configuration file.

pub mod network;
pub mod storage;
