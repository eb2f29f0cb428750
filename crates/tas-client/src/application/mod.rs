//! Application layer use cases for the client.
//!
//! - **`send_script`** – Compiles a script and delivers it through a
//!   [`send_script::PayloadTransport`].  Also sends the `Unload` request and
//!   waits for replies.  The transport is injected at construction time so
//!   the use case can be tested without a socket.

pub mod send_script;
