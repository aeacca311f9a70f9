//! In-memory transport for tests and single-process hosts.
//!
//! ```text
//! MemoryClient ──emit──► MemorySocket ──► message listeners (dispatch)
//!      ▲                      │
//!      └──── Inbox ◄──emit────┘
//! ```

mod client;
mod inbox;
mod server;
mod socket;

pub use client::MemoryClient;
pub use inbox::{Inbox, Received};
pub use server::MemoryServer;
pub use socket::MemorySocket;
