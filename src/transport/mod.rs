//! Transport boundary.
//!
//! The dispatch engine never accepts connections or encodes frames itself.
//! It talks to a socket server through the [`Transport`] and [`Socket`]
//! traits:
//!
//! ```text
//! Transport::on_connection(pattern) ──► Socket
//!                                        ├─ on_message(event)  → args + optional ack
//!                                        ├─ on_any()           → event + args + optional ack
//!                                        ├─ on_disconnect()    → reason
//!                                        └─ emit(event, args)
//! ```
//!
//! The `memory` feature ships an in-process implementation in
//! [`crate::memory`].

mod ack;
mod error;
mod handshake;
mod socket;

pub use ack::AckSender;
pub use error::TransportError;
pub use handshake::Handshake;
pub use socket::{
    AnyMessageListener, ConnectionListener, DisconnectListener, DisconnectReason, ListenerId,
    MessageListener, Socket, SocketRef, Transport,
};
