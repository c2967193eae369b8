//! Networking: WebTransport accept loop, wire protocol, and the game loop.

pub mod dos_protection;
pub mod framing;
pub mod game_session;
pub mod interest;
pub mod protocol;
pub mod session;
pub mod tls;
pub mod transport;
