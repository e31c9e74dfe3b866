//! Connection sessions for Finger Fight.
//!
//! Every WebSocket connection gets an ephemeral [`PlayerId`] and a
//! [`Session`] that lives exactly as long as the socket. There is no
//! authentication and no reconnection: a dropped connection is a departed
//! player.
//!
//! The crate tracks three things per connection:
//!
//! 1. **Identity**: [`SessionManager::open`] hands out player ids.
//! 2. **Throttling**: a sliding-window [`RateLimiter`] per connection.
//! 3. **Liveness**: [`SessionManager::sweep_liveness`] pings everyone and
//!    disconnects whoever stayed silent since the previous sweep.
//!
//! [`PlayerId`]: fingerfight_protocol::PlayerId

mod error;
mod manager;
mod rate_limit;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use rate_limit::RateLimiter;
pub use session::{ConnectionSignal, Session, SessionConfig};
