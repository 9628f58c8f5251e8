//! Live game updates over a push transport with polling as the fallback.

mod coordinator;
mod pull;
mod push;

pub use coordinator::{ConnectionCoordinator, ConnectionMode};
pub use pull::PollingChannel;
pub use push::WebSocketChannel;
#[cfg(test)]
pub use pull::PullChannel;
#[cfg(test)]
pub use push::PushChannel;
