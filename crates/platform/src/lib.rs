pub mod error;
pub mod log;
pub mod message;
pub mod platform;

// Recording test double, shared with downstream crates' tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::PlatformError;
pub use log::LogPlatform;
pub use message::{Destination, ForwardNode, OutboundMessage, Segment};
pub use platform::{DynPlatform, Platform};
