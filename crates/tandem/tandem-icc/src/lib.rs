mod buffer;
mod error;
mod hub;
mod ring;

pub use buffer::{DebugSnapshot, LatestValueBuffer};
pub use error::IccError;
pub use hub::{PubSubHub, Publisher, Receiver};
pub use ring::BufferConfig;
