pub mod message;
pub use message::{Message, MessagePtr, PAYLOAD_LEN, SensorSource, SigStatus, SignalHeader};
