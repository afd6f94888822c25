#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

// Fixed payload size of every message. Payload bytes are opaque at this layer.
pub const PAYLOAD_LEN: usize = 1000;

// Shared handle that travels through the hub. Readers and the buffer each hold
// a clone of the Arc, the 1 KB record itself is never copied.
pub type MessagePtr = Arc<Message>;

/// Signal state carried in `SignalHeader::sig_status`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SigStatus {
    #[default]
    Init = 0,
    Ok = 1,
    Error = 2,
    Invalid = 3,
}

/// Originating sensor carried in `SignalHeader::sensor_source`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SensorSource {
    #[default]
    Unknown = 0,
    Camera = 1,
    Radar = 2,
    Lidar = 3,
}

// Metadata preceding every payload.
// Fields are ordered so the struct has no padding: 4 x u8 then 2 x u16 = 8 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SignalHeader {
    pub version: u8,         // 0 = uninitialised / unknown
    pub sig_status: u8,      // SigStatus discriminant
    pub sensor_source: u8,   // SensorSource discriminant
    pub reserved0: u8,       // must stay 0
    pub cycle_counter: u16,  // one per publish cycle, wraps on overflow
    pub measurement_counter: u16, // measurements within a cycle, wraps on overflow
}

impl SignalHeader {
    pub const CURRENT_VERSION: u8 = 1;

    pub fn status(&self) -> Option<SigStatus> {
        match self.sig_status {
            0 => Some(SigStatus::Init),
            1 => Some(SigStatus::Ok),
            2 => Some(SigStatus::Error),
            3 => Some(SigStatus::Invalid),
            _ => None,
        }
    }
}

// Complete record: header followed by an opaque fixed-size payload.
#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub header: SignalHeader,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Default for Message {
    fn default() -> Self {
        Self {
            header: SignalHeader::default(),
            payload: [0; PAYLOAD_LEN],
        }
    }
}

impl Message {
    /// Builds a current-version, status-OK message stamped with `cycle_counter`.
    pub fn with_cycle(cycle_counter: u16) -> Self {
        Self::with_counters(cycle_counter, 0)
    }

    pub fn with_counters(cycle_counter: u16, measurement_counter: u16) -> Self {
        Self {
            header: SignalHeader {
                version: SignalHeader::CURRENT_VERSION,
                sig_status: SigStatus::Ok as u8,
                cycle_counter,
                measurement_counter,
                ..SignalHeader::default()
            },
            payload: [0; PAYLOAD_LEN],
        }
    }

    #[inline]
    pub fn cycle_counter(&self) -> u16 {
        self.header.cycle_counter
    }

    /// Wraps the message in the shared handle type used on the hub.
    pub fn into_ptr(self) -> MessagePtr {
        Arc::new(self)
    }
}

// Messages print as their cycle counter, which is all the ring diagnostics need.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header.cycle_counter)
    }
}
