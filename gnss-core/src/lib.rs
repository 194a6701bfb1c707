//! GNSS assistance bridge protocol core.
//! Host-driven: no sockets or HTTP here; the daemon wires the I/O.

pub mod apn;
pub mod clock;
pub mod proto;
pub mod status;
pub mod wire;

pub use apn::{select_preferred, ApnRecord};
pub use status::{AirplaneMode, MessageSink, OperatorRecord, Status};
pub use wire::{decode_frame, encode_frame, FrameDecodeError, FrameEncodeError};
