//! Live debugging of workflow instances

pub mod channel;
pub mod client;
pub mod fsm;
pub mod reducer;

pub use channel::{parse_frame, ChannelEndpoint, ChannelMessage, EventChannel};
pub use client::DebugClient;
pub use fsm::SessionFsm;
pub use reducer::DebugState;
