pub mod connection;
pub mod source;
pub mod sse;

pub use connection::ReconnectPolicy;
pub use source::{ChangeStream, StreamConfig, CHANNEL_CAPACITY, DEFAULT_STREAM_URL};
pub use sse::{SseDecoder, SseFrame};
