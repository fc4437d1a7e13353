//! Playback and capture streams handed out by [`AudioHardware`](crate::AudioHardware).
//!
//! Both stream kinds share the routing parameter protocol in [`params`].

mod input;
mod output;
pub mod params;

pub use input::{InputStream, INPUT_BUFFER_SIZE, INPUT_SAMPLE_RATE};
pub use output::{OutputStream, OUTPUT_BUFFER_SIZE, OUTPUT_LATENCY_MS};
pub use params::{AudioParameter, RoutingParameters, KEY_ROUTING};
