//! # tiny-audio-hal
//!
//! Audio HAL for a fixed-topology embedded codec: one playback path, one
//! (stub) capture path, driven through a PCM device and a named-control mixer.
//!
//! The crate turns the generic open/parameter requests of an audio framework
//! into concrete hardware setup:
//!
//! - at most one output stream and one input stream are live at a time
//! - the playback PCM is opened at 44.1 kHz, falling back to 48 kHz
//! - a fixed [`RouteProgram`](mixer::RouteProgram) of named mixer writes wires
//!   the speaker path on every output open, best effort
//! - streams accept `routing=<id>` through a `key=value;...` parameter string
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tiny_audio_hal::format::{AudioDevices, StreamParams};
//! use tiny_audio_hal::transport::{MockMixerTransport, MockPcmTransport};
//! use tiny_audio_hal::{create_audio_hardware, HalConfig};
//!
//! let hw = create_audio_hardware(
//!     HalConfig::default(),
//!     &MockMixerTransport::new(),
//!     Arc::new(MockPcmTransport::accepting(&[48_000])),
//! );
//!
//! let mut params = StreamParams::default();
//! let out = hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut params)?;
//! assert_eq!(out.sample_rate(), 48_000);
//!
//! out.set_parameters("routing=2")?;
//! assert_eq!(out.get_parameters("routing"), "routing=2");
//! # Ok::<(), tiny_audio_hal::HalError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Transports** ([`pcm::PcmTransport`], [`mixer::MixerTransport`]): the
//!   device primitives, supplied by the integrator or by [`transport`]
//! - **Mixer gateway and route program** ([`mixer`]): named writes, failures
//!   logged and reported per entry, never fatal
//! - **Streams** ([`stream`]): the negotiated playback handle and the capture stub
//! - **Façade** ([`AudioHardware`]): owns the mixer and the two stream slots

#![warn(missing_docs)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

mod config;
mod error;
pub mod format;
mod hardware;
pub mod mixer;
pub mod pcm;
pub mod stream;
pub mod transport;

pub use config::HalConfig;
pub use error::{
    status_of, ConfigError, HalError, TransportError, BAD_VALUE, INVALID_OPERATION, NO_ERROR,
    NO_INIT,
};
pub use hardware::{create_audio_hardware, AudioHardware};
pub use stream::{InputStream, OutputStream};
