//! Concrete PCM and mixer transports.
//!
//! - [`MockPcmTransport`] / [`MockMixerTransport`]: recorders for tests and CI
//! - [`CpalPcmTransport`]: playback through the host audio API (feature `cpal-backend`)
//!
//! Mixer access is platform specific and is supplied by the integrator through
//! [`MixerTransport`](crate::mixer::MixerTransport).

#[cfg(feature = "cpal-backend")]
mod host;
mod mock;

#[cfg(feature = "cpal-backend")]
pub use host::CpalPcmTransport;
pub use mock::{MixerStats, MockMixerTransport, MockPcmTransport, PcmStats, RecordedWrite};
