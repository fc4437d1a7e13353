//! PCM device access: the transport seam and playback configuration negotiation.

mod negotiate;

pub use negotiate::{
    negotiate_playback, playback_template, NegotiatedPcm, PLAYBACK_CHANNELS,
    PLAYBACK_PERIOD_COUNT, PLAYBACK_PERIOD_SIZE, PLAYBACK_RATES,
};

use crate::TransportError;

/// Direction of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmDirection {
    /// Samples flow from the host to the device.
    Playback,
    /// Samples flow from the device to the host.
    Capture,
}

/// Sample layout on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PcmFormat {
    /// Signed 16-bit little-endian.
    #[default]
    S16Le,
    /// Signed 32-bit little-endian.
    S32Le,
}

impl PcmFormat {
    /// Bytes per sample.
    pub fn sample_bytes(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::S32Le => 4,
        }
    }
}

/// Hardware configuration requested from a PCM transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmConfig {
    /// Interleaved channel count.
    pub channels: u32,
    /// Frames per period.
    pub period_size: u32,
    /// Periods in the hardware buffer.
    pub period_count: u32,
    /// Sample layout.
    pub format: PcmFormat,
    /// Frames per second.
    pub rate: u32,
}

impl PcmConfig {
    /// Bytes in one interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.format.sample_bytes()
    }

    /// Frames in the whole hardware buffer.
    pub fn buffer_frames(&self) -> usize {
        self.period_size as usize * self.period_count as usize
    }
}

/// Opens PCM devices.
///
/// Implemented by the platform glue; see
/// [`MockPcmTransport`](crate::transport::MockPcmTransport) for a test double.
pub trait PcmTransport: Send + Sync {
    /// Opens `device` on `card` with the given configuration.
    ///
    /// A transport may return `None`, or a handle whose
    /// [`is_ready`](PcmDevice::is_ready) is `false`, when the hardware rejects
    /// the configuration. Either way the caller drops what it got.
    fn open(
        &self,
        card: u32,
        device: u32,
        direction: PcmDirection,
        config: &PcmConfig,
    ) -> Option<Box<dyn PcmDevice>>;
}

/// An open PCM handle. Dropping it closes the device.
pub trait PcmDevice: Send {
    /// Returns `true` if the device accepted its configuration and can stream.
    fn is_ready(&self) -> bool;

    /// Writes interleaved frames, starting the stream if needed.
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Stops the stream, discarding queued frames.
    fn stop(&mut self) -> Result<(), TransportError>;

    /// Description of the most recent failure, empty if none.
    fn last_error(&self) -> String;
}
