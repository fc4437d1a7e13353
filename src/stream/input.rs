//! Capture stream.
//!
//! Capture is not wired to hardware. The stream validates its parameters and
//! takes part in the open/close ownership protocol, but every `read` fails.

use std::io::Write;

use parking_lot::Mutex;

use super::RoutingParameters;
use crate::format::{AcousticsMode, AudioFormat, ChannelMask, StreamParams};
use crate::HalError;

/// The only capture rate.
pub const INPUT_SAMPLE_RATE: u32 = 8000;

/// Preferred read size in bytes.
pub const INPUT_BUFFER_SIZE: usize = 320;

/// The single capture stream.
pub struct InputStream {
    lock: Mutex<()>,
    acoustics: AcousticsMode,
    routing: RoutingParameters,
}

impl InputStream {
    /// Validates the request against the fixed capture capability.
    ///
    /// Fails with `BadValue` if any field of `params` is missing. If the
    /// request is complete but not 16-bit mono 8 kHz, `params` is overwritten
    /// with those values and the call fails with `BadValue`, so the caller can
    /// retry with them.
    pub(crate) fn open(
        params: &mut StreamParams,
        acoustics: AcousticsMode,
    ) -> Result<Self, HalError> {
        let (Some(format), Some(channels), Some(rate)) =
            (params.format, params.channels, params.sample_rate)
        else {
            return Err(HalError::bad_value("input format, channels and rate are required"));
        };
        tracing::debug!(?format, ?channels, rate, ?acoustics, "input stream requested");

        let stream = Self {
            lock: Mutex::new(()),
            acoustics,
            routing: RoutingParameters::default(),
        };

        if format != stream.format()
            || channels != stream.channels()
            || rate != stream.sample_rate()
        {
            tracing::error!(?format, ?channels, rate, "unsupported input configuration");
            *params = StreamParams::new(stream.format(), stream.channels(), stream.sample_rate());
            return Err(HalError::bad_value(format!(
                "input supports only 16-bit mono at {INPUT_SAMPLE_RATE} Hz"
            )));
        }

        Ok(stream)
    }

    /// Capture rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        INPUT_SAMPLE_RATE
    }

    /// Preferred read size in bytes.
    pub fn buffer_size(&self) -> usize {
        INPUT_BUFFER_SIZE
    }

    /// Channel mask, always mono.
    pub fn channels(&self) -> ChannelMask {
        ChannelMask::IN_MONO
    }

    /// Sample format, always 16-bit.
    pub fn format(&self) -> AudioFormat {
        AudioFormat::PCM_16_BIT
    }

    /// Pre-processing flags the stream was opened with.
    pub fn acoustics(&self) -> AcousticsMode {
        self.acoustics
    }

    /// Input gain is not supported.
    pub fn set_gain(&self, _gain: f32) -> Result<(), HalError> {
        Err(HalError::invalid_operation("input gain is not supported"))
    }

    /// Always fails: capture is not implemented.
    pub fn read(&self, _buffer: &mut [u8]) -> Result<usize, HalError> {
        let _guard = self.lock.lock();
        Err(HalError::not_initialized("capture is not implemented"))
    }

    /// Nothing to stop.
    pub fn standby(&self) -> Result<(), HalError> {
        Ok(())
    }

    /// Frames dropped since the last call, always zero.
    pub fn input_frames_lost(&self) -> u32 {
        0
    }

    /// Applies a parameter string; see [`RoutingParameters::set_parameters`].
    pub fn set_parameters(&self, key_value_pairs: &str) -> Result<(), HalError> {
        self.routing.set_parameters(key_value_pairs)
    }

    /// Answers a parameter query; see [`RoutingParameters::get_parameters`].
    pub fn get_parameters(&self, keys: &str) -> String {
        self.routing.get_parameters(keys)
    }

    /// Current routing device id.
    pub fn routing_device(&self) -> i32 {
        self.routing.device()
    }

    /// Writes the stream state to `out`.
    pub fn dump(&self, out: &mut dyn Write, _args: &[String]) -> std::io::Result<()> {
        writeln!(out, "InputStream:")?;
        writeln!(out, "\tsample rate: {INPUT_SAMPLE_RATE}")?;
        writeln!(out, "\tacoustics: {:#x}", self.acoustics.0)?;
        writeln!(out, "\trouting: {}", self.routing.device())
    }
}

impl std::fmt::Debug for InputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputStream")
            .field("acoustics", &self.acoustics)
            .field("routing", &self.routing.device())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> StreamParams {
        StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_MONO, 8000)
    }

    #[test]
    fn test_open_supported() {
        let mut params = supported();
        let stream = InputStream::open(&mut params, AcousticsMode::NONE).unwrap();

        assert_eq!(params, supported());
        assert_eq!(stream.buffer_size(), 320);
        assert_eq!(stream.input_frames_lost(), 0);
    }

    #[test]
    fn test_open_rewrites_unsupported() {
        let mut params = StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_STEREO, 44_100);

        let err = InputStream::open(&mut params, AcousticsMode::NONE).unwrap_err();

        assert!(matches!(err, HalError::BadValue { .. }));
        assert_eq!(params, supported());
    }

    #[test]
    fn test_open_missing_field() {
        let mut params = supported();
        params.channels = None;

        let err = InputStream::open(&mut params, AcousticsMode::NONE).unwrap_err();

        assert!(matches!(err, HalError::BadValue { .. }));
        // nothing is written back when a field is missing
        assert_eq!(params.channels, None);
    }

    #[test]
    fn test_read_is_not_initialized() {
        let stream = InputStream::open(&mut supported(), AcousticsMode::AGC_ENABLE).unwrap();
        let mut buffer = [0u8; 320];

        let err = stream.read(&mut buffer).unwrap_err();
        assert!(matches!(err, HalError::NotInitialized { .. }));
        assert!(stream.standby().is_ok());
    }

    #[test]
    fn test_routing_parameters() {
        let stream = InputStream::open(&mut supported(), AcousticsMode::NONE).unwrap();

        stream.set_parameters("routing=262144").unwrap();
        assert_eq!(stream.routing_device(), 0x40000);
        assert_eq!(stream.get_parameters("routing"), "routing=262144");
    }

    #[test]
    fn test_set_gain_unsupported() {
        let stream = InputStream::open(&mut supported(), AcousticsMode::NONE).unwrap();
        assert!(matches!(
            stream.set_gain(0.5),
            Err(HalError::InvalidOperation { .. })
        ));
    }
}
