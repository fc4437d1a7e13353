//! Playback stream.

use std::io::Write;

use parking_lot::Mutex;

use super::RoutingParameters;
use crate::format::{AudioFormat, ChannelMask, StreamParams};
use crate::pcm::{negotiate_playback, PcmConfig, PcmDevice, PcmTransport};
use crate::HalError;

/// Frames the framework should hand to each `write`.
pub const OUTPUT_BUFFER_SIZE: usize = 2048;

/// Reported output latency.
pub const OUTPUT_LATENCY_MS: u32 = 20;

/// The single playback stream.
///
/// Owns the negotiated PCM handle. `write` and `standby` are serialized by the
/// stream lock; the routing parameters are not.
pub struct OutputStream {
    pcm: Mutex<Option<Box<dyn PcmDevice>>>,
    config: PcmConfig,
    routing: RoutingParameters,
}

impl OutputStream {
    /// Negotiates the playback device and builds the stream.
    ///
    /// Only the rate is negotiated; format and channels are always 16-bit
    /// stereo. On success `params` is overwritten with what the device uses.
    pub(crate) fn open(
        transport: &dyn PcmTransport,
        card: u32,
        device: u32,
        params: &mut StreamParams,
    ) -> Result<Self, HalError> {
        tracing::info!(
            rate = ?params.sample_rate,
            channels = ?params.channels,
            "output stream requested"
        );

        let negotiated = negotiate_playback(transport, card, device)?;

        let stream = Self {
            pcm: Mutex::new(Some(negotiated.device)),
            config: negotiated.config,
            routing: RoutingParameters::default(),
        };

        params.sample_rate = Some(stream.sample_rate());
        params.format = Some(stream.format());
        params.channels = Some(stream.channels());

        tracing::info!(
            rate = stream.sample_rate(),
            channels = stream.config.channels,
            "output stream configured"
        );
        Ok(stream)
    }

    /// Negotiated sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.rate
    }

    /// Preferred write size in frames.
    pub fn buffer_size(&self) -> usize {
        OUTPUT_BUFFER_SIZE
    }

    /// Channel mask, always stereo.
    pub fn channels(&self) -> ChannelMask {
        ChannelMask::OUT_STEREO
    }

    /// Sample format, always 16-bit.
    pub fn format(&self) -> AudioFormat {
        AudioFormat::PCM_16_BIT
    }

    /// Reported latency in milliseconds.
    pub fn latency_ms(&self) -> u32 {
        OUTPUT_LATENCY_MS
    }

    /// The PCM configuration the device accepted.
    pub fn pcm_config(&self) -> &PcmConfig {
        &self.config
    }

    /// Hardware volume is not supported; the framework mixes in software.
    pub fn set_volume(&self, _left: f32, _right: f32) -> Result<(), HalError> {
        Err(HalError::invalid_operation("stream volume is not supported"))
    }

    /// Sends interleaved 16-bit stereo frames to the device.
    ///
    /// Fails with `BadValue` only if the device is not ready. A transport
    /// write error is logged and the call still succeeds.
    pub fn write(&self, buffer: &[u8]) -> Result<(), HalError> {
        let mut guard = self.pcm.lock();
        let Some(pcm) = guard.as_mut().filter(|pcm| pcm.is_ready()) else {
            return Err(HalError::bad_value("playback device not ready"));
        };

        if let Err(e) = pcm.write(buffer) {
            tracing::error!(bytes = buffer.len(), error = %e, "output write failed");
        }
        Ok(())
    }

    /// Stops the device. Always succeeds; transport errors are logged.
    pub fn standby(&self) -> Result<(), HalError> {
        let mut pcm = self.pcm.lock();
        if let Some(pcm) = pcm.as_mut() {
            if let Err(e) = pcm.stop() {
                tracing::error!(error = %e, "output standby failed");
            }
        }
        Ok(())
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

    /// Not implemented: there are no users of the DSP frame count.
    pub fn get_render_position(&self) -> Result<u32, HalError> {
        Err(HalError::invalid_operation("render position is not supported"))
    }

    /// Writes the stream state to `out`.
    pub fn dump(&self, out: &mut dyn Write, _args: &[String]) -> std::io::Result<()> {
        let open = self.pcm.lock().as_ref().map(|pcm| pcm.is_ready());
        writeln!(out, "OutputStream:")?;
        writeln!(out, "\tsample rate: {}", self.config.rate)?;
        writeln!(
            out,
            "\tperiods: {} x {} frames, {} channels",
            self.config.period_count, self.config.period_size, self.config.channels
        )?;
        writeln!(out, "\trouting: {}", self.routing.device())?;
        match open {
            Some(ready) => writeln!(out, "\tpcm: open, ready={ready}"),
            None => writeln!(out, "\tpcm: released"),
        }
    }

    /// Closes the PCM handle. Later writes fail as not ready.
    pub(crate) fn release(&self) {
        if self.pcm.lock().take().is_some() {
            tracing::debug!("output pcm closed");
        }
    }
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream")
            .field("config", &self.config)
            .field("routing", &self.routing.device())
            .finish_non_exhaustive()
    }
}
