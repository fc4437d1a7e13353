//! The hardware façade: mixer ownership, stream slots, and global settings.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::format::{AcousticsMode, AudioDevices, StreamParams};
use crate::mixer::{MixerGateway, MixerTransport, RouteReport};
use crate::pcm::PcmTransport;
use crate::stream::{InputStream, OutputStream};
use crate::{HalConfig, HalError};

/// Everything guarded by the façade lock.
#[derive(Default)]
struct Slots {
    mixer: Option<MixerGateway>,
    output: Option<Arc<OutputStream>>,
    input: Option<Arc<InputStream>>,
    last_route: Option<RouteReport>,
}

/// Audio hardware for one codec: at most one output and one input stream.
///
/// The façade owns the mixer for its whole lifetime. Opening the output
/// stream applies the configured route program and negotiates the playback
/// device. Opening the input stream only validates parameters; capture itself
/// is not implemented.
///
/// One lock covers both stream slots and the mixer, and is held for the whole
/// of each open and close, so two concurrent opens cannot both claim a slot.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tiny_audio_hal::format::{AudioDevices, StreamParams};
/// use tiny_audio_hal::transport::{MockMixerTransport, MockPcmTransport};
/// use tiny_audio_hal::{AudioHardware, HalConfig};
///
/// let hw = AudioHardware::new(
///     HalConfig::default(),
///     &MockMixerTransport::new(),
///     Arc::new(MockPcmTransport::new()),
/// );
/// hw.init_check().unwrap();
///
/// let mut params = StreamParams::default();
/// let out = hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut params).unwrap();
/// assert_eq!(params.sample_rate, Some(44_100));
///
/// out.write(&[0u8; 8192]).unwrap();
/// hw.close_output_stream(&out);
/// ```
pub struct AudioHardware {
    config: HalConfig,
    pcm: Arc<dyn PcmTransport>,
    slots: Mutex<Slots>,
    mic_mute: AtomicBool,
}

impl AudioHardware {
    /// Opens the configured mixer and builds the façade.
    ///
    /// A mixer that fails to open is not fatal here; [`init_check`](Self::init_check)
    /// reports it.
    pub fn new(
        config: HalConfig,
        mixer: &dyn MixerTransport,
        pcm: Arc<dyn PcmTransport>,
    ) -> Self {
        let mixer = MixerGateway::open(mixer, config.mixer);

        Self {
            config,
            pcm,
            slots: Mutex::new(Slots {
                mixer,
                ..Slots::default()
            }),
            mic_mute: AtomicBool::new(false),
        }
    }

    /// The configuration the façade was built with.
    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    /// Succeeds if the mixer was opened.
    pub fn init_check(&self) -> Result<(), HalError> {
        if self.slots.lock().mixer.is_some() {
            Ok(())
        } else {
            Err(HalError::not_initialized("mixer not open"))
        }
    }

    /// Opens the output stream.
    ///
    /// `devices` is not consulted: the route program is the only supported
    /// path and is applied unconditionally. Its writes are not undone if PCM
    /// negotiation then fails. On success `params` holds the negotiated
    /// format, channels and rate.
    ///
    /// Fails with `InvalidOperation` if an output stream is already open, and
    /// with `BadValue` if no playback rate is accepted.
    pub fn open_output_stream(
        &self,
        devices: AudioDevices,
        params: &mut StreamParams,
    ) -> Result<Arc<OutputStream>, HalError> {
        let mut slots = self.slots.lock();
        tracing::info!(devices = devices.bits(), occupied = slots.output.is_some(), "open output");

        if slots.output.is_some() {
            return Err(HalError::invalid_operation("output stream already open"));
        }

        if let Some(mixer) = slots.mixer.as_mut() {
            let report = self.config.route.apply(mixer);
            if !report.is_clean() {
                tracing::warn!(
                    failed = report.failures().count(),
                    total = report.outcomes().len(),
                    "route program partially applied"
                );
            }
            slots.last_route = Some(report);
        } else {
            tracing::warn!("no mixer, route program skipped");
        }

        let result = OutputStream::open(
            self.pcm.as_ref(),
            self.config.card,
            self.config.device,
            params,
        );
        let out = match result {
            Ok(out) => Arc::new(out),
            Err(e) => {
                tracing::error!(error = %e, "open output failed");
                return Err(e);
            }
        };

        slots.output = Some(Arc::clone(&out));
        tracing::info!(rate = out.sample_rate(), "output stream open");
        Ok(out)
    }

    /// Closes `stream` if it is the open output stream; otherwise does nothing.
    pub fn close_output_stream(&self, stream: &Arc<OutputStream>) {
        let mut slots = self.slots.lock();
        tracing::info!("close output");

        if slots.output.as_ref().is_some_and(|out| Arc::ptr_eq(out, stream)) {
            if let Some(out) = slots.output.take() {
                out.release();
            }
        }
    }

    /// Opens the input stream.
    ///
    /// Fails with `BadValue` without touching the slot unless `devices` names
    /// exactly one input device. Fails with `InvalidOperation` if an input
    /// stream is already open, and with `BadValue` (rewriting `params` to the
    /// supported 16-bit mono 8 kHz) if the request does not match it.
    pub fn open_input_stream(
        &self,
        devices: AudioDevices,
        params: &mut StreamParams,
        acoustics: AcousticsMode,
    ) -> Result<Arc<InputStream>, HalError> {
        if !devices.is_input_device() {
            return Err(HalError::bad_value(format!(
                "{:#x} is not an input device",
                devices.bits()
            )));
        }

        let mut slots = self.slots.lock();
        if slots.input.is_some() {
            return Err(HalError::invalid_operation("input stream already open"));
        }

        let input = Arc::new(InputStream::open(params, acoustics)?);
        slots.input = Some(Arc::clone(&input));
        tracing::info!(devices = devices.bits(), "input stream open");
        Ok(input)
    }

    /// Closes `stream` if it is the open input stream; otherwise does nothing.
    pub fn close_input_stream(&self, stream: &Arc<InputStream>) {
        let mut slots = self.slots.lock();
        if slots.input.as_ref().is_some_and(|input| Arc::ptr_eq(input, stream)) {
            slots.input = None;
            tracing::info!("input stream closed");
        }
    }

    /// The open output stream, if any.
    pub fn output_stream(&self) -> Option<Arc<OutputStream>> {
        self.slots.lock().output.clone()
    }

    /// The open input stream, if any.
    pub fn input_stream(&self) -> Option<Arc<InputStream>> {
        self.slots.lock().input.clone()
    }

    /// Per-control outcomes of the most recent route program run.
    pub fn last_route_report(&self) -> Option<RouteReport> {
        self.slots.lock().last_route.clone()
    }

    /// Accepted and ignored; call volume is handled by the modem.
    #[allow(clippy::unnecessary_wraps)]
    pub fn set_voice_volume(&self, volume: f32) -> Result<(), HalError> {
        tracing::debug!(volume, "set_voice_volume ignored");
        Ok(())
    }

    /// Always fails so the framework applies master volume in software.
    pub fn set_master_volume(&self, _volume: f32) -> Result<(), HalError> {
        Err(HalError::invalid_operation("master volume is applied in software"))
    }

    /// Records the microphone mute state. The hardware is not touched.
    #[allow(clippy::unnecessary_wraps)]
    pub fn set_mic_mute(&self, state: bool) -> Result<(), HalError> {
        self.mic_mute.store(state, Ordering::Relaxed);
        Ok(())
    }

    /// Last value passed to [`set_mic_mute`](Self::set_mic_mute).
    pub fn get_mic_mute(&self) -> bool {
        self.mic_mute.load(Ordering::Relaxed)
    }

    /// Writes the façade state, then each open stream's dump, to `out`.
    pub fn dump(&self, out: &mut dyn Write, args: &[String]) -> std::io::Result<()> {
        let (mixer, output, input, last_route) = {
            let slots = self.slots.lock();
            (
                slots.mixer.as_ref().map(MixerGateway::index),
                slots.output.clone(),
                slots.input.clone(),
                slots.last_route.clone(),
            )
        };

        writeln!(out, "AudioHardware:")?;
        match mixer {
            Some(index) => writeln!(out, "\tmixer: card {index}")?,
            None => writeln!(out, "\tmixer: not open")?,
        }
        writeln!(out, "\tmic mute: {}", self.get_mic_mute())?;
        writeln!(out, "\toutput: {}", if output.is_some() { "open" } else { "closed" })?;
        writeln!(out, "\tinput: {}", if input.is_some() { "open" } else { "closed" })?;
        if let Some(report) = last_route {
            writeln!(
                out,
                "\tlast route: {}/{} controls applied",
                report.applied(),
                report.outcomes().len()
            )?;
            for failure in report.failures() {
                writeln!(out, "\t\t{failure}")?;
            }
        }

        if let Some(input) = input {
            input.dump(out, args)?;
        }
        if let Some(output) = output {
            output.dump(out, args)?;
        }
        Ok(())
    }
}

impl Drop for AudioHardware {
    fn drop(&mut self) {
        let slots = self.slots.get_mut();
        if let Some(out) = slots.output.take() {
            out.release();
        }
        slots.input = None;
        // streams first, then the mixer
        slots.mixer = None;
    }
}

impl std::fmt::Debug for AudioHardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioHardware")
            .field("config", &self.config)
            .field("mic_mute", &self.get_mic_mute())
            .finish_non_exhaustive()
    }
}

/// Plugin entry point: builds the façade for a host framework.
pub fn create_audio_hardware(
    config: HalConfig,
    mixer: &dyn MixerTransport,
    pcm: Arc<dyn PcmTransport>,
) -> AudioHardware {
    tracing::info!(card = config.card, device = config.device, "creating audio hardware");
    AudioHardware::new(config, mixer, pcm)
}
