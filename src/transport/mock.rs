//! Mock PCM and mixer transports for testing without hardware.
//!
//! Both mocks are cheap to clone and share their state between clones, so a
//! test can hand one clone to the HAL and keep another to inspect what the HAL
//! did with it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::mixer::{ControlId, ControlValue, MixerDevice, MixerTransport};
use crate::pcm::{PcmConfig, PcmDevice, PcmDirection, PcmTransport};
use crate::TransportError;

/// Snapshot of what a [`MockPcmTransport`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmStats {
    /// Calls to `open`, whatever they returned.
    pub open_attempts: usize,
    /// Handles handed out (ready or not).
    pub opens: usize,
    /// Handles dropped.
    pub closes: usize,
    /// Rate of every `open` call, in order.
    pub requested_rates: Vec<u32>,
    /// Calls to `write` on a handle.
    pub writes: usize,
    /// Bytes accepted by successful writes.
    pub bytes_written: usize,
    /// Calls to `stop` on a handle.
    pub stops: usize,
}

#[derive(Debug)]
struct PcmSettings {
    accepted_rates: Vec<u32>,
    null_handles: bool,
    fail_writes: bool,
    fail_stop: bool,
}

#[derive(Debug)]
struct PcmShared {
    settings: Mutex<PcmSettings>,
    stats: Mutex<PcmStats>,
}

/// A PCM transport that accepts a configurable set of playback rates.
///
/// A rejected rate yields a handle that is not ready, or no handle at all with
/// [`with_null_handles`](Self::with_null_handles).
///
/// # Example
///
/// ```
/// use tiny_audio_hal::pcm::negotiate_playback;
/// use tiny_audio_hal::transport::MockPcmTransport;
///
/// let transport = MockPcmTransport::accepting(&[48_000]);
/// let pcm = negotiate_playback(&transport, 0, 0).unwrap();
///
/// assert_eq!(pcm.config.rate, 48_000);
/// assert_eq!(transport.stats().open_attempts, 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockPcmTransport {
    shared: Arc<PcmShared>,
}

impl MockPcmTransport {
    /// A transport that accepts both 44.1 kHz and 48 kHz.
    pub fn new() -> Self {
        Self::accepting(&[44_100, 48_000])
    }

    /// A transport that accepts only the given rates.
    pub fn accepting(rates: &[u32]) -> Self {
        Self {
            shared: Arc::new(PcmShared {
                settings: Mutex::new(PcmSettings {
                    accepted_rates: rates.to_vec(),
                    null_handles: false,
                    fail_writes: false,
                    fail_stop: false,
                }),
                stats: Mutex::new(PcmStats::default()),
            }),
        }
    }

    /// Return no handle, instead of an unready one, for rejected rates.
    #[must_use]
    pub fn with_null_handles(self) -> Self {
        self.shared.settings.lock().null_handles = true;
        self
    }

    /// Makes every subsequent `write` fail at the transport level.
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.settings.lock().fail_writes = fail;
    }

    /// Makes every subsequent `stop` fail at the transport level.
    pub fn set_fail_stop(&self, fail: bool) {
        self.shared.settings.lock().fail_stop = fail;
    }

    /// Returns the current counters.
    pub fn stats(&self) -> PcmStats {
        self.shared.stats.lock().clone()
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        let stats = self.shared.stats.lock();
        stats.opens - stats.closes
    }
}

impl Default for MockPcmTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PcmTransport for MockPcmTransport {
    fn open(
        &self,
        _card: u32,
        _device: u32,
        direction: PcmDirection,
        config: &PcmConfig,
    ) -> Option<Box<dyn PcmDevice>> {
        let (accepted, null_handles) = {
            let settings = self.shared.settings.lock();
            (
                direction == PcmDirection::Playback
                    && settings.accepted_rates.contains(&config.rate),
                settings.null_handles,
            )
        };

        let mut stats = self.shared.stats.lock();
        stats.open_attempts += 1;
        stats.requested_rates.push(config.rate);

        if !accepted && null_handles {
            return None;
        }

        stats.opens += 1;
        let error = if accepted {
            String::new()
        } else {
            format!("cannot set hw params: rate {} not supported", config.rate)
        };

        Some(Box::new(MockPcmDevice {
            shared: Arc::clone(&self.shared),
            ready: accepted,
            error,
        }))
    }
}

struct MockPcmDevice {
    shared: Arc<PcmShared>,
    ready: bool,
    error: String,
}

impl PcmDevice for MockPcmDevice {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let fail = self.shared.settings.lock().fail_writes;
        let mut stats = self.shared.stats.lock();
        stats.writes += 1;

        if fail || !self.ready {
            self.error = "cannot write stream data: I/O error".to_string();
            return Err(TransportError::new(self.error.clone()));
        }

        stats.bytes_written += data.len();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        let fail = self.shared.settings.lock().fail_stop;
        self.shared.stats.lock().stops += 1;

        if fail {
            self.error = "cannot stop channel: Bad file descriptor".to_string();
            return Err(TransportError::new(self.error.clone()));
        }
        Ok(())
    }

    fn last_error(&self) -> String {
        self.error.clone()
    }
}

impl Drop for MockPcmDevice {
    fn drop(&mut self) {
        self.shared.stats.lock().closes += 1;
    }
}

/// One write recorded by a [`MockMixerTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    /// Control name.
    pub name: String,
    /// Channel for integer writes, `None` for enumerated writes.
    pub channel: Option<u32>,
    /// Value written.
    pub value: ControlValue,
}

/// Snapshot of mixer open/close counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerStats {
    /// Mixer handles handed out.
    pub opens: usize,
    /// Mixer handles dropped.
    pub closes: usize,
}

#[derive(Debug, Default)]
struct MixerState {
    unavailable: bool,
    /// `None` means every name resolves.
    known: Option<HashSet<String>>,
    failing: HashSet<String>,
    mono: HashSet<String>,
    names: Vec<String>,
    writes: Vec<RecordedWrite>,
    stats: MixerStats,
}

impl MixerState {
    fn id_for(&mut self, name: &str) -> ControlId {
        let index = match self.names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        };
        ControlId(index as u32)
    }

    fn name_of(&self, control: ControlId) -> Result<String, TransportError> {
        self.names
            .get(control.0 as usize)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("invalid control id {}", control.0)))
    }
}

/// A mixer transport that records every write.
///
/// # Example
///
/// ```
/// use tiny_audio_hal::mixer::{MixerGateway, RouteProgram};
/// use tiny_audio_hal::transport::MockMixerTransport;
///
/// let transport = MockMixerTransport::new();
/// transport.fail_control("DAC2 Sidetone");
///
/// let mut mixer = MixerGateway::open(&transport, 0).unwrap();
/// let report = RouteProgram::speyside().apply(&mut mixer);
///
/// assert_eq!(report.failures().count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockMixerTransport {
    state: Arc<Mutex<MixerState>>,
}

impl MockMixerTransport {
    /// A mixer on which every control name exists and every write succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mixer that fails to open.
    pub fn unavailable() -> Self {
        let mock = Self::new();
        mock.state.lock().unavailable = true;
        mock
    }

    /// A mixer exposing only the named controls.
    pub fn with_controls<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.state.lock().known = Some(names.into_iter().map(Into::into).collect());
        mock
    }

    /// Makes every write to the named control fail.
    pub fn fail_control(&self, name: &str) {
        self.state.lock().failing.insert(name.to_string());
    }

    /// Makes the named control reject channel 1.
    pub fn set_mono(&self, name: &str) {
        self.state.lock().mono.insert(name.to_string());
    }

    /// All writes that reached the transport, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    /// Returns the open/close counters.
    pub fn stats(&self) -> MixerStats {
        self.state.lock().stats
    }
}

impl MixerTransport for MockMixerTransport {
    fn open(&self, _index: u32) -> Option<Box<dyn MixerDevice>> {
        let mut state = self.state.lock();
        if state.unavailable {
            return None;
        }
        state.stats.opens += 1;

        Some(Box::new(MockMixerDevice {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockMixerDevice {
    state: Arc<Mutex<MixerState>>,
}

impl MixerDevice for MockMixerDevice {
    fn control_by_name(&self, name: &str) -> Option<ControlId> {
        let mut state = self.state.lock();
        let exists = state.known.as_ref().map_or(true, |known| known.contains(name));
        exists.then(|| state.id_for(name))
    }

    fn set_integer(
        &mut self,
        control: ControlId,
        channel: u32,
        value: i32,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let name = state.name_of(control)?;

        if state.failing.contains(&name) {
            return Err(TransportError::new("Invalid argument"));
        }
        if channel > 0 && state.mono.contains(&name) {
            return Err(TransportError::new(format!("no channel {channel}")));
        }

        state.writes.push(RecordedWrite {
            name,
            channel: Some(channel),
            value: ControlValue::Integer(value),
        });
        Ok(())
    }

    fn set_enum(&mut self, control: ControlId, item: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let name = state.name_of(control)?;

        if state.failing.contains(&name) {
            return Err(TransportError::new("Invalid argument"));
        }

        state.writes.push(RecordedWrite {
            name,
            channel: None,
            value: ControlValue::Enumerated(item.to_string()),
        });
        Ok(())
    }
}

impl Drop for MockMixerDevice {
    fn drop(&mut self) {
        self.state.lock().stats.closes += 1;
    }
}
