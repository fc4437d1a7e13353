//! Typed, name-addressed writes to the codec mixer.

use super::{ControlValue, MixerDevice, MixerTransport};
use crate::TransportError;

/// Why a single named control write did not take effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The mixer has no control with this name.
    #[error("no mixer control named '{name}'")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },

    /// The transport rejected the write.
    #[error("failed to set {name} to {value}: {source}")]
    WriteFailed {
        /// Control name.
        name: String,
        /// Value that was being written.
        value: String,
        /// The transport's error.
        #[source]
        source: TransportError,
    },
}

/// Owns the open mixer and issues named control writes against it.
///
/// Failures are logged here and handed back to the caller for reporting; the
/// gateway itself never aborts on them.
pub struct MixerGateway {
    index: u32,
    device: Box<dyn MixerDevice>,
}

impl MixerGateway {
    /// Opens mixer `index` through the transport.
    pub fn open(transport: &dyn MixerTransport, index: u32) -> Option<Self> {
        let device = transport.open(index);
        if device.is_none() {
            tracing::error!(index, "failed to open mixer");
        }
        device.map(|device| Self { index, device })
    }

    /// Card index the mixer was opened on.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Sets an integer control.
    ///
    /// Both channels of a stereo control are written with the same value. Only
    /// the first channel's result is reported: mono controls reject channel 1
    /// and that is not an error.
    pub fn set_integer(&mut self, name: &str, value: i32) -> Result<(), ControlError> {
        let control = self.lookup(name)?;

        let result = self
            .device
            .set_integer(control, 0, value)
            .map_err(|source| ControlError::WriteFailed {
                name: name.to_string(),
                value: value.to_string(),
                source,
            });
        if let Err(e) = &result {
            tracing::error!(error = %e, "mixer write failed");
        }

        let _ = self.device.set_integer(control, 1, value);

        result
    }

    /// Sets an enumerated control by item label.
    pub fn set_enum(&mut self, name: &str, item: &str) -> Result<(), ControlError> {
        let control = self.lookup(name)?;

        self.device
            .set_enum(control, item)
            .map_err(|source| {
                let e = ControlError::WriteFailed {
                    name: name.to_string(),
                    value: item.to_string(),
                    source,
                };
                tracing::error!(error = %e, "mixer write failed");
                e
            })
    }

    /// Sets a control to a value of either kind.
    pub fn set(&mut self, name: &str, value: &ControlValue) -> Result<(), ControlError> {
        match value {
            ControlValue::Integer(v) => self.set_integer(name, *v),
            ControlValue::Enumerated(item) => self.set_enum(name, item),
        }
    }

    fn lookup(&self, name: &str) -> Result<super::ControlId, ControlError> {
        self.device.control_by_name(name).ok_or_else(|| {
            tracing::error!(control = name, "mixer control not found");
            ControlError::NotFound {
                name: name.to_string(),
            }
        })
    }
}

impl std::fmt::Debug for MixerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerGateway")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
