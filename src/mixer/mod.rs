//! Codec mixer access: the transport seam, the control gateway, and the route program.
//!
//! The mixer is addressed by control *name* only. A [`MixerTransport`] opens a
//! [`MixerDevice`], the [`MixerGateway`] issues named writes against it and
//! logs (rather than propagates) failures, and a [`RouteProgram`] is the fixed
//! ordered list of writes that wires one acoustic path.

mod gateway;
mod route;

pub use gateway::{ControlError, MixerGateway};
pub use route::{ControlValue, MixerControlWrite, RouteOutcome, RouteProgram, RouteReport};

use crate::TransportError;

/// Opaque reference to a control on an open mixer, valid for that mixer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u32);

/// Opens mixer devices by card index.
///
/// Implemented by the platform glue; see
/// [`MockMixerTransport`](crate::transport::MockMixerTransport) for a test double.
pub trait MixerTransport: Send + Sync {
    /// Opens the mixer of card `index`, or `None` if it is unavailable.
    fn open(&self, index: u32) -> Option<Box<dyn MixerDevice>>;
}

/// An open mixer. Dropping it closes the underlying handle.
pub trait MixerDevice: Send {
    /// Looks up a control by its exact name.
    fn control_by_name(&self, name: &str) -> Option<ControlId>;

    /// Writes an integer (switch or volume) value to one channel of a control.
    fn set_integer(
        &mut self,
        control: ControlId,
        channel: u32,
        value: i32,
    ) -> Result<(), TransportError>;

    /// Selects an enumerated item of a control by its label.
    fn set_enum(&mut self, control: ControlId, item: &str) -> Result<(), TransportError>;
}
