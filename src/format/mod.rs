//! Audio format, channel and device descriptors exchanged with the host framework.
//!
//! These are transparent newtypes over the integer encodings a conventional
//! audio HAL uses, so values the hardware does not support can still be
//! represented, compared, and rejected.

mod devices;

pub use devices::{AcousticsMode, AudioDevices};

/// Encoded sample format requested by, or reported to, the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioFormat(pub u32);

impl AudioFormat {
    /// Let the HAL choose.
    pub const DEFAULT: Self = Self(0);
    /// Signed 16-bit linear PCM.
    pub const PCM_16_BIT: Self = Self(0x1);
    /// Unsigned 8-bit linear PCM.
    pub const PCM_8_BIT: Self = Self(0x2);

    /// Returns the raw encoding.
    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Channel position mask.
///
/// Output and input masks share a bit space but use different layouts, so the
/// constants are prefixed by direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(pub u32);

impl ChannelMask {
    /// Output front left.
    pub const OUT_FRONT_LEFT: Self = Self(0x4);
    /// Output front right.
    pub const OUT_FRONT_RIGHT: Self = Self(0x8);
    /// Output mono.
    pub const OUT_MONO: Self = Self::OUT_FRONT_LEFT;
    /// Output stereo (front left + front right).
    pub const OUT_STEREO: Self = Self(0x4 | 0x8);
    /// Input left.
    pub const IN_LEFT: Self = Self(0x4);
    /// Input right.
    pub const IN_RIGHT: Self = Self(0x8);
    /// Input front.
    pub const IN_FRONT: Self = Self(0x10);
    /// Input mono.
    pub const IN_MONO: Self = Self::IN_FRONT;
    /// Input stereo.
    pub const IN_STEREO: Self = Self(0x4 | 0x8);

    /// Returns the raw mask.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Number of channel positions set in the mask.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// The format/channels/rate triple a caller passes in and receives back.
///
/// A field set to `None` is the equivalent of the caller passing no storage
/// for it. Open calls overwrite the fields with the values the hardware
/// actually uses, so a caller whose request was rejected can retry with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamParams {
    /// Sample format.
    pub format: Option<AudioFormat>,
    /// Channel mask.
    pub channels: Option<ChannelMask>,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
}

impl StreamParams {
    /// Creates a fully specified request.
    pub fn new(format: AudioFormat, channels: ChannelMask, sample_rate: u32) -> Self {
        Self {
            format: Some(format),
            channels: Some(channels),
            sample_rate: Some(sample_rate),
        }
    }

    /// Returns `true` if every field is present.
    pub fn is_complete(&self) -> bool {
        self.format.is_some() && self.channels.is_some() && self.sample_rate.is_some()
    }
}
