//! Device selection bitmask and input acoustics flags.

/// Bitmask of logical audio devices.
///
/// Output devices occupy the low bits, input devices bit 16 and up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioDevices(pub u32);

impl AudioDevices {
    /// Earpiece receiver.
    pub const OUT_EARPIECE: Self = Self(0x1);
    /// Loudspeaker.
    pub const OUT_SPEAKER: Self = Self(0x2);
    /// Wired headset with microphone.
    pub const OUT_WIRED_HEADSET: Self = Self(0x4);
    /// Wired headphones.
    pub const OUT_WIRED_HEADPHONE: Self = Self(0x8);
    /// Bluetooth SCO.
    pub const OUT_BLUETOOTH_SCO: Self = Self(0x10);
    /// Bluetooth SCO headset.
    pub const OUT_BLUETOOTH_SCO_HEADSET: Self = Self(0x20);
    /// Bluetooth SCO car kit.
    pub const OUT_BLUETOOTH_SCO_CARKIT: Self = Self(0x40);
    /// Bluetooth A2DP.
    pub const OUT_BLUETOOTH_A2DP: Self = Self(0x80);
    /// Bluetooth A2DP headphones.
    pub const OUT_BLUETOOTH_A2DP_HEADPHONES: Self = Self(0x100);
    /// Bluetooth A2DP speaker.
    pub const OUT_BLUETOOTH_A2DP_SPEAKER: Self = Self(0x200);
    /// Digital output (HDMI).
    pub const OUT_AUX_DIGITAL: Self = Self(0x400);
    /// Output chosen by policy.
    pub const OUT_DEFAULT: Self = Self(0x8000);

    /// Communication (voice) input.
    pub const IN_COMMUNICATION: Self = Self(0x1_0000);
    /// Ambient noise input.
    pub const IN_AMBIENT: Self = Self(0x2_0000);
    /// Built-in microphone.
    pub const IN_BUILTIN_MIC: Self = Self(0x4_0000);
    /// Bluetooth SCO headset microphone.
    pub const IN_BLUETOOTH_SCO_HEADSET: Self = Self(0x8_0000);
    /// Wired headset microphone.
    pub const IN_WIRED_HEADSET: Self = Self(0x10_0000);
    /// Digital input (HDMI).
    pub const IN_AUX_DIGITAL: Self = Self(0x20_0000);
    /// Voice call uplink/downlink.
    pub const IN_VOICE_CALL: Self = Self(0x40_0000);
    /// Back microphone.
    pub const IN_BACK_MIC: Self = Self(0x80_0000);
    /// Input chosen by policy.
    pub const IN_DEFAULT: Self = Self(0x8000_0000);

    /// Every input device bit.
    pub const IN_ALL: Self = Self(
        Self::IN_COMMUNICATION.0
            | Self::IN_AMBIENT.0
            | Self::IN_BUILTIN_MIC.0
            | Self::IN_BLUETOOTH_SCO_HEADSET.0
            | Self::IN_WIRED_HEADSET.0
            | Self::IN_AUX_DIGITAL.0
            | Self::IN_VOICE_CALL.0
            | Self::IN_BACK_MIC.0
            | Self::IN_DEFAULT.0,
    );

    /// Returns the raw mask.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if the mask names exactly one input device.
    ///
    /// Combinations of input devices, output devices, and the empty mask are
    /// all rejected.
    pub fn is_input_device(self) -> bool {
        self.0.count_ones() == 1 && (self.0 & !Self::IN_ALL.0) == 0
    }
}

impl std::ops::BitOr for AudioDevices {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Input pre-processing flags requested with an input stream.
///
/// Accepted for interface compatibility; this hardware applies none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AcousticsMode(pub u32);

impl AcousticsMode {
    /// No pre-processing.
    pub const NONE: Self = Self(0);
    /// Automatic gain control.
    pub const AGC_ENABLE: Self = Self(0x1);
    /// Noise suppression.
    pub const NS_ENABLE: Self = Self(0x2);
    /// Transmit IIR filter.
    pub const TX_IIR_ENABLE: Self = Self(0x4);
}
