//! Playback configuration negotiation with rate fallback.

use super::{PcmConfig, PcmDevice, PcmDirection, PcmFormat, PcmTransport};
use crate::HalError;

/// Playback rates tried in order until the device accepts one.
pub const PLAYBACK_RATES: [u32; 2] = [44_100, 48_000];

/// Playback is always stereo.
pub const PLAYBACK_CHANNELS: u32 = 2;

/// Frames per period for playback.
pub const PLAYBACK_PERIOD_SIZE: u32 = 2048;

/// Periods in the playback buffer.
pub const PLAYBACK_PERIOD_COUNT: u32 = 12;

/// Builds the fixed playback configuration at the given rate.
pub fn playback_template(rate: u32) -> PcmConfig {
    PcmConfig {
        channels: PLAYBACK_CHANNELS,
        period_size: PLAYBACK_PERIOD_SIZE,
        period_count: PLAYBACK_PERIOD_COUNT,
        format: PcmFormat::S16Le,
        rate,
    }
}

/// An open, ready playback device and the configuration it accepted.
pub struct NegotiatedPcm {
    /// The open device.
    pub device: Box<dyn PcmDevice>,
    /// Configuration the device accepted.
    pub config: PcmConfig,
}

impl std::fmt::Debug for NegotiatedPcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiatedPcm")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Opens the playback device, falling back through [`PLAYBACK_RATES`].
///
/// Every handle that is missing or not ready is dropped before the next
/// attempt. Once the list is exhausted the open fails with `BadValue`.
pub fn negotiate_playback(
    transport: &dyn PcmTransport,
    card: u32,
    device: u32,
) -> Result<NegotiatedPcm, HalError> {
    let mut last_error = String::from("no handle returned");

    for rate in PLAYBACK_RATES {
        let config = playback_template(rate);

        match transport.open(card, device, PcmDirection::Playback, &config) {
            Some(pcm) if pcm.is_ready() => {
                tracing::info!(card, device, rate, "playback device opened");
                return Ok(NegotiatedPcm {
                    device: pcm,
                    config,
                });
            }
            Some(pcm) => {
                last_error = pcm.last_error();
                tracing::debug!(rate, error = %last_error, "playback device not ready");
            }
            None => {
                last_error = String::from("no handle returned");
                tracing::debug!(rate, "playback device open returned no handle");
            }
        }
    }

    tracing::error!(card, device, error = %last_error, "failed to open playback device");
    Err(HalError::bad_value(format!(
        "no playback rate in {PLAYBACK_RATES:?} accepted: {last_error}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockPcmTransport;

    #[test]
    fn test_template() {
        let config = playback_template(48_000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.period_size, 2048);
        assert_eq!(config.period_count, 12);
        assert_eq!(config.format, PcmFormat::S16Le);
        assert_eq!(config.rate, 48_000);
    }

    #[test]
    fn test_preferred_rate_accepted() {
        let transport = MockPcmTransport::new();
        let pcm = negotiate_playback(&transport, 0, 0).unwrap();

        assert_eq!(pcm.config.rate, 44_100);
        assert_eq!(transport.stats().open_attempts, 1);
    }

    #[test]
    fn test_falls_back_to_48k() {
        let transport = MockPcmTransport::accepting(&[48_000]);
        let pcm = negotiate_playback(&transport, 0, 0).unwrap();

        assert_eq!(pcm.config.rate, 48_000);
        let stats = transport.stats();
        assert_eq!(stats.open_attempts, 2);
        assert_eq!(stats.requested_rates, vec![44_100, 48_000]);
        // the rejected 44.1k handle was closed
        assert_eq!(stats.closes, 1);
    }

    #[test]
    fn test_falls_back_after_null_handle() {
        let transport = MockPcmTransport::accepting(&[48_000]).with_null_handles();
        let pcm = negotiate_playback(&transport, 0, 0).unwrap();

        assert_eq!(pcm.config.rate, 48_000);
        assert_eq!(transport.stats().opens, 1);
    }

    #[test]
    fn test_exhausted_fallbacks() {
        let transport = MockPcmTransport::accepting(&[22_050]);
        let err = negotiate_playback(&transport, 0, 0).unwrap_err();

        assert!(matches!(err, HalError::BadValue { .. }));
        let stats = transport.stats();
        assert_eq!(stats.open_attempts, 2);
        assert_eq!(stats.opens, stats.closes);
    }

    #[test]
    fn test_no_third_tier() {
        let transport = MockPcmTransport::accepting(&[32_000, 96_000]);
        assert!(negotiate_playback(&transport, 0, 0).is_err());
        assert_eq!(transport.stats().requested_rates, vec![44_100, 48_000]);
    }
}
