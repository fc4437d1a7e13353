//! Integration tests for tiny-audio-hal.
//!
//! Everything here runs against the mock transports. Tests that need a real
//! playback device live next to the CPAL transport and are `#[ignore]`d.

#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;

use tiny_audio_hal::format::{AcousticsMode, AudioDevices, AudioFormat, ChannelMask, StreamParams};
use tiny_audio_hal::mixer::ControlValue;
use tiny_audio_hal::transport::{MockMixerTransport, MockPcmTransport};
use tiny_audio_hal::{status_of, AudioHardware, HalConfig, HalError, BAD_VALUE, INVALID_OPERATION};

fn hardware(mixer: &MockMixerTransport, pcm: &MockPcmTransport) -> AudioHardware {
    AudioHardware::new(HalConfig::default(), mixer, Arc::new(pcm.clone()))
}

fn mono_8k() -> StreamParams {
    StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_MONO, 8000)
}

#[test]
fn test_concurrent_output_opens_yield_one_stream() {
    let mixer = MockMixerTransport::new();
    let pcm = MockPcmTransport::new();
    let hw = Arc::new(hardware(&mixer, &pcm));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let hw = Arc::clone(&hw);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let opened: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(opened.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.status() == INVALID_OPERATION));

    // the winner is untouched by the losers
    assert!(opened[0].write(&[0u8; 4096]).is_ok());
    assert_eq!(pcm.open_handles(), 1);
    // the route program ran exactly once
    assert_eq!(mixer.writes().iter().filter(|w| w.name == "DSP1RX").count(), 1);
}

#[test]
fn test_concurrent_input_opens_yield_one_stream() {
    let hw = Arc::new(hardware(&MockMixerTransport::new(), &MockPcmTransport::new()));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let hw = Arc::clone(&hw);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                hw.open_input_stream(
                    AudioDevices::IN_BUILTIN_MIC,
                    &mut mono_8k(),
                    AcousticsMode::NONE,
                )
                .is_ok()
            })
        })
        .collect();

    let opened = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(opened, 1);
}

#[test]
fn test_output_falls_back_to_48k() {
    let pcm = MockPcmTransport::accepting(&[48_000]);
    let hw = hardware(&MockMixerTransport::new(), &pcm);
    let mut params = StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::OUT_STEREO, 44_100);

    let out = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut params)
        .unwrap();

    assert_eq!(out.sample_rate(), 48_000);
    assert_eq!(params.sample_rate, Some(48_000));
    assert_eq!(pcm.open_handles(), 1);
}

#[test]
fn test_output_fails_when_no_rate_accepted() {
    let mixer = MockMixerTransport::new();
    let pcm = MockPcmTransport::accepting(&[]);
    let hw = hardware(&mixer, &pcm);

    let result = hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default());

    assert_eq!(status_of(&result), BAD_VALUE);
    assert!(hw.output_stream().is_none());
    assert_eq!(pcm.open_handles(), 0);
    // mixer routing is not rolled back
    assert!(!mixer.writes().is_empty());

    // the slot is free for a later attempt
    let retry = hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default());
    assert!(matches!(retry, Err(HalError::BadValue { .. })));
}

#[test]
fn test_output_route_ignores_device_mask() {
    let speaker = MockMixerTransport::new();
    let headset = MockMixerTransport::new();
    let pcm = MockPcmTransport::new();

    hardware(&speaker, &pcm)
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    hardware(&headset, &pcm)
        .open_output_stream(AudioDevices::OUT_WIRED_HEADPHONE, &mut StreamParams::default())
        .unwrap();

    assert_eq!(speaker.writes(), headset.writes());
}

#[test]
fn test_route_program_applied_in_order() {
    let mixer = MockMixerTransport::new();
    let hw = hardware(&mixer, &MockPcmTransport::new());

    hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();

    let writes = mixer.writes();
    assert_eq!(writes[0].name, "DSP1RX");
    assert_eq!(writes[0].value, ControlValue::Enumerated("AIF1".to_string()));
    let last = writes.last().unwrap();
    assert_eq!(last.name, "DSP2 EQ Switch");
    assert_eq!(last.value, ControlValue::Integer(1));
}

#[test]
fn test_failed_control_does_not_fail_open() {
    let mixer = MockMixerTransport::new();
    mixer.fail_control("Sub Speaker Volume");
    let hw = hardware(&mixer, &MockPcmTransport::new());

    let out = hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default());

    assert!(out.is_ok());
    let report = hw.last_route_report().unwrap();
    assert_eq!(report.failures().count(), 1);
    // writes after the failing entry still ran
    assert!(mixer.writes().iter().any(|w| w.name == "DSP2 EQ Switch"));
}

#[test]
fn test_input_capability_match() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let mut params = mono_8k();

    let input = hw
        .open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut params, AcousticsMode::NONE)
        .unwrap();

    assert_eq!(params, mono_8k());
    assert_eq!(input.sample_rate(), 8000);
}

#[test]
fn test_input_capability_mismatch_rewrites_params() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());

    for mut params in [
        StreamParams::new(AudioFormat::PCM_8_BIT, ChannelMask::IN_MONO, 8000),
        StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_STEREO, 8000),
        StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_MONO, 16_000),
    ] {
        let result =
            hw.open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut params, AcousticsMode::NONE);

        assert!(matches!(result, Err(HalError::BadValue { .. })));
        assert_eq!(params, mono_8k());
        assert!(hw.input_stream().is_none());
    }
}

#[test]
fn test_input_retry_with_rewritten_params() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let mut params = StreamParams::new(AudioFormat::PCM_16_BIT, ChannelMask::IN_STEREO, 44_100);

    assert!(hw
        .open_input_stream(AudioDevices::IN_WIRED_HEADSET, &mut params, AcousticsMode::NONE)
        .is_err());
    let input = hw
        .open_input_stream(AudioDevices::IN_WIRED_HEADSET, &mut params, AcousticsMode::NONE)
        .unwrap();

    let mut buffer = [0u8; 320];
    assert!(matches!(
        input.read(&mut buffer),
        Err(HalError::NotInitialized { .. })
    ));
}

#[test]
fn test_set_then_get_routing() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let out = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    let input = hw
        .open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut mono_8k(), AcousticsMode::NONE)
        .unwrap();

    out.set_parameters("routing=5").unwrap();
    input.set_parameters("routing=5").unwrap();

    assert_eq!(out.get_parameters("routing"), "routing=5");
    assert_eq!(input.get_parameters("routing"), "routing=5");
}

#[test]
fn test_partial_parameter_application_persists() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let out = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();

    let result = out.set_parameters("routing=5;bogus=1");

    assert_eq!(status_of(&result), BAD_VALUE);
    assert_eq!(out.get_parameters("routing"), "routing=5");
}

#[test]
fn test_closing_stale_stream_is_noop() {
    let pcm = MockPcmTransport::new();
    let hw = hardware(&MockMixerTransport::new(), &pcm);

    let stale = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    hw.close_output_stream(&stale);
    let current = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();

    hw.close_output_stream(&stale);

    assert!(Arc::ptr_eq(&hw.output_stream().unwrap(), &current));
    assert!(current.write(&[0u8; 64]).is_ok());
    assert_eq!(pcm.open_handles(), 1);
}

#[test]
fn test_closing_foreign_stream_is_noop() {
    let hw_a = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let hw_b = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    let out_a = hw_a
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    let out_b = hw_b
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    let in_b = hw_b
        .open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut mono_8k(), AcousticsMode::NONE)
        .unwrap();

    hw_a.close_output_stream(&out_b);
    hw_a.close_input_stream(&in_b);

    assert!(Arc::ptr_eq(&hw_a.output_stream().unwrap(), &out_a));
    assert!(out_b.write(&[0u8; 4]).is_ok());
    assert!(hw_b.input_stream().is_some());
}

#[test]
fn test_teardown_releases_every_handle() {
    let mixer = MockMixerTransport::new();
    let pcm = MockPcmTransport::accepting(&[48_000]);
    let hw = hardware(&mixer, &pcm);

    let out = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    let _input = hw
        .open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut mono_8k(), AcousticsMode::NONE)
        .unwrap();
    drop(hw);

    let pcm_stats = pcm.stats();
    assert_eq!(pcm_stats.opens, pcm_stats.closes);
    let mixer_stats = mixer.stats();
    assert_eq!(mixer_stats.opens, 1);
    assert_eq!(mixer_stats.opens, mixer_stats.closes);

    // the caller's handle outlives the façade but no longer reaches hardware
    assert!(out.write(&[0u8; 4]).is_err());
}

#[test]
fn test_teardown_without_streams() {
    let mixer = MockMixerTransport::new();
    let pcm = MockPcmTransport::new();
    drop(hardware(&mixer, &pcm));

    assert_eq!(mixer.stats().closes, 1);
    assert_eq!(pcm.stats().open_attempts, 0);
}

#[test]
fn test_write_success_masks_transport_failure() {
    // Output write reports success even if the transport rejected the data.
    let pcm = MockPcmTransport::new();
    let hw = hardware(&MockMixerTransport::new(), &pcm);
    let out = hw
        .open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    pcm.set_fail_writes(true);

    assert!(out.write(&[0u8; 4096]).is_ok());
    assert_eq!(pcm.stats().bytes_written, 0);
}

#[test]
fn test_dump_with_streams() {
    let hw = hardware(&MockMixerTransport::new(), &MockPcmTransport::new());
    hw.open_output_stream(AudioDevices::OUT_SPEAKER, &mut StreamParams::default())
        .unwrap();
    hw.open_input_stream(AudioDevices::IN_BUILTIN_MIC, &mut mono_8k(), AcousticsMode::NONE)
        .unwrap();

    let mut out = Vec::new();
    hw.dump(&mut out, &["-v".to_string()]).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("AudioHardware:"));
    assert!(text.contains("InputStream:"));
    assert!(text.contains("OutputStream:"));
}

#[test]
fn test_config_file_route() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hal.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
mixer = 1

[[route]]
name = "HPOUT1 Volume"
value = 40

[[route]]
name = "Headphone Mux"
value = "DAC"
"#
    )
    .unwrap();

    let config = HalConfig::load(&path).unwrap();
    let mixer = MockMixerTransport::new();
    let hw = AudioHardware::new(config, &mixer, Arc::new(MockPcmTransport::new()));
    hw.open_output_stream(AudioDevices::OUT_WIRED_HEADPHONE, &mut StreamParams::default())
        .unwrap();

    let names: Vec<_> = mixer.writes().into_iter().map(|w| w.name).collect();
    assert_eq!(names, vec!["HPOUT1 Volume", "HPOUT1 Volume", "Headphone Mux"]);
}
