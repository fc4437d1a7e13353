//! Playback transport over the host audio API.
//!
//! CPAL is callback driven while [`PcmDevice::write`] is blocking, so the two
//! are joined by an SPSC ring buffer sized like the hardware buffer: `write`
//! pushes frames and waits for room, the device callback drains them and pads
//! underruns with silence.
//!
//! A CPAL stream is not `Send` on every platform. Each open handle therefore
//! parks its stream on a dedicated thread and drives it with play/pause
//! commands over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::pcm::{PcmConfig, PcmDevice, PcmDirection, PcmFormat, PcmTransport};
use crate::TransportError;

/// Longest `write` waits with no room freed before giving up, in buffers.
const STALL_BUFFERS: u32 = 2;

/// PCM transport backed by the default CPAL host.
///
/// `card` selects the n-th output device the host enumerates. Only device 0,
/// playback, and S16_LE are supported; anything else, or a configuration the
/// device refuses, yields a handle that is not ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalPcmTransport;

impl CpalPcmTransport {
    /// Creates the transport.
    pub fn new() -> Self {
        Self
    }
}

impl PcmTransport for CpalPcmTransport {
    fn open(
        &self,
        card: u32,
        device: u32,
        direction: PcmDirection,
        config: &PcmConfig,
    ) -> Option<Box<dyn PcmDevice>> {
        match CpalPcm::open(card, device, direction, config) {
            Ok(pcm) => Some(Box::new(pcm)),
            Err(e) => {
                tracing::debug!(card, device, rate = config.rate, error = %e, "cpal open failed");
                Some(Box::new(UnreadyPcm {
                    error: e.to_string(),
                }))
            }
        }
    }
}

/// Handle returned when the device refused the configuration.
struct UnreadyPcm {
    error: String,
}

impl PcmDevice for UnreadyPcm {
    fn is_ready(&self) -> bool {
        false
    }

    fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::new(self.error.clone()))
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        Err(TransportError::new(self.error.clone()))
    }

    fn last_error(&self) -> String {
        self.error.clone()
    }
}

type Reply = mpsc::SyncSender<Result<(), String>>;

enum StreamCommand {
    Play(Reply),
    Pause(Reply),
}

/// Starts and pauses the device stream behind a [`PlaybackQueue`].
trait StreamControl {
    fn play(&self) -> Result<(), TransportError>;
    fn pause(&self) -> Result<(), TransportError>;
}

/// Command channel to the thread that owns the CPAL stream.
struct WorkerControl {
    commands: Option<mpsc::Sender<StreamCommand>>,
}

impl WorkerControl {
    fn is_open(&self) -> bool {
        self.commands.is_some()
    }

    /// Closing the channel ends the worker loop, which drops the stream.
    fn close(&mut self) {
        self.commands.take();
    }

    fn command(&self, make: impl FnOnce(Reply) -> StreamCommand) -> Result<(), TransportError> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| TransportError::new("playback stream closed"))?;

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        commands
            .send(make(reply_tx))
            .map_err(|_| TransportError::new("playback thread exited"))?;

        reply_rx
            .recv()
            .map_err(|_| TransportError::new("playback thread exited"))?
            .map_err(TransportError::new)
    }
}

impl StreamControl for WorkerControl {
    fn play(&self) -> Result<(), TransportError> {
        self.command(StreamCommand::Play)
    }

    fn pause(&self) -> Result<(), TransportError> {
        self.command(StreamCommand::Pause)
    }
}

/// Producer side of the ring plus the play/pause state of the stream.
///
/// `stop` raises `flush`; the render callback discards everything queued and
/// clears it. `write` pushes nothing while a flush is pending, so frames
/// queued after a stop are never discarded.
struct PlaybackQueue<C> {
    producer: HeapProd<i16>,
    flush: Arc<AtomicBool>,
    control: C,
    frame_bytes: usize,
    running: bool,
    poll_interval: Duration,
    stall_timeout: Duration,
}

impl<C: StreamControl> PlaybackQueue<C> {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if data.len() % self.frame_bytes != 0 {
            return Err(TransportError::new(format!(
                "{} bytes is not a whole number of {}-byte frames",
                data.len(),
                self.frame_bytes
            )));
        }

        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        let mut offset = 0;
        let mut last_progress = Instant::now();
        while offset < samples.len() {
            // the ring may be full from before a stop; only a running stream drains it
            if !self.running {
                self.control.play()?;
                self.running = true;
            }

            let pushed = if self.flush.load(Ordering::Acquire) {
                0
            } else {
                self.producer.push_slice(&samples[offset..])
            };
            offset += pushed;
            if offset == samples.len() {
                break;
            }

            if pushed > 0 {
                last_progress = Instant::now();
            } else if last_progress.elapsed() > self.stall_timeout {
                return Err(TransportError::new("write timed out: device not draining"));
            }
            std::thread::sleep(self.poll_interval);
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        self.flush.store(true, Ordering::Release);
        self.control.pause()
    }
}

/// Fills one device buffer from the ring, padding an underrun with silence.
fn render(consumer: &mut HeapCons<i16>, flush: &AtomicBool, data: &mut [i16]) {
    if flush.load(Ordering::Acquire) {
        consumer.clear();
        flush.store(false, Ordering::Release);
    }
    let filled = consumer.pop_slice(data);
    data[filled..].fill(0);
}

struct CpalPcm {
    queue: PlaybackQueue<WorkerControl>,
    worker: Option<JoinHandle<()>>,
    /// Set by the stream's error callback.
    stream_error: Arc<Mutex<Option<String>>>,
    last_error: String,
}

impl CpalPcm {
    fn open(
        card: u32,
        device: u32,
        direction: PcmDirection,
        config: &PcmConfig,
    ) -> Result<Self, TransportError> {
        if direction != PcmDirection::Playback {
            return Err(TransportError::new("capture is not supported by this transport"));
        }
        if device != 0 {
            return Err(TransportError::new(format!("no PCM device {device} on card {card}")));
        }
        if config.format != PcmFormat::S16Le {
            return Err(TransportError::new(format!(
                "sample format {:?} not supported",
                config.format
            )));
        }
        let channels = u16::try_from(config.channels)
            .map_err(|_| TransportError::new(format!("{} channels not supported", config.channels)))?;

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(config.rate),
            buffer_size: cpal::BufferSize::Fixed(config.period_size),
        };

        let capacity = config.buffer_frames() * config.channels as usize;
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        let stream_error = Arc::new(Mutex::new(None));
        let flush = Arc::new(AtomicBool::new(false));

        let (command_tx, command_rx) = mpsc::channel::<StreamCommand>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), TransportError>>(1);
        let callback_error = Arc::clone(&stream_error);
        let callback_flush = Arc::clone(&flush);

        let worker = std::thread::Builder::new()
            .name(format!("pcm-playback-{card}"))
            .spawn(move || {
                let stream =
                    match build_stream(card, &stream_config, consumer, callback_flush, callback_error)
                    {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                let _ = ready_tx.send(Ok(()));

                // Runs until the handle drops its sender.
                while let Ok(command) = command_rx.recv() {
                    match command {
                        StreamCommand::Play(reply) => {
                            let _ = reply.send(stream.play().map_err(|e| e.to_string()));
                        }
                        StreamCommand::Pause(reply) => {
                            let _ = reply.send(stream.pause().map_err(|e| e.to_string()));
                        }
                    }
                }
            })
            .map_err(|e| TransportError::new(format!("cannot spawn playback thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(TransportError::new("playback thread exited during open"));
            }
        }

        let period = Duration::from_secs_f64(f64::from(config.period_size) / f64::from(config.rate));

        Ok(Self {
            queue: PlaybackQueue {
                producer,
                flush,
                control: WorkerControl {
                    commands: Some(command_tx),
                },
                frame_bytes: config.frame_bytes(),
                running: false,
                poll_interval: period / 4,
                stall_timeout: period * config.period_count * STALL_BUFFERS,
            },
            worker: Some(worker),
            stream_error,
            last_error: String::new(),
        })
    }

    fn fail(&mut self, error: TransportError) -> TransportError {
        self.last_error = error.message().to_string();
        error
    }
}

impl PcmDevice for CpalPcm {
    fn is_ready(&self) -> bool {
        self.queue.control.is_open() && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let pending = self.stream_error.lock().take();
        if let Some(e) = pending {
            return Err(self.fail(TransportError::new(e)));
        }

        self.queue.write(data).map_err(|e| self.fail(e))
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        self.queue.stop().map_err(|e| self.fail(e))
    }

    fn last_error(&self) -> String {
        self.stream_error
            .lock()
            .clone()
            .unwrap_or_else(|| self.last_error.clone())
    }
}

impl Drop for CpalPcm {
    fn drop(&mut self) {
        self.queue.control.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn build_stream(
    card: u32,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<i16>,
    flush: Arc<AtomicBool>,
    errors: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, TransportError> {
    let host = cpal::default_host();
    let device = host
        .output_devices()
        .map_err(|e| TransportError::new(e.to_string()))?
        .nth(card as usize)
        .ok_or_else(|| TransportError::new(format!("no output device for card {card}")))?;

    device
        .build_output_stream(
            config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                render(&mut consumer, &flush, data);
            },
            move |err| {
                tracing::error!("playback stream error: {}", err);
                *errors.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(|e| TransportError::new(e.to_string()))
}
