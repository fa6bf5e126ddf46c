//! Audio output.
//!
//! `rodio`'s output stream is not `Send`, so the device lives on a dedicated
//! thread that receives commands over a channel and reports back through the
//! runtime's event channel.

use super::scheduler::PlaybackEvent;
use crate::error::PlaybackError;
use crate::generation::{Generation, GenerationCounter};
use crate::speech::AudioClip;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sample, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

const END_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// An unpaused clip whose samples stop being consumed for this long is
/// reported as failed.
const STALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Device seam used by the runtime.
///
/// Implementations report `AudioStarted`/`AudioStartFailed` for every
/// `load`, then `AudioEnded` or `AudioFailed` for clips that started.
pub trait AudioOutput: Send {
    fn load(&mut self, generation: Generation, clip: AudioClip);
    fn pause(&mut self);
    fn resume(&mut self);
    fn discard(&mut self);
    /// Make sure the device is open before the first clip.
    fn unlock(&mut self);
}

enum AudioCommand {
    Load(Generation, AudioClip),
    Pause,
    Resume,
    Discard,
    Unlock,
    Shutdown,
}

pub struct RodioOutput {
    commands: mpsc::Sender<AudioCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    pub fn spawn(
        events: UnboundedSender<PlaybackEvent>,
        generation: GenerationCounter,
        fetch_timeout: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let backend = RodioBackend::new(fetch_timeout);
                AudioWorker::new(events, generation, backend, STALL_TIMEOUT).run(rx);
            })
            .map_err(|err| warn!("Failed to start audio thread: {err}"))
            .ok();
        Self {
            commands: tx,
            worker,
        }
    }

    fn send(&self, command: AudioCommand) {
        if self.commands.send(command).is_err() {
            warn!("Audio thread is gone; dropping command");
        }
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, generation: Generation, clip: AudioClip) {
        self.send(AudioCommand::Load(generation, clip));
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(AudioCommand::Resume);
    }

    fn discard(&mut self) {
        self.send(AudioCommand::Discard);
    }

    fn unlock(&mut self) {
        self.send(AudioCommand::Unlock);
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.commands.send(AudioCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// A clip handed to the device.
trait PlayingClip {
    fn pause(&self);
    fn play(&self);
    fn stop(&self);
    fn is_finished(&self) -> bool;
    /// Samples the device has consumed so far.
    fn samples_played(&self) -> u64;
}

/// What the worker needs from the platform: fetching, decoding and playing.
trait AudioBackend {
    type Clip: PlayingClip;

    fn unlock(&mut self) -> Result<(), PlaybackError>;
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlaybackError>;
    fn start(&mut self, bytes: Vec<u8>) -> Result<Self::Clip, PlaybackError>;
}

struct Device {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

struct RodioBackend {
    http: Option<reqwest::blocking::Client>,
    device: Option<Device>,
}

impl RodioBackend {
    fn new(fetch_timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|err| warn!("Failed to build audio HTTP client: {err}"))
            .ok();
        Self { http, device: None }
    }

    fn open_device(&mut self, reopen: bool) -> Result<&OutputStreamHandle, PlaybackError> {
        if reopen || self.device.is_none() {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|err| PlaybackError::Device(err.to_string()))?;
            info!("Opened audio output");
            self.device = Some(Device {
                _stream: stream,
                handle,
            });
        }
        self.device
            .as_ref()
            .map(|device| &device.handle)
            .ok_or_else(|| PlaybackError::Device("no output device".to_string()))
    }
}

impl AudioBackend for RodioBackend {
    type Clip = RodioClip;

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        self.open_device(true).map(|_| ())
    }

    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let client = self
            .http
            .as_ref()
            .ok_or_else(|| PlaybackError::Fetch("HTTP client unavailable".to_string()))?;
        let response = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| PlaybackError::Fetch(err.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|err| PlaybackError::Fetch(err.to_string()))?;
        debug!(bytes = bytes.len(), "Fetched remote audio");
        Ok(bytes.to_vec())
    }

    /// Decodes the whole clip before playing it, so corrupt audio fails to
    /// start instead of cutting out halfway.
    fn start(&mut self, bytes: Vec<u8>) -> Result<RodioClip, PlaybackError> {
        let decoder =
            Decoder::new(Cursor::new(bytes)).map_err(|err| PlaybackError::Decode(err.to_string()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();
        if samples.is_empty() {
            return Err(PlaybackError::Decode("clip contains no audio".to_string()));
        }

        let played = Arc::new(AtomicU64::new(0));
        let source = Counted {
            inner: SamplesBuffer::new(channels, sample_rate, samples),
            played: played.clone(),
        };
        let handle = self.open_device(false)?;
        let sink = Sink::try_new(handle).map_err(|err| PlaybackError::Device(err.to_string()))?;
        sink.append(source);
        sink.play();
        Ok(RodioClip { sink, played })
    }
}

struct RodioClip {
    sink: Sink,
    played: Arc<AtomicU64>,
}

impl PlayingClip for RodioClip {
    fn pause(&self) {
        self.sink.pause();
    }

    fn play(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.sink.stop();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn samples_played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }
}

/// Counts samples as the mixer pulls them.
struct Counted<S> {
    inner: S,
    played: Arc<AtomicU64>,
}

impl<S: Iterator> Iterator for Counted<S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<S::Item> {
        let sample = self.inner.next()?;
        self.played.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }
}

impl<S> Source for Counted<S>
where
    S: Source,
    S::Item: Sample,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

struct AudioWorker<B: AudioBackend> {
    events: UnboundedSender<PlaybackEvent>,
    generation: GenerationCounter,
    backend: B,
    clip: Option<B::Clip>,
    playing: Option<Generation>,
    paused: bool,
    stall_timeout: Duration,
    last_played: u64,
    last_progress: Instant,
}

impl<B: AudioBackend> AudioWorker<B> {
    fn new(
        events: UnboundedSender<PlaybackEvent>,
        generation: GenerationCounter,
        backend: B,
        stall_timeout: Duration,
    ) -> Self {
        Self {
            events,
            generation,
            backend,
            clip: None,
            playing: None,
            paused: false,
            stall_timeout,
            last_played: 0,
            last_progress: Instant::now(),
        }
    }

    fn run(mut self, commands: mpsc::Receiver<AudioCommand>) {
        loop {
            match commands.recv_timeout(END_POLL_INTERVAL) {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.poll();
        }
        debug!("Audio thread exiting");
    }

    /// Returns false on shutdown.
    fn handle(&mut self, command: AudioCommand) -> bool {
        match command {
            AudioCommand::Load(generation, clip) => self.load(generation, clip),
            AudioCommand::Pause => {
                self.paused = true;
                if let Some(clip) = &self.clip {
                    clip.pause();
                }
            }
            AudioCommand::Resume => {
                self.paused = false;
                self.last_progress = Instant::now();
                if let Some(clip) = &self.clip {
                    clip.play();
                }
            }
            AudioCommand::Discard => {
                self.drop_clip();
                self.paused = false;
            }
            AudioCommand::Unlock => {
                if let Err(err) = self.backend.unlock() {
                    warn!("Audio unlock failed: {err}");
                }
            }
            AudioCommand::Shutdown => return false,
        }
        true
    }

    fn load(&mut self, generation: Generation, clip: AudioClip) {
        self.drop_clip();
        // Loads are only issued while reading.
        self.paused = false;
        if !self.generation.is_current(generation) {
            debug!(generation, "Skipping load for a superseded phrase");
            return;
        }
        let bytes = match clip {
            AudioClip::Bytes(bytes) => bytes,
            AudioClip::Remote(url) => match self.backend.fetch(&url) {
                Ok(bytes) => bytes,
                Err(error) => {
                    self.report(PlaybackEvent::AudioStartFailed { generation, error });
                    return;
                }
            },
        };
        if !self.generation.is_current(generation) {
            debug!(generation, "Dropping audio fetched for a superseded phrase");
            return;
        }
        match self.backend.start(bytes) {
            Ok(clip) => {
                self.last_played = clip.samples_played();
                self.last_progress = Instant::now();
                self.clip = Some(clip);
                self.playing = Some(generation);
                self.report(PlaybackEvent::AudioStarted { generation });
            }
            Err(error) => self.report(PlaybackEvent::AudioStartFailed { generation, error }),
        }
    }

    fn drop_clip(&mut self) {
        if let Some(clip) = self.clip.take() {
            clip.stop();
        }
        self.playing = None;
    }

    /// Report a finished clip, or a failed one when the device stopped
    /// consuming samples while unpaused.
    fn poll(&mut self) {
        let Some(generation) = self.playing else {
            return;
        };
        let Some(clip) = &self.clip else {
            self.playing = None;
            return;
        };
        if clip.is_finished() {
            self.clip = None;
            self.playing = None;
            self.report(PlaybackEvent::AudioEnded { generation });
            return;
        }
        if self.paused {
            return;
        }
        let played = clip.samples_played();
        if played != self.last_played {
            self.last_played = played;
            self.last_progress = Instant::now();
            return;
        }
        if self.last_progress.elapsed() >= self.stall_timeout {
            warn!(generation, "Audio output stopped consuming samples");
            self.drop_clip();
            self.report(PlaybackEvent::AudioFailed {
                generation,
                error: PlaybackError::Device("audio output stalled".to_string()),
            });
        }
    }

    fn report(&self, event: PlaybackEvent) {
        if self.events.send(event).is_err() {
            debug!("Playback runtime is gone; dropping audio event");
        }
    }
}
