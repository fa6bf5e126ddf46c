//! Reading state machine.
//!
//! `transition` is pure with respect to the outside world: it mutates the
//! scheduler and the session it is handed, and describes everything else
//! (network, audio, timers, persistence, presentation) as actions for the
//! runtime to perform. Every asynchronous result comes back tagged with the
//! generation it was started under and is dropped when that generation is no
//! longer current.

use super::state::{AudioSlot, PlaybackState};
use crate::config::{AppConfig, Timing};
use crate::error::PlaybackError;
use crate::generation::{Generation, GenerationCounter};
use crate::navigation::Position;
use crate::phrase::{Phrase, extract_phrase};
use crate::session::ReaderSession;
use crate::speech::{AudioClip, VoiceSettings};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Resume,
    TogglePlayPause,
    Stop,
    Skip,
    /// Result of a synthesis request; `None` means no provider produced audio.
    SpeechReady {
        generation: Generation,
        clip: Option<AudioClip>,
    },
    AudioStarted {
        generation: Generation,
    },
    AudioStartFailed {
        generation: Generation,
        error: PlaybackError,
    },
    AudioEnded {
        generation: Generation,
    },
    AudioFailed {
        generation: Generation,
        error: PlaybackError,
    },
    /// A delay elapsed; read the next phrase if still reading.
    Continue {
        generation: Generation,
    },
    /// The unlock delay elapsed; try starting the current clip again.
    RetryStart {
        generation: Generation,
    },
}

/// Work the runtime performs on behalf of the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackAction {
    Synthesize {
        generation: Generation,
        text: String,
        voice: VoiceSettings,
    },
    LoadAudio {
        generation: Generation,
        clip: AudioClip,
    },
    PauseAudio,
    ResumeAudio,
    DiscardAudio,
    UnlockAudio,
    Wake {
        after: Duration,
        event: PlaybackEvent,
    },
    SaveProgress,
    StateChanged(PlaybackState),
    /// Phrase being spoken; `None` clears the highlight.
    Highlight(Option<Phrase>),
    PageTurned(Position),
    Progress(f64),
    Status(String),
}

#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    generation: GenerationCounter,
    audio: AudioSlot,
    audio_unlocked: bool,
    start_retried: bool,
    voice: VoiceSettings,
    timing: Timing,
    skip_words: usize,
    max_phrase_words: usize,
}

impl PlaybackScheduler {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: PlaybackState::Idle,
            generation: GenerationCounter::new(),
            audio: AudioSlot::Empty,
            audio_unlocked: false,
            start_retried: false,
            voice: config.voice_settings(),
            timing: config.timing(),
            skip_words: config.skip_words,
            max_phrase_words: config.max_phrase_words,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn audio(&self) -> &AudioSlot {
        &self.audio
    }

    pub fn generation(&self) -> &GenerationCounter {
        &self.generation
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    /// Applies to the next synthesis request.
    pub fn set_voice(&mut self, voice: VoiceSettings) {
        self.voice = voice;
    }

    /// Forget the current session without emitting anything; used when a new
    /// document replaces the old one after it was stopped.
    pub fn reset(&mut self) {
        self.generation.advance();
        self.audio = AudioSlot::Empty;
        self.state = PlaybackState::Idle;
    }

    pub fn transition(
        &mut self,
        session: &mut ReaderSession,
        event: PlaybackEvent,
    ) -> Vec<PlaybackAction> {
        let mut actions = Vec::new();
        match event {
            PlaybackEvent::Play => self.on_play(session, &mut actions),
            PlaybackEvent::Pause => self.on_pause(&mut actions),
            PlaybackEvent::Resume => self.on_resume(session, &mut actions),
            PlaybackEvent::TogglePlayPause => match self.state {
                PlaybackState::Reading => self.on_pause(&mut actions),
                PlaybackState::Paused => self.on_resume(session, &mut actions),
                _ => self.on_play(session, &mut actions),
            },
            PlaybackEvent::Stop => self.on_stop(session, &mut actions),
            PlaybackEvent::Skip => self.on_skip(session, &mut actions),
            PlaybackEvent::SpeechReady { generation, clip } => {
                if self.is_stale(generation, "speech") {
                    return actions;
                }
                self.on_speech_ready(generation, clip, &mut actions);
            }
            PlaybackEvent::AudioStarted { generation } => {
                if self.is_stale(generation, "audio start") {
                    return actions;
                }
                self.on_audio_started(generation, &mut actions);
            }
            PlaybackEvent::AudioStartFailed { generation, error } => {
                if self.is_stale(generation, "audio start failure") {
                    return actions;
                }
                self.on_audio_start_failed(generation, error, &mut actions);
            }
            PlaybackEvent::AudioEnded { generation } => {
                if self.is_stale(generation, "audio end") {
                    return actions;
                }
                self.on_audio_ended(session, generation, &mut actions);
            }
            PlaybackEvent::AudioFailed { generation, error } => {
                if self.is_stale(generation, "audio error") {
                    return actions;
                }
                self.on_audio_failed(session, generation, error, &mut actions);
            }
            PlaybackEvent::Continue { generation } => {
                if self.is_stale(generation, "continue") {
                    return actions;
                }
                self.read_next_phrase(session, &mut actions);
            }
            PlaybackEvent::RetryStart { generation } => {
                if self.is_stale(generation, "start retry") {
                    return actions;
                }
                self.on_retry_start(generation, &mut actions);
            }
        }
        actions
    }

    fn is_stale(&self, generation: Generation, what: &'static str) -> bool {
        let current = self.generation.current();
        if generation != current {
            debug!(generation, current, what, "Ignoring stale playback event");
            return true;
        }
        false
    }

    fn set_state(&mut self, state: PlaybackState, actions: &mut Vec<PlaybackAction>) {
        if self.state != state {
            self.state = state;
            actions.push(PlaybackAction::StateChanged(state));
        }
    }

    fn on_play(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        match self.state {
            PlaybackState::Reading => return,
            PlaybackState::Paused => return self.on_resume(session, actions),
            _ => {}
        }
        if !session.has_words_remaining() {
            info!("Nothing left to read from the current position");
            actions.push(PlaybackAction::Status("Nothing left to read".to_string()));
            return;
        }
        if !self.audio_unlocked {
            self.audio_unlocked = true;
            actions.push(PlaybackAction::UnlockAudio);
        }
        info!(word = session.word_position(), "Starting playback");
        self.set_state(PlaybackState::Reading, actions);
        self.read_next_phrase(session, actions);
    }

    fn on_pause(&mut self, actions: &mut Vec<PlaybackAction>) {
        if self.state != PlaybackState::Reading {
            return;
        }
        if self.audio.is_loaded() {
            actions.push(PlaybackAction::PauseAudio);
        }
        self.set_state(PlaybackState::Paused, actions);
        actions.push(PlaybackAction::Status("Paused".to_string()));
    }

    fn on_resume(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        if self.state != PlaybackState::Paused {
            return;
        }
        self.set_state(PlaybackState::Reading, actions);
        actions.push(PlaybackAction::Status(reading_status(session)));

        match std::mem::take(&mut self.audio) {
            slot @ (AudioSlot::Loading { .. } | AudioSlot::Playing { .. }) => {
                self.audio = slot;
                actions.push(PlaybackAction::ResumeAudio);
            }
            AudioSlot::Pending { generation, clip } => {
                self.audio = AudioSlot::Loading {
                    generation,
                    clip: clip.clone(),
                };
                actions.push(PlaybackAction::LoadAudio { generation, clip });
            }
            slot @ AudioSlot::Synthesizing(_) => {
                // The answer is still on its way.
                self.audio = slot;
            }
            AudioSlot::Empty => self.read_next_phrase(session, actions),
        }
    }

    fn on_stop(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        if !self.state.is_active() {
            return;
        }
        info!(word = session.word_position(), "Stopping playback");
        self.halt(actions);
        self.set_state(PlaybackState::Stopped, actions);
        actions.push(PlaybackAction::Highlight(None));
        actions.push(PlaybackAction::Progress(session.progress_pct()));
        actions.push(PlaybackAction::Status("Stopped".to_string()));
        actions.push(PlaybackAction::SaveProgress);
    }

    /// Invalidate in-flight work and drop any audio.
    fn halt(&mut self, actions: &mut Vec<PlaybackAction>) {
        self.generation.advance();
        if self.audio.is_loaded() {
            actions.push(PlaybackAction::DiscardAudio);
        }
        self.audio = AudioSlot::Empty;
    }

    fn on_skip(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        if !self.state.is_active() {
            return;
        }
        self.halt(actions);

        let total = session.index().word_count();
        if total > 0 {
            let target = (session.word_position() + self.skip_words).min(total - 1);
            session.set_cursor(session.index().cursor_for_word(target));
        }
        debug!(word = session.word_position(), "Skipped forward");
        actions.push(PlaybackAction::Progress(session.progress_pct()));
        self.check_page_turn(session, actions);

        if self.state == PlaybackState::Reading {
            self.read_next_phrase(session, actions);
        }
    }

    fn check_page_turn(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        if session.turn_page_if_crossed() {
            let position = session.navigation().position();
            debug!(
                chapter = position.chapter,
                page = position.page,
                "Turned page to follow the cursor"
            );
            actions.push(PlaybackAction::PageTurned(position));
            actions.push(PlaybackAction::SaveProgress);
        }
    }

    fn read_next_phrase(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        if self.state != PlaybackState::Reading {
            return;
        }
        let generation = self.generation.advance();
        self.start_retried = false;

        let phrase = extract_phrase(session.index(), session.cursor(), self.max_phrase_words);
        if phrase.is_empty() {
            self.finish(session, actions);
            return;
        }
        session.set_cursor(phrase.end);
        debug!(
            generation,
            words = phrase.word_count,
            cursor = phrase.end,
            "Requesting speech for next phrase"
        );

        self.audio = AudioSlot::Synthesizing(generation);
        actions.push(PlaybackAction::Synthesize {
            generation,
            text: phrase.text.clone(),
            voice: self.voice.clone(),
        });
        actions.push(PlaybackAction::Status(reading_status(session)));
        actions.push(PlaybackAction::Highlight(Some(phrase)));
    }

    fn finish(&mut self, session: &mut ReaderSession, actions: &mut Vec<PlaybackAction>) {
        info!("Reached the end of the document");
        self.halt(actions);
        self.set_state(PlaybackState::Finished, actions);
        actions.push(PlaybackAction::Highlight(None));
        actions.push(PlaybackAction::Progress(session.progress_pct()));
        actions.push(PlaybackAction::Status("Finished reading".to_string()));
        actions.push(PlaybackAction::SaveProgress);
    }

    fn on_speech_ready(
        &mut self,
        generation: Generation,
        clip: Option<AudioClip>,
        actions: &mut Vec<PlaybackAction>,
    ) {
        let Some(clip) = clip else {
            warn!(generation, "No audio for phrase; moving on");
            self.audio = AudioSlot::Empty;
            actions.push(PlaybackAction::Status(
                "TTS Error: Failed to generate speech".to_string(),
            ));
            self.wake(self.timing.synthesis_retry, generation, actions);
            return;
        };

        match self.state {
            PlaybackState::Reading => {
                self.audio = AudioSlot::Loading {
                    generation,
                    clip: clip.clone(),
                };
                actions.push(PlaybackAction::LoadAudio { generation, clip });
            }
            PlaybackState::Paused => {
                debug!(generation, "Holding audio until playback resumes");
                self.audio = AudioSlot::Pending { generation, clip };
            }
            _ => {}
        }
    }

    fn on_audio_started(&mut self, generation: Generation, actions: &mut Vec<PlaybackAction>) {
        self.audio = match std::mem::take(&mut self.audio) {
            AudioSlot::Loading { clip, .. } => AudioSlot::Playing { generation, clip },
            other => other,
        };
        if self.state == PlaybackState::Paused {
            actions.push(PlaybackAction::PauseAudio);
        }
    }

    fn on_audio_start_failed(
        &mut self,
        generation: Generation,
        error: PlaybackError,
        actions: &mut Vec<PlaybackAction>,
    ) {
        if !self.start_retried {
            self.start_retried = true;
            warn!(generation, "Audio failed to start, unlocking and retrying: {error}");
            actions.push(PlaybackAction::Status(format!(
                "Error: {error}. Retrying playback"
            )));
            actions.push(PlaybackAction::UnlockAudio);
            actions.push(PlaybackAction::Wake {
                after: self.timing.unlock_retry,
                event: PlaybackEvent::RetryStart { generation },
            });
            return;
        }

        warn!(generation, "Audio playback blocked; skipping phrase: {error}");
        self.audio = AudioSlot::Empty;
        actions.push(PlaybackAction::Status(
            "Audio playback blocked. Check device settings.".to_string(),
        ));
        self.wake(self.timing.blocked_retry, generation, actions);
    }

    fn on_retry_start(&mut self, generation: Generation, actions: &mut Vec<PlaybackAction>) {
        let Some(clip) = self.audio.clip().cloned() else {
            return;
        };
        match self.state {
            PlaybackState::Reading => {
                self.audio = AudioSlot::Loading {
                    generation,
                    clip: clip.clone(),
                };
                actions.push(PlaybackAction::LoadAudio { generation, clip });
            }
            PlaybackState::Paused => {
                self.audio = AudioSlot::Pending { generation, clip };
            }
            _ => {}
        }
    }

    fn on_audio_ended(
        &mut self,
        session: &mut ReaderSession,
        generation: Generation,
        actions: &mut Vec<PlaybackAction>,
    ) {
        self.audio = AudioSlot::Empty;
        actions.push(PlaybackAction::Progress(session.progress_pct()));
        self.check_page_turn(session, actions);
        self.wake(self.timing.pacing, generation, actions);
    }

    fn on_audio_failed(
        &mut self,
        session: &mut ReaderSession,
        generation: Generation,
        error: PlaybackError,
        actions: &mut Vec<PlaybackAction>,
    ) {
        warn!(generation, "Audio playback error: {error}");
        self.audio = AudioSlot::Empty;
        actions.push(PlaybackAction::Progress(session.progress_pct()));
        actions.push(PlaybackAction::Status(format!("Audio error: {error}")));
        self.wake(self.timing.playback_error_retry, generation, actions);
    }

    /// Schedule the next phrase after `after` when still reading.
    fn wake(&self, after: Duration, generation: Generation, actions: &mut Vec<PlaybackAction>) {
        if self.state == PlaybackState::Reading {
            actions.push(PlaybackAction::Wake {
                after,
                event: PlaybackEvent::Continue { generation },
            });
        }
    }
}

fn reading_status(session: &ReaderSession) -> String {
    format!("Reading: {}% complete", session.progress_pct().round())
}
