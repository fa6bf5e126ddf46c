//! User-facing controller.
//!
//! Maps commands from the presentation layer onto navigation and the
//! playback scheduler. Any navigation that changes the position halts an
//! active reading session first; whether reading restarts at the new page is
//! configurable, while a sentence jump always restarts.

use crate::cache::ProgressRecord;
use crate::config::{AppConfig, clamp_rate};
use crate::loader::Document;
use crate::navigation::NavigationState;
use crate::playback::{PlaybackAction, PlaybackEvent, PlaybackScheduler, PlaybackState};
use crate::session::ReaderSession;
use crate::speech::{VoiceSettings, find_voice};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderCommand {
    TogglePlayPause,
    Play,
    Pause,
    Resume,
    Stop,
    Skip,
    NextPage,
    PreviousPage,
    NextChapter,
    PreviousChapter,
    /// Zero-based chapter index.
    GoToChapter(usize),
    /// Zero-based page index within the current chapter.
    GoToPage(usize),
    /// Start reading at the given sentence of the displayed page.
    ReadFromSentence(usize),
    SetVoice(String),
    SetSpeed(f32),
    SetPitch(f32),
    Open(PathBuf),
    Paste(String),
    LoadSample,
    Status,
    Quit,
}

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Playback(PlaybackAction),
    /// Re-render the current page.
    RenderPage,
    /// Extract a document off the main loop and feed it back.
    LoadDocument(PathBuf),
    /// Look up saved progress for the document, then open it.
    OpenDocument(Document),
    /// A new document replaced the previous one.
    DocumentOpened,
    /// Persist a snapshot taken when the effect was produced.
    SaveProgress(ProgressRecord),
    Notice(String),
    Quit,
}

pub struct Reader {
    config: AppConfig,
    session: Option<ReaderSession>,
    scheduler: PlaybackScheduler,
}

impl Reader {
    pub fn new(config: AppConfig) -> Self {
        let scheduler = PlaybackScheduler::new(&config);
        Self {
            config,
            session: None,
            scheduler,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&ReaderSession> {
        self.session.as_ref()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn voice(&self) -> &VoiceSettings {
        self.scheduler.voice()
    }

    /// Replace the open document. The previous session is stopped first so
    /// its progress is saved under its own name.
    pub fn open_document(
        &mut self,
        document: Document,
        saved: Option<ProgressRecord>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.halt(&mut effects);
        self.scheduler.reset();
        self.session = Some(ReaderSession::open(
            document,
            self.config.words_per_page,
            saved.as_ref(),
        ));
        effects.push(Effect::DocumentOpened);
        effects.push(Effect::RenderPage);
        self.save(&mut effects);
        effects
    }

    pub fn reduce(&mut self, command: ReaderCommand) -> Vec<Effect> {
        let mut effects = Vec::new();
        match command {
            ReaderCommand::TogglePlayPause => {
                self.dispatch(PlaybackEvent::TogglePlayPause, &mut effects)
            }
            ReaderCommand::Play => self.dispatch(PlaybackEvent::Play, &mut effects),
            ReaderCommand::Pause => self.dispatch(PlaybackEvent::Pause, &mut effects),
            ReaderCommand::Resume => self.dispatch(PlaybackEvent::Resume, &mut effects),
            ReaderCommand::Stop => self.dispatch(PlaybackEvent::Stop, &mut effects),
            ReaderCommand::Skip => self.dispatch(PlaybackEvent::Skip, &mut effects),
            ReaderCommand::NextPage => self.navigate(NavigationState::next_page, &mut effects),
            ReaderCommand::PreviousPage => {
                self.navigate(NavigationState::previous_page, &mut effects)
            }
            ReaderCommand::NextChapter => {
                self.navigate(NavigationState::next_chapter, &mut effects)
            }
            ReaderCommand::PreviousChapter => {
                self.navigate(NavigationState::previous_chapter, &mut effects)
            }
            ReaderCommand::GoToChapter(chapter) => {
                self.navigate(|nav| nav.go_to_chapter(chapter), &mut effects)
            }
            ReaderCommand::GoToPage(page) => {
                self.navigate(|nav| nav.go_to_page(page), &mut effects)
            }
            ReaderCommand::ReadFromSentence(sentence) => {
                self.handle_read_from_sentence(sentence, &mut effects)
            }
            ReaderCommand::SetVoice(voice_id) => self.handle_set_voice(&voice_id, &mut effects),
            ReaderCommand::SetSpeed(speed) => {
                let mut voice = self.scheduler.voice().clone();
                voice.speed = clamp_rate(speed);
                effects.push(Effect::Notice(format!("Speed {:.1}x", voice.speed)));
                self.scheduler.set_voice(voice);
            }
            ReaderCommand::SetPitch(pitch) => {
                let mut voice = self.scheduler.voice().clone();
                voice.pitch = clamp_rate(pitch);
                effects.push(Effect::Notice(format!("Pitch {:.1}", voice.pitch)));
                self.scheduler.set_voice(voice);
            }
            ReaderCommand::Open(path) => effects.push(Effect::LoadDocument(path)),
            ReaderCommand::Paste(text) => match Document::from_pasted(&text) {
                Ok(document) => effects.push(Effect::OpenDocument(document)),
                Err(err) => {
                    warn!("Rejected pasted text: {err}");
                    effects.push(Effect::Notice("Please paste some text first".to_string()));
                }
            },
            ReaderCommand::LoadSample => effects.push(Effect::OpenDocument(Document::sample())),
            ReaderCommand::Status => effects.push(Effect::Notice(self.status_line())),
            ReaderCommand::Quit => {
                self.halt(&mut effects);
                effects.push(Effect::Quit);
            }
        }
        effects
    }

    /// Feed an asynchronous completion back into the scheduler.
    pub fn handle_playback(&mut self, event: PlaybackEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.dispatch(event, &mut effects);
        effects
    }

    fn dispatch(&mut self, event: PlaybackEvent, effects: &mut Vec<Effect>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let actions = self.scheduler.transition(session, event);
        for action in actions {
            match action {
                // Snapshot now; the session may change before the runtime
                // gets to the effect.
                PlaybackAction::SaveProgress => {
                    effects.push(Effect::SaveProgress(session.progress_record()))
                }
                action => effects.push(Effect::Playback(action)),
            }
        }
    }

    fn save(&self, effects: &mut Vec<Effect>) {
        if let Some(session) = &self.session {
            effects.push(Effect::SaveProgress(session.progress_record()));
        }
    }

    /// Stop an active session; no-op otherwise.
    fn halt(&mut self, effects: &mut Vec<Effect>) {
        if self.scheduler.state().is_active() {
            self.dispatch(PlaybackEvent::Stop, effects);
        }
    }

    fn navigate(
        &mut self,
        step: impl FnOnce(&mut NavigationState) -> bool,
        effects: &mut Vec<Effect>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !step(session.navigation_mut()) {
            return;
        }
        let was_reading = self.scheduler.state() == PlaybackState::Reading;
        self.halt(effects);

        if let Some(session) = self.session.as_mut() {
            session.cursor_to_page_start();
            let position = session.navigation().position();
            info!(
                chapter = position.chapter,
                page = position.page,
                "Navigated"
            );
        }
        effects.push(Effect::RenderPage);
        self.save(effects);

        if was_reading && self.config.resume_after_navigation {
            self.dispatch(PlaybackEvent::Play, effects);
        }
    }

    fn handle_read_from_sentence(&mut self, sentence: usize, effects: &mut Vec<Effect>) {
        let Some(cursor) = self
            .session
            .as_ref()
            .and_then(|session| session.cursor_for_sentence(sentence))
        else {
            effects.push(Effect::Notice(format!("No sentence {} on this page", sentence + 1)));
            return;
        };
        self.halt(effects);
        if let Some(session) = self.session.as_mut() {
            session.set_cursor(cursor);
        }
        self.dispatch(PlaybackEvent::Play, effects);
    }

    fn handle_set_voice(&mut self, voice_id: &str, effects: &mut Vec<Effect>) {
        let Some(option) = find_voice(voice_id) else {
            effects.push(Effect::Notice(format!("Unknown voice: {voice_id}")));
            return;
        };
        let mut voice = self.scheduler.voice().clone();
        voice.voice_id = option.id.to_string();
        voice.provider = option.provider;
        info!(voice = option.id, provider = %option.provider, "Selected voice");
        effects.push(Effect::Notice(format!(
            "Voice {} ({})",
            option.label, option.provider
        )));
        self.scheduler.set_voice(voice);
    }

    pub fn status_line(&self) -> String {
        let voice = self.scheduler.voice();
        match &self.session {
            Some(session) => {
                let position = session.navigation().position();
                format!(
                    "{} | {} | chapter {}/{} page {}/{} | {:.0}% | voice {} ({}) {:.1}x",
                    session.source_name(),
                    self.scheduler.state(),
                    position.chapter + 1,
                    session.navigation().chapter_count(),
                    position.page + 1,
                    session.navigation().total_pages(position.chapter),
                    session.progress_pct(),
                    voice.voice_id,
                    voice.provider,
                    voice.speed,
                )
            }
            None => format!(
                "No document | voice {} ({}) {:.1}x",
                voice.voice_id, voice.provider, voice.speed
            ),
        }
    }
}
