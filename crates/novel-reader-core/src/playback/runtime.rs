//! Drives a [`Reader`] on a tokio runtime.
//!
//! The runtime owns everything with side effects: speech requests, timers,
//! the audio output, document extraction and the progress store. It feeds
//! their results back into the reader and forwards presentation changes to
//! the front end as [`ReaderUpdate`]s.

use super::audio::AudioOutput;
use super::scheduler::{PlaybackAction, PlaybackEvent};
use super::state::PlaybackState;
use crate::cache::{ProgressRecord, ProgressStore};
use crate::error::ExtractionError;
use crate::generation::GenerationCounter;
use crate::loader::Document;
use crate::reader::{Effect, Reader, ReaderCommand};
use crate::session::PageView;
use crate::speech::SpeechRouter;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Everything the front end needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderUpdate {
    DocumentLoaded {
        source_name: String,
        chapters: usize,
        words: usize,
    },
    Page(PageView),
    /// Text of the phrase being spoken.
    Highlight(Option<String>),
    Progress(f64),
    State(PlaybackState),
    Status(String),
    Notice(String),
    Error(String),
}

type LoadResult = Result<Document, ExtractionError>;

pub struct PlaybackRuntime {
    reader: Reader,
    router: SpeechRouter,
    audio: Box<dyn AudioOutput>,
    store: Box<dyn ProgressStore>,
    events_tx: UnboundedSender<PlaybackEvent>,
    events_rx: UnboundedReceiver<PlaybackEvent>,
    loaded_tx: UnboundedSender<LoadResult>,
    loaded_rx: UnboundedReceiver<LoadResult>,
    updates: UnboundedSender<ReaderUpdate>,
}

impl PlaybackRuntime {
    /// `audio` receives the event sender and the scheduler's generation
    /// counter so the output can report back and drop superseded clips.
    pub fn new<F>(
        reader: Reader,
        router: SpeechRouter,
        store: Box<dyn ProgressStore>,
        updates: UnboundedSender<ReaderUpdate>,
        audio: F,
    ) -> Self
    where
        F: FnOnce(UnboundedSender<PlaybackEvent>, GenerationCounter) -> Box<dyn AudioOutput>,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let audio = audio(events_tx.clone(), reader.scheduler().generation().clone());
        Self {
            reader,
            router,
            audio,
            store,
            events_tx,
            events_rx,
            loaded_tx,
            loaded_rx,
            updates,
        }
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    /// Apply a command before the loop starts. Returns false on quit.
    pub fn submit(&mut self, command: ReaderCommand) -> bool {
        let effects = self.reader.reduce(command);
        self.execute(effects)
    }

    /// Run until a quit command arrives or the command channel closes.
    pub async fn run(&mut self, mut commands: UnboundedReceiver<ReaderCommand>) {
        loop {
            let keep_going = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        debug!(?command, "Reader command");
                        let effects = self.reader.reduce(command);
                        self.execute(effects)
                    }
                    None => {
                        let effects = self.reader.reduce(ReaderCommand::Quit);
                        self.execute(effects);
                        false
                    }
                },
                Some(event) = self.events_rx.recv() => {
                    let effects = self.reader.handle_playback(event);
                    self.execute(effects)
                }
                Some(loaded) = self.loaded_rx.recv() => self.on_loaded(loaded),
            };
            if !keep_going {
                break;
            }
        }
        info!("Reader runtime stopped");
    }

    fn execute(&mut self, effects: Vec<Effect>) -> bool {
        let mut keep_going = true;
        for effect in effects {
            match effect {
                Effect::Playback(action) => self.perform(action),
                Effect::RenderPage => self.render_page(),
                Effect::LoadDocument(path) => self.load_document(path),
                Effect::OpenDocument(document) => {
                    keep_going &= self.open_document(document);
                }
                Effect::DocumentOpened => {
                    if let Some(session) = self.reader.session() {
                        self.emit(ReaderUpdate::DocumentLoaded {
                            source_name: session.source_name().to_string(),
                            chapters: session.chapters().len(),
                            words: session.index().word_count(),
                        });
                    }
                }
                Effect::SaveProgress(record) => self.save(&record),
                Effect::Notice(message) => self.emit(ReaderUpdate::Notice(message)),
                Effect::Quit => keep_going = false,
            }
        }
        keep_going
    }

    fn perform(&mut self, action: PlaybackAction) {
        match action {
            PlaybackAction::Synthesize {
                generation,
                text,
                voice,
            } => {
                let router = self.router.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let clip = router.synthesize(&text, &voice).await;
                    let _ = events.send(PlaybackEvent::SpeechReady { generation, clip });
                });
            }
            PlaybackAction::LoadAudio { generation, clip } => self.audio.load(generation, clip),
            PlaybackAction::PauseAudio => self.audio.pause(),
            PlaybackAction::ResumeAudio => self.audio.resume(),
            PlaybackAction::DiscardAudio => self.audio.discard(),
            PlaybackAction::UnlockAudio => self.audio.unlock(),
            PlaybackAction::Wake { after, event } => {
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = events.send(event);
                });
            }
            PlaybackAction::SaveProgress => {
                if let Some(record) = self.reader.session().map(|s| s.progress_record()) {
                    self.save(&record);
                }
            }
            PlaybackAction::StateChanged(state) => self.emit(ReaderUpdate::State(state)),
            PlaybackAction::Highlight(phrase) => {
                self.emit(ReaderUpdate::Highlight(phrase.map(|phrase| phrase.text)))
            }
            PlaybackAction::PageTurned(_) => self.render_page(),
            PlaybackAction::Progress(pct) => self.emit(ReaderUpdate::Progress(pct)),
            PlaybackAction::Status(status) => self.emit(ReaderUpdate::Status(status)),
        }
    }

    fn render_page(&self) {
        if let Some(session) = self.reader.session() {
            self.emit(ReaderUpdate::Page(session.page_view()));
        }
    }

    fn load_document(&self, path: PathBuf) {
        info!(path = %path.display(), "Loading document");
        let loaded = self.loaded_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _ = loaded.send(Document::from_path(&path));
        });
    }

    fn on_loaded(&mut self, loaded: LoadResult) -> bool {
        match loaded {
            Ok(document) => self.open_document(document),
            Err(err) => {
                warn!("Failed to load document: {err}");
                self.emit(ReaderUpdate::Error(err.to_string()));
                true
            }
        }
    }

    fn open_document(&mut self, document: Document) -> bool {
        let saved = self
            .store
            .load(&document.source_name)
            .unwrap_or_else(|err| {
                warn!(source = %document.source_name, "Ignoring saved progress: {err}");
                None
            });
        let effects = self.reader.open_document(document, saved);
        self.execute(effects)
    }

    fn save(&self, record: &ProgressRecord) {
        match self.store.save(record) {
            Ok(()) => debug!(
                source = %record.source_name,
                word = record.word_cursor,
                "Saved progress"
            ),
            Err(err) => warn!(source = %record.source_name, "Failed to save progress: {err}"),
        }
    }

    fn emit(&self, update: ReaderUpdate) {
        if self.updates.send(update).is_err() {
            debug!("Front end is gone; dropping update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryProgressStore;
    use crate::config::AppConfig;
    use crate::generation::Generation;
    use crate::speech::router::tests::FakeProvider;
    use crate::speech::{AudioClip, ProviderKind};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Plays every clip instantly.
    struct InstantAudio {
        events: UnboundedSender<PlaybackEvent>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl AudioOutput for InstantAudio {
        fn load(&mut self, generation: Generation, _clip: AudioClip) {
            self.calls.lock().unwrap().push("load".to_string());
            self.events
                .send(PlaybackEvent::AudioStarted { generation })
                .unwrap();
            self.events
                .send(PlaybackEvent::AudioEnded { generation })
                .unwrap();
        }

        fn pause(&mut self) {
            self.calls.lock().unwrap().push("pause".to_string());
        }

        fn resume(&mut self) {
            self.calls.lock().unwrap().push("resume".to_string());
        }

        fn discard(&mut self) {
            self.calls.lock().unwrap().push("discard".to_string());
        }

        fn unlock(&mut self) {
            self.calls.lock().unwrap().push("unlock".to_string());
        }
    }

    struct Harness {
        commands: UnboundedSender<ReaderCommand>,
        updates: UnboundedReceiver<ReaderUpdate>,
        runtime: tokio::task::JoinHandle<PlaybackRuntime>,
        primary: Arc<FakeProvider>,
        audio_calls: Arc<Mutex<Vec<String>>>,
    }

    fn start() -> Harness {
        let primary = FakeProvider::new(ProviderKind::Primary, false);
        let secondary = FakeProvider::new(ProviderKind::Secondary, false);
        let router = SpeechRouter::new(primary.clone(), secondary, false);
        let (updates_tx, updates) = mpsc::unbounded_channel();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let audio_calls = Arc::new(Mutex::new(Vec::new()));
        let calls = audio_calls.clone();
        let mut runtime = PlaybackRuntime::new(
            Reader::new(AppConfig::default()),
            router,
            Box::new(MemoryProgressStore::new()),
            updates_tx,
            move |events, _generation| Box::new(InstantAudio { events, calls }),
        );
        let runtime = tokio::spawn(async move {
            runtime.run(commands_rx).await;
            runtime
        });
        Harness {
            commands,
            updates,
            runtime,
            primary,
            audio_calls,
        }
    }

    async fn wait_for(
        updates: &mut UnboundedReceiver<ReaderUpdate>,
        done: impl Fn(&ReaderUpdate) -> bool,
    ) -> Vec<ReaderUpdate> {
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(120), async {
            while let Some(update) = updates.recv().await {
                let finished = done(&update);
                seen.push(update);
                if finished {
                    break;
                }
            }
        })
        .await
        .expect("timed out waiting for update");
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn reads_a_pasted_document_to_the_end() {
        let mut harness = start();
        harness
            .commands
            .send(ReaderCommand::Paste("Alpha beta. Gamma delta.".to_string()))
            .unwrap();
        harness.commands.send(ReaderCommand::Play).unwrap();

        let seen = wait_for(&mut harness.updates, |update| {
            *update == ReaderUpdate::Status("Finished reading".to_string())
        })
        .await;

        assert!(seen.contains(&ReaderUpdate::DocumentLoaded {
            source_name: "Pasted Text".to_string(),
            chapters: 1,
            words: 4,
        }));
        assert!(seen.contains(&ReaderUpdate::Highlight(Some("Alpha beta.".to_string()))));
        assert!(seen.contains(&ReaderUpdate::Highlight(Some("Gamma delta.".to_string()))));
        assert!(seen.contains(&ReaderUpdate::State(PlaybackState::Finished)));
        assert_eq!(
            *harness.primary.calls.lock().unwrap(),
            vec!["Alpha beta.".to_string(), "Gamma delta.".to_string()]
        );
        assert_eq!(
            *harness.audio_calls.lock().unwrap(),
            vec!["unlock", "load", "load"]
        );

        harness.commands.send(ReaderCommand::Quit).unwrap();
        let runtime = harness.runtime.await.unwrap();
        let record = runtime.store().load("Pasted Text").unwrap().unwrap();
        assert_eq!(record.word_cursor, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failures_are_reported() {
        let mut harness = start();
        harness
            .commands
            .send(ReaderCommand::Open(PathBuf::from("/definitely/missing.txt")))
            .unwrap();

        let seen = wait_for(&mut harness.updates, |update| {
            matches!(update, ReaderUpdate::Error(_))
        })
        .await;
        assert!(matches!(seen.last(), Some(ReaderUpdate::Error(message)) if message.contains("missing.txt")));

        drop(harness.commands);
        let runtime = harness.runtime.await.unwrap();
        assert!(runtime.reader().session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_saves_progress_under_the_open_document() {
        let mut harness = start();
        harness.commands.send(ReaderCommand::LoadSample).unwrap();
        harness.commands.send(ReaderCommand::Play).unwrap();
        wait_for(&mut harness.updates, |update| {
            matches!(update, ReaderUpdate::Highlight(Some(_)))
        })
        .await;
        harness.commands.send(ReaderCommand::Stop).unwrap();
        wait_for(&mut harness.updates, |update| {
            *update == ReaderUpdate::State(PlaybackState::Stopped)
        })
        .await;

        harness.commands.send(ReaderCommand::Quit).unwrap();
        let runtime = harness.runtime.await.unwrap();
        let record = runtime.store().load("Sample Novel").unwrap().unwrap();
        assert!(record.word_cursor > 0);
        assert_eq!(runtime.reader().state(), PlaybackState::Stopped);
    }
}
