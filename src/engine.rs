use crate::{Arrive, Blame, Message, MessageStore, PresentationSink, StreamRef, View, ViewState};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

/// The `FeedEngine` decides what the viewer gets to see and when.
///
/// # Revealing the feed a little at a time
///
/// Messages pile up in the [`MessageStore`] as fast as people post them, but nobody wants a wall
/// of text to appear all at once.  Instead each view keeps a [`crate::RevealCursor`] into its
/// stream, and every call to [`FeedEngine::tick`] moves one message from "stored" to "on screen"
/// by handing it to the [`PresentationSink`].  The [`crate::RevealScheduler`] calls `tick` on a
/// timer, so the feed trickles in at one message per interval no matter how many arrived in
/// between.
///
/// There are moments where trickling is wrong, and the engine reveals everything at once with a
/// catch-up instead:
///
/// * Turning revealing back on flushes the backlog ([`FeedEngine::set_enabled`],
///   [`FeedEngine::resume`]).
/// * Opening the overlay on an author shows their whole stream ([`FeedEngine::select_overlay`]).
/// * Posting your own message while revealing is off still shows it
///   ([`FeedEngine::post_message`]).
///
/// The engine owns the store, both view states and the sink.  That way a single lock around the
/// engine (see [`EngineHandle`]) covers every cursor move and every append, and a catch-up can
/// never have a tick wander into the middle of it.
pub struct FeedEngine {
    store: MessageStore,
    main: ViewState,
    overlay: ViewState,
    sink: Box<dyn PresentationSink>,
    visitor: String,
}

impl FeedEngine {
    /// Creates an engine over an empty store.  The `visitor` is the identity used for messages the
    /// viewer posts, and gets an empty stream right away so the overlay can be opened on it before
    /// they say anything.
    pub fn new(visitor: &str, sink: impl PresentationSink + 'static) -> Self {
        Self::with_store(MessageStore::default(), visitor, sink)
    }

    /// Creates an engine over an existing store.  Nothing in it counts as revealed yet.
    pub fn with_store(
        mut store: MessageStore,
        visitor: &str,
        sink: impl PresentationSink + 'static,
    ) -> Self {
        store.register(visitor);
        Self {
            store,
            main: ViewState::main(),
            overlay: ViewState::overlay(),
            sink: Box::new(sink),
            visitor: visitor.to_owned(),
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn visitor(&self) -> &str {
        &self.visitor
    }

    pub fn state(&self, view: View) -> &ViewState {
        match view {
            View::Main => &self.main,
            View::Overlay => &self.overlay,
        }
    }

    fn state_mut(&mut self, view: View) -> &mut ViewState {
        match view {
            View::Main => &mut self.main,
            View::Overlay => &mut self.overlay,
        }
    }

    /// How many messages in `view` are on screen.
    pub fn revealed(&self, view: View) -> usize {
        *self.state(view).cursor().revealed()
    }

    /// How many messages in `view` are waiting to be shown.
    pub fn pending(&self, view: View) -> usize {
        self.state(view).cursor().pending(&self.store)
    }

    pub fn enabled(&self, view: View) -> bool {
        self.state(view).enabled()
    }

    /// Gives `author` an empty stream in the store, so the overlay can open on them before they
    /// say anything.  Returns `true` if they were new.
    pub fn register(&mut self, author: &str) -> bool {
        self.store.register(author)
    }

    /// Adds a message from somebody else to the store.  It is not revealed here; the next tick or
    /// catch-up will pick it up.
    #[tracing::instrument(skip(self, text))]
    pub fn ingest(
        &mut self,
        author: &str,
        text: &str,
        created_at: chrono::DateTime<Utc>,
    ) -> Arc<Message> {
        let message = self.store.append(author, text, created_at);
        tracing::trace!("Ingested #{}.", message.seq());
        message
    }

    /// Reveals one message in `view`, if the view is on screen, revealing is enabled and there is
    /// something to reveal.  Returns the message handed to the sink, or `None` if the tick had
    /// nothing to do.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self, view: View) -> Arrive<Option<Arc<Message>>> {
        let state = match view {
            View::Main => &mut self.main,
            View::Overlay => &mut self.overlay,
        };
        if !state.shown() || !state.enabled() || !state.cursor().has_unrevealed(&self.store) {
            return Ok(None);
        }
        let message = state.cursor_mut().reveal_next(&self.store)?;
        self.sink.render(view, &message);
        Ok(Some(message))
    }

    /// Reveals everything waiting in `view`, oldest first, whether or not revealing is enabled.
    /// Every message goes to the sink before this returns.
    #[tracing::instrument(skip(self))]
    pub fn catch_up(&mut self, view: View) -> Arrive<Vec<Arc<Message>>> {
        let state = match view {
            View::Main => &mut self.main,
            View::Overlay => &mut self.overlay,
        };
        let batch = state.cursor_mut().catch_up(&self.store)?;
        for message in &batch {
            self.sink.render(view, message);
        }
        if !batch.is_empty() {
            tracing::trace!("Caught up {} in {view}.", batch.len());
        }
        Ok(batch)
    }

    /// Flips the viewer's switch for `view`.  Going from off to on flushes the backlog in one go;
    /// going from on to off only stops future ticks.  Returns what was revealed by the flush.
    #[tracing::instrument(skip(self))]
    pub fn set_enabled(&mut self, view: View, enabled: bool) -> Arrive<Vec<Arc<Message>>> {
        let was = self.enabled(view);
        self.state_mut(view).set_manual(enabled);
        if !was && self.enabled(view) {
            tracing::info!("Revealing resumed in {view}.");
            self.catch_up(view)
        } else {
            if was && !enabled {
                tracing::info!("Revealing stopped in {view}.");
            }
            Ok(Vec::new())
        }
    }

    /// The refresh button.  If `view` is revealing, switch it off.  If it is not, for whatever
    /// reason, switch it on and clear any hover pause, since the viewer clicking the button while
    /// hovering has made their wishes clear.  Returns the new effective state.
    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, view: View) -> Arrive<bool> {
        if self.enabled(view) {
            self.set_enabled(view, false)?;
        } else {
            self.state_mut(view).set_hover_paused(false);
            self.state_mut(view).set_manual(false);
            self.set_enabled(view, true)?;
        }
        Ok(self.enabled(view))
    }

    /// Posts `text` as the visitor.  The visitor always sees their own post: if the main view is
    /// revealing we tick it once, and if it is not we switch it on just long enough to catch up,
    /// then put the switches back the way we found them.
    ///
    /// Empty text is not posted, but the main view is still nudged.  Returns the new message, if
    /// any.
    #[tracing::instrument(skip(self, text))]
    pub fn post_message(&mut self, text: &str) -> Arrive<Option<Arc<Message>>> {
        let posted = if text.is_empty() {
            tracing::trace!("Ignoring empty post.");
            None
        } else {
            let message = self.store.append(&self.visitor, text, Utc::now());
            tracing::info!("Posted #{} as @{}.", message.seq(), self.visitor);
            Some(message)
        };

        if self.enabled(View::Main) {
            self.tick(View::Main)?;
        } else {
            let manual = *self.main.manual();
            let hover_paused = *self.main.hover_paused();
            self.main.set_manual(true);
            self.main.set_hover_paused(false);
            let flushed = self.catch_up(View::Main);
            self.main.set_manual(manual);
            self.main.set_hover_paused(hover_paused);
            flushed?;
        }
        Ok(posted)
    }

    /// Opens the overlay on `author`: clears the panel, points the overlay cursor at their stream
    /// from the start, and shows all of it right away.  An author with no stream opens an empty
    /// overlay.
    #[tracing::instrument(skip(self))]
    pub fn select_overlay(&mut self, author: &str) -> Arrive<Vec<Arc<Message>>> {
        if let Err(Blame::UnknownAuthor { author }) = self.store.author_stream(author) {
            tracing::warn!("No stream for @{author}, opening an empty overlay.");
        }
        self.sink.clear(View::Overlay);
        self.overlay
            .cursor_mut()
            .retarget(StreamRef::author(author));
        self.overlay.set_shown(true);
        tracing::info!("Overlay opened on @{author}.");
        self.catch_up(View::Overlay)
    }

    /// Dismisses the overlay.  Its state stays around for the next selection, but it is no longer
    /// ticked.
    #[tracing::instrument(skip(self))]
    pub fn hide_overlay(&mut self) {
        self.overlay.set_shown(false);
        tracing::info!("Overlay hidden.");
    }

    /// Hover pause.  Only pauses a main view that is currently revealing, and remembers that the
    /// pause did it.  Returns whether anything was paused.
    #[tracing::instrument(skip(self))]
    pub fn pause(&mut self) -> bool {
        if self.main.enabled() {
            self.main.set_hover_paused(true);
            tracing::trace!("Main view paused.");
            true
        } else {
            false
        }
    }

    /// Lifts a hover pause and flushes what piled up meanwhile.  Does nothing if the pause did not
    /// cause the main view to stop, so a manual stop stays stopped.
    #[tracing::instrument(skip(self))]
    pub fn resume(&mut self) -> Arrive<Vec<Arc<Message>>> {
        if !*self.main.hover_paused() {
            return Ok(Vec::new());
        }
        self.main.set_hover_paused(false);
        tracing::trace!("Main view resumed.");
        if self.main.enabled() {
            self.catch_up(View::Main)
        } else {
            Ok(Vec::new())
        }
    }
}

/// A shareable handle on a [`FeedEngine`].  The scheduler, the chatter and the viewer's commands
/// each hold a clone, and every one of them has to go through [`EngineHandle::lock`] to touch the
/// engine.
#[derive(Clone)]
pub struct EngineHandle(Arc<Mutex<FeedEngine>>);

impl EngineHandle {
    pub fn new(engine: FeedEngine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    /// Will [`Blame::Poisoned`] if a previous holder panicked.
    pub fn lock(&self) -> Arrive<MutexGuard<'_, FeedEngine>> {
        self.0.lock().map_err(|_| Blame::Poisoned)
    }
}

impl From<FeedEngine> for EngineHandle {
    fn from(engine: FeedEngine) -> Self {
        Self::new(engine)
    }
}
