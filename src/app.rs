use crate::{
    Act, Arrive, Blame, Board, EngineHandle, FeedEngine, Flock, RevealScheduler, Settings, Verb,
    View,
};
use std::str::FromStr;
use strum::IntoEnumIterator;
use tokio::io::{self, AsyncBufReadExt};
use tokio::task::JoinHandle;

/// The `app` module contains the `App` struct, which holds the parent-level view of the
/// application state.
///
/// # A feed without a page
///
/// The `App` is the page, minus the page.  It wires the pieces together the same way the tweetle
/// page does: a [`FeedEngine`] over a store, a [`Board`] to render into, a [`RevealScheduler`]
/// ticking the main feed, and a [`Flock`] of chatterboxes keeping the store busy.  Instead of
/// buttons and mouse hovers, the viewer types commands, which [`App::line`] parses into an
/// [`Act`] and [`App::act`] carries out.
///
/// On startup the flock seeds the store and the main feed catches up on the seed all at once, the
/// way the page fills in before it starts trickling.  After that the scheduler takes over.
///
/// ### Fields
///
/// * The `settings` field holds the [`Settings`] loaded from `Tweetle.toml`.
/// * The `engine` field is our handle on the shared [`FeedEngine`].
/// * The `board` field is our reading copy of the [`Board`] the engine renders into.
/// * The `scheduler` field owns the per-view timers.
/// * The `chatter` field holds the chatterbox tasks and the flock listener, so we can call them
///   off on the way out.
/// * The `running` flag goes `false` when the viewer quits.
#[derive(derive_getters::Getters)]
pub struct App {
    settings: Settings,
    engine: EngineHandle,
    board: Board,
    #[getter(skip)]
    scheduler: RevealScheduler,
    #[getter(skip)]
    chatter: Vec<JoinHandle<()>>,
    running: bool,
}

impl App {
    /// Creates an instance of `App` from `settings` and starts everything moving.  Must be called
    /// from inside a [`tokio`] runtime, since the chatterboxes and the timers are spawned onto it.
    ///
    /// Will [`Blame::Poisoned`] if the engine lock is poisoned while seeding, which would be quite
    /// an achievement this early.
    #[tracing::instrument(skip_all)]
    pub fn new(settings: Settings) -> Arrive<Self> {
        let board = Board::default();
        let engine = EngineHandle::new(FeedEngine::new(settings.visitor(), board.clone()));

        let flock = Flock::summon(engine.clone(), &settings);
        let chatterboxes = flock.gather(*settings.chatterboxes());
        flock.seed(&chatterboxes, *settings.seed())?;
        let mut chatter = flock.release(chatterboxes);
        chatter.push(tokio::spawn(async move {
            if let Err(e) = flock.listen().await {
                tracing::warn!("Flock stopped listening: {e}");
            }
        }));

        let shown = engine.lock()?.catch_up(View::Main)?.len();
        tracing::info!("Feed opened with {shown} tweetles.");

        let mut scheduler = RevealScheduler::new(engine.clone());
        scheduler.start(View::Main, settings.interval());

        Ok(Self {
            settings,
            engine,
            board,
            scheduler,
            chatter,
            running: true,
        })
    }

    /// The act method dispatches program responses based upon the variant of [`Act`] passed in
    /// the `act` argument.
    ///
    /// * [`Act::Post`] posts as the visitor, who always gets to see their own post.
    /// * [`Act::Refresh`] flips revealing on the main feed.
    /// * [`Act::Hover`] and [`Act::Leave`] pause and resume the main feed.
    /// * [`Act::User`] opens the overlay and (re)starts its timer.
    /// * [`Act::Hide`] dismisses the overlay and stops its timer.
    /// * [`Act::Show`] and [`Act::Help`] print to stdout.
    /// * [`Act::Quit`] lowers the `running` flag.
    #[tracing::instrument(skip(self))]
    pub fn act(&mut self, act: &Act) -> Arrive<()> {
        match act {
            Act::Post(text) => {
                self.engine.lock()?.post_message(text)?;
            }
            Act::Refresh => {
                let on = self.engine.lock()?.toggle(View::Main)?;
                tracing::info!("Refresh is {}.", if on { "on" } else { "off" });
            }
            Act::Hover => {
                self.engine.lock()?.pause();
            }
            Act::Leave => {
                self.engine.lock()?.resume()?;
            }
            Act::User(name) => {
                self.engine.lock()?.select_overlay(name)?;
                self.scheduler
                    .start(View::Overlay, self.settings.overlay_interval());
            }
            Act::Hide => {
                self.engine.lock()?.hide_overlay();
                self.scheduler.stop(View::Overlay);
            }
            Act::Show => {
                for line in self.show()? {
                    println!("{line}");
                }
            }
            Act::Help => {
                for verb in Verb::iter() {
                    println!("{}", verb.usage());
                }
            }
            Act::Quit => {
                tracing::trace!("Requesting exit.");
                self.running = false;
            }
        }
        Ok(())
    }

    /// Renders both feeds, newest first, with timestamps relative to right now.  The overlay only
    /// shows up while it is open.
    pub fn show(&self) -> Arrive<Vec<String>> {
        let now = chrono::Utc::now();
        let engine = self.engine.lock()?;
        let mut lines = vec![format!(
            "-- home ({} shown, {} waiting) --",
            engine.revealed(View::Main),
            engine.pending(View::Main)
        )];
        lines.extend(self.board.labels(View::Main, now));
        let overlay = engine.state(View::Overlay);
        if *overlay.shown() {
            lines.push(format!("-- {} --", overlay.cursor().target()));
            lines.extend(self.board.labels(View::Overlay, now));
        }
        Ok(lines)
    }

    /// Parses a line of input and acts on it.  Lines we cannot make sense of are logged and
    /// ignored, which is no crime.
    #[tracing::instrument(skip(self))]
    pub fn line(&mut self, line: &str) -> Arrive<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        match Act::from_str(line) {
            Ok(act) => {
                tracing::trace!("Act detected: {act}");
                self.act(&act)
            }
            Err(Blame::UnknownCommand { input }) => {
                tracing::warn!("Unknown command: {input}, try `help`.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Reads commands from stdin until the viewer quits or stdin runs dry, then shuts down.
    pub async fn run(&mut self) -> Arrive<()> {
        self.run_on(io::BufReader::new(io::stdin())).await
    }

    /// Reads commands from `reader` until the viewer quits or the reader runs dry, then shuts
    /// down.  A line that is not valid UTF-8 is logged and skipped.  Any other read error ends the
    /// loop, and is handed back after the shutdown has run.
    #[tracing::instrument(skip_all)]
    pub async fn run_on<R: io::AsyncBufRead + Unpin>(&mut self, reader: R) -> Arrive<()> {
        let mut lines = reader.lines();
        let mut trouble = None;
        while self.running {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Err(e) = self.line(&line) {
                        trouble = Some(e);
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!("Skipping a line that is not UTF-8: {e}");
                }
                Err(e) => {
                    trouble = Some(e.into());
                    break;
                }
            }
        }
        self.shutdown().await?;
        match trouble {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Stops the timers, sends the chatterboxes home and waits for them to leave.  Will
    /// [`Blame::Join`] if one of them panicked on the way.
    #[tracing::instrument(skip_all)]
    pub async fn shutdown(&mut self) -> Arrive<()> {
        self.running = false;
        self.scheduler.stop(View::Main);
        self.scheduler.stop(View::Overlay);
        let chatter = self.chatter.drain(..).collect::<Vec<JoinHandle<()>>>();
        for handle in &chatter {
            handle.abort();
        }
        Self::settle(chatter).await?;
        tracing::trace!("Shut down.");
        Ok(())
    }

    /// Awaits each of `handles`.  Tasks that were cancelled are fine, tasks that panicked will
    /// [`Blame::Join`].
    async fn settle(handles: Vec<JoinHandle<()>>) -> Arrive<()> {
        for handle in handles {
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn is_running(&self, view: View) -> bool {
        self.scheduler.is_running(view)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for handle in self.chatter.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamRef;
    use std::time::Duration;
    use tokio::time;

    fn settings() -> Settings {
        Settings::from_toml(
            r#"
            chatterboxes = 2
            seed = 6
            max_pause_ms = 600000
            quips = "/nowhere.csv"
            "#,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn opens_with_the_seed_showing() {
        let app = App::new(settings()).unwrap();
        assert_eq!(app.board().len(View::Main), 6);
        assert!(app.is_running(View::Main));
        assert!(!app.is_running(View::Overlay));
    }

    #[tokio::test(start_paused = true)]
    async fn user_and_hide_drive_the_overlay_timer() {
        let mut app = App::new(settings()).unwrap();
        let author = {
            let engine = app.engine().lock().unwrap();
            engine.store().home()[0].author().clone()
        };
        app.line(&format!("user @{author}")).unwrap();
        assert!(app.is_running(View::Overlay));
        let expected = app
            .engine()
            .lock()
            .unwrap()
            .store()
            .len(&StreamRef::author(author.as_str()));
        assert_eq!(app.board().len(View::Overlay), expected);
        assert!(app.show().unwrap().iter().any(|line| line.contains(&author)));

        app.line("hide").unwrap();
        assert!(!app.is_running(View::Overlay));
    }

    #[tokio::test(start_paused = true)]
    async fn own_post_shows_with_refresh_off() {
        let mut app = App::new(settings()).unwrap();
        app.line("refresh").unwrap();
        assert!(!app.engine().lock().unwrap().enabled(View::Main));
        app.line("post hello world").unwrap();
        let newest = app.board().timeline(View::Main)[0].clone();
        assert_eq!(newest.text(), "hello world");
        assert_eq!(newest.author(), "you");
        assert!(!app.engine().lock().unwrap().enabled(View::Main));
    }

    #[tokio::test(start_paused = true)]
    async fn nonsense_is_shrugged_off_and_quit_stops() {
        let mut app = App::new(settings()).unwrap();
        app.line("dance wildly").unwrap();
        app.line("").unwrap();
        assert!(*app.running());
        app.line("quit").unwrap();
        assert!(!*app.running());
        app.shutdown().await.unwrap();
        assert!(!app.is_running(View::Main));
        time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn garbled_input_is_skipped_and_shutdown_still_runs() {
        let mut app = App::new(settings()).unwrap();
        let input: &[u8] = b"post hi\n\xff\xfe\npost there\nquit\npost never\n";
        app.run_on(input).await.unwrap();
        let mine = app.engine().lock().unwrap().store().len(&StreamRef::author("you"));
        assert_eq!(mine, 2);
        assert!(!*app.running());
        assert!(!app.is_running(View::Main));
    }

    #[tokio::test(start_paused = true)]
    async fn running_dry_shuts_down() {
        let mut app = App::new(settings()).unwrap();
        app.run_on(&b"refresh\n"[..]).await.unwrap();
        assert!(!*app.running());
        assert!(!app.is_running(View::Main));
    }

    #[tokio::test]
    async fn a_panicked_chatterbox_is_blamed() {
        let quiet = tokio::spawn(async {});
        let cancelled = tokio::spawn(time::sleep(Duration::from_secs(60)));
        cancelled.abort();
        let panicked = tokio::spawn(async { panic!("lost the plot") });
        assert!(App::settle(vec![quiet, cancelled]).await.is_ok());
        let result = App::settle(vec![panicked]).await;
        assert!(matches!(result, Err(Blame::Join(_))));
    }
}
