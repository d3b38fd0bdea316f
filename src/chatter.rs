use crate::{Arrive, Blame, EngineHandle, Settings};
use chrono::{DateTime, Utc};
use convert_case::Casing;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use std::{fs, path};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// The `Chatterbox` is a simulated author.  A feed with nobody posting in it is not much to look
/// at, so a few chatterboxes sit in the background and say things at random intervals, the way a
/// busy timeline would.
///
/// Chatterboxes never touch the [`crate::FeedEngine`] themselves.  Each one holds the sending half
/// of a channel and posts a [`Chirp`] into it; the [`Flock`] holds the receiving half and does the
/// storing.  That keeps the lock on the engine in one place, and a chatterbox that wanders off
/// mid-sentence cannot leave it held.
#[derive(Debug, derive_new::new, derive_getters::Getters)]
pub struct Chatterbox {
    /// Handle the chatterbox posts under, not guaranteed to be unique.
    name: String,
    /// Phrases to draw from.
    quips: Quips,
    /// Longest nap between posts.
    max_pause: Duration,
    /// Where chirps go.
    tx: mpsc::Sender<Chirp>,
}

impl Chatterbox {
    /// Naps for a random stretch between one millisecond and `max_pause`.  We roll the dice in a
    /// block of its own so the thread-local generator is gone before we await.
    #[tracing::instrument(skip_all)]
    pub async fn pause(&self) {
        let ceiling = self.max_pause.as_millis().max(1) as u64;
        let pause = {
            let mut rng = rand::thread_rng();
            rng.gen_range(1..=ceiling)
        };
        tracing::trace!("{} pausing for {pause} millis", self.name);
        time::sleep(Duration::from_millis(pause)).await;
    }

    /// Sends one random quip.  Will [`Blame::ChannelClosed`] if nobody is listening anymore.
    #[tracing::instrument(skip_all)]
    pub async fn chirp(&self) -> Arrive<()> {
        let chirp = Chirp::new(self.name.clone(), self.quips.pick(), Utc::now());
        self.tx
            .send(chirp)
            .await
            .map_err(|_| Blame::ChannelClosed)?;
        Ok(())
    }

    /// Chirps and naps until the channel closes.
    #[tracing::instrument(skip_all)]
    pub async fn chatter(&self) -> Arrive<()> {
        loop {
            self.chirp().await?;
            self.pause().await;
        }
    }
}

/// A message on its way from a [`Chatterbox`] to the store.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, derive_getters::Getters)]
pub struct Chirp {
    author: String,
    text: String,
    created_at: DateTime<Utc>,
}

/// The `Flock` raises and herds the chatterboxes.  It names them, gives them something to say,
/// seeds the feed so the page does not open empty, then listens on the channel and files every
/// [`Chirp`] into the engine's store.  Filed chirps are not revealed here; the
/// [`crate::RevealScheduler`] gets to them in its own time.
///
/// ## Fields ##
///
/// * **engine** - Where chirps end up.
/// * **quips** - Phrases handed out to each chatterbox.
/// * **max_pause** - Passed along to each chatterbox.
/// * **rx** - Receiver for chirps.
/// * **tx** - Transmitter cloned into each chatterbox.
#[derive(derive_getters::Getters)]
pub struct Flock {
    #[getter(skip)]
    engine: EngineHandle,
    quips: Quips,
    max_pause: Duration,
    #[getter(skip)]
    rx: mpsc::Receiver<Chirp>,
    #[getter(skip)]
    tx: mpsc::Sender<Chirp>,
}

impl Flock {
    /// Creates a `Flock` feeding `engine`.  The quips come from the file named in `settings`, if
    /// it can be read.  If not we warn and let the chatterboxes make things up.
    #[tracing::instrument(skip_all)]
    pub fn summon(engine: EngineHandle, settings: &Settings) -> Self {
        let quips = match settings.quips() {
            Some(path) => match Quips::from_path(path) {
                Ok(quips) => quips,
                Err(e) => {
                    tracing::warn!("Could not read quips from {}: {e}", path.display());
                    Quips::default()
                }
            },
            None => Quips::default(),
        };
        tracing::info!("Flock has {} quips.", quips.len());
        let (tx, rx) = mpsc::channel(64);
        Self {
            engine,
            quips,
            max_pause: settings.max_pause(),
            rx,
            tx,
        }
    }

    /// Creates `count` chatterboxes with generated snake case handles.
    #[tracing::instrument(skip(self))]
    pub fn gather(&self, count: usize) -> Vec<Chatterbox> {
        names::Generator::default()
            .take(count)
            .map(|name| name.to_case(convert_case::Case::Snake))
            .map(|name| Chatterbox::new(name, self.quips.clone(), self.max_pause, self.tx.clone()))
            .collect()
    }

    /// Files exactly `count` messages straight into the store, so the feed has a backlog before
    /// anybody starts ticking.  The first few go round the chatterboxes in turn, and the rest go
    /// to whoever the dice pick.  Every chatterbox gets a stream even when `count` is zero, so the
    /// overlay can open on any of them.  Returns how many messages were filed.
    #[tracing::instrument(skip(self, chatterboxes))]
    pub fn seed(&self, chatterboxes: &[Chatterbox], count: usize) -> Arrive<usize> {
        if chatterboxes.is_empty() {
            return Ok(0);
        }
        let mut engine = self.engine.lock()?;
        for chatterbox in chatterboxes {
            engine.register(chatterbox.name());
        }
        let mut rng = rand::thread_rng();
        let mut seeded = 0;
        for i in 0..count {
            let chatterbox = match chatterboxes.get(i) {
                Some(chatterbox) => chatterbox,
                None => match chatterboxes.choose(&mut rng) {
                    Some(chatterbox) => chatterbox,
                    None => break,
                },
            };
            engine.ingest(chatterbox.name(), &self.quips.pick(), Utc::now());
            seeded += 1;
        }
        tracing::trace!("Seeded {seeded} messages.");
        Ok(seeded)
    }

    /// Sets each chatterbox loose on its own task.
    #[tracing::instrument(skip_all)]
    pub fn release(&self, chatterboxes: Vec<Chatterbox>) -> Vec<JoinHandle<()>> {
        chatterboxes
            .into_iter()
            .map(|chatterbox| {
                tokio::spawn(async move {
                    if let Err(e) = chatterbox.chatter().await {
                        tracing::trace!("{} went quiet: {e}", chatterbox.name());
                    }
                })
            })
            .collect()
    }

    /// Files incoming chirps into the store until every chatterbox has gone quiet.
    #[tracing::instrument(skip_all)]
    pub async fn listen(self) -> Arrive<()> {
        let Self {
            engine, mut rx, tx, ..
        } = self;
        // Our own sender would keep the channel open forever.
        drop(tx);
        while let Some(chirp) = rx.recv().await {
            engine
                .lock()?
                .ingest(chirp.author(), chirp.text(), *chirp.created_at());
        }
        tracing::trace!("Flock disbanded.");
        Ok(())
    }
}

/// The `Quip` struct is one thing a chatterbox might say, with an optional hashtag tacked on the
/// end.  The field names match the `Quip` and `Tag` columns of the CSV file.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_new::new,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "PascalCase")]
#[display("{}", self.say())]
pub struct Quip {
    quip: String,
    tag: Option<String>,
}

impl Quip {
    /// Joins the phrase and its hashtag, if it has one.
    pub fn say(&self) -> String {
        match &self.tag {
            Some(tag) if !tag.is_empty() => format!("{} #{tag}", self.quip),
            _ => self.quip.clone(),
        }
    }
}

const OPENERS: &[&str] = &["just", "finally", "never", "still", "somehow", "apparently"];
const VERBS: &[&str] = &["found", "lost", "built", "broke", "ate", "named", "painted"];
const OBJECTS: &[&str] = &["my", "a", "the", "your", "somebody's", "one"];
const NOUNS: &[&str] = &["sandwich", "bicycle", "server", "houseplant", "spreadsheet", "kite"];
const TAGS: &[&str] = &["monday", "blessed", "nofilter", "science", "fail", "yolo"];

/// The `Quips` struct is a newtype over a vector of [`Quip`], with [`derive_more::Deref`] and
/// [`derive_more::DerefMut`] so it behaves like the vector underneath.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    Hash,
    derive_more::Deref,
    derive_more::DerefMut,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Quips(Vec<Quip>);

impl Quips {
    /// Reads quips from a CSV file at `path`.  Will [`Blame::Io`] if the file cannot be opened.
    /// Rows that do not fit the [`Quip`] shape are skipped with a warning rather than failing the
    /// whole file, but a file where no row fits at all will [`Blame::Csv`] with the last problem.
    pub fn from_path(path: &path::Path) -> Arrive<Self> {
        let file = fs::File::open(path)?;
        let mut quips = Vec::new();
        let mut trouble = None;
        let mut rdr = csv::Reader::from_reader(file);
        for result in rdr.deserialize() {
            match result {
                Ok(quip) => quips.push(quip),
                Err(e) => {
                    tracing::warn!("Problem reading quips: {}", e.to_string());
                    trouble = Some(e);
                }
            }
        }
        match trouble {
            Some(e) if quips.is_empty() => Err(e.into()),
            _ => Ok(Self(quips)),
        }
    }

    /// Picks a quip at random and renders it.  With no quips loaded, makes one up.
    pub fn pick(&self) -> String {
        let mut rng = rand::thread_rng();
        match self.0.choose(&mut rng) {
            Some(quip) => quip.say(),
            None => Self::babble(&mut rng).say(),
        }
    }

    /// Strings together a random sentence out of the built-in word lists.
    pub fn babble<R: Rng>(rng: &mut R) -> Quip {
        let mut pick = |words: &[&'static str]| -> &'static str {
            words.choose(&mut *rng).copied().unwrap_or_default()
        };
        let quip = format!(
            "{} {} {} {}",
            pick(OPENERS),
            pick(VERBS),
            pick(OBJECTS),
            pick(NOUNS)
        );
        let tag = pick(TAGS).to_string();
        Quip::new(quip, Some(tag))
    }
}
