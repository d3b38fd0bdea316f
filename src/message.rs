use crate::{Arrive, Blame, Counter, Identifier};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// The `Message` struct is a single tweetle.  Once the [`MessageStore`] creates one, nobody gets
/// to change it, so we hand them around wrapped in an [`Arc`] and let the home stream and the
/// author stream share the same copy.
///
/// * The `seq` field is the store-wide sequence number, starting from `1`.
/// * The `author` field is the handle of the poster, without the leading `@`.
/// * The `text` field is what they had to say.
/// * The `created_at` field records when they said it.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    derive_new::new,
    derive_getters::Getters,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[display("@{author}: {text}")]
pub struct Message {
    seq: u64,
    author: String,
    text: String,
    created_at: DateTime<Utc>,
}

/// Points at one of the streams in a [`MessageStore`].  A [`crate::RevealCursor`] holds one of
/// these instead of a reference to the stream itself, and resolves it against the store each time
/// it needs to look, so the store can keep growing underneath it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StreamRef {
    #[default]
    #[display("home")]
    Home,
    #[display("@{_0}")]
    Author(String),
}

impl StreamRef {
    pub fn author(name: impl Into<String>) -> Self {
        Self::Author(name.into())
    }
}

/// An ordered, append-only run of messages.  We implement [`derive_more::Deref`] so readers get
/// the whole slice API for free, but deliberately leave out `DerefMut`: the only way in is
/// [`MessageStream::push`], and the only way out is never.
#[derive(Debug, Default, Clone, PartialEq, Eq, derive_more::Deref)]
pub struct MessageStream(Vec<Arc<Message>>);

impl MessageStream {
    fn push(&mut self, message: Arc<Message>) {
        self.0.push(message);
    }
}

/// The `MessageStore` holds every message the feed knows about.  There is one `home` stream with
/// everything in it, and one stream per author in `users`.  Appending a message puts the same
/// [`Arc`] into both, so an author stream is always the home stream filtered down to one author,
/// in the same order.
#[derive(Debug, Default, Clone, derive_getters::Getters)]
pub struct MessageStore {
    home: MessageStream,
    users: HashMap<String, MessageStream>,
    #[getter(skip)]
    counter: Counter,
}

impl MessageStore {
    /// Makes sure `author` has a stream, even if they never post.  Returns `true` if the author is
    /// new to us.
    pub fn register(&mut self, author: &str) -> bool {
        if self.users.contains_key(author) {
            false
        } else {
            tracing::trace!("Registering @{author}.");
            self.users.insert(author.to_owned(), MessageStream::default());
            true
        }
    }

    /// Stamps a new message and appends it to the end of both the home stream and the author's
    /// own stream, registering the author on first contact.
    pub fn append(
        &mut self,
        author: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Arc<Message> {
        let seq = self.counter.next();
        let message = Arc::new(Message::new(
            seq,
            author.to_owned(),
            text.to_owned(),
            created_at,
        ));
        self.home.push(message.clone());
        self.users
            .entry(author.to_owned())
            .or_default()
            .push(message.clone());
        tracing::trace!("Appended #{seq} from @{author}.");
        message
    }

    /// Resolves `target` to its messages.  An author we have never heard of reads as an empty
    /// stream, so an overlay opened on a stranger comes up blank instead of failing.
    pub fn stream(&self, target: &StreamRef) -> &[Arc<Message>] {
        match target {
            StreamRef::Home => self.home.as_slice(),
            StreamRef::Author(author) => match self.users.get(author) {
                Some(stream) => stream.as_slice(),
                None => &[],
            },
        }
    }

    /// The strict version of [`MessageStore::stream`] for authors.
    /// Will [`Blame::UnknownAuthor`] if the author has no stream.
    pub fn author_stream(&self, author: &str) -> Arrive<&MessageStream> {
        self.users.get(author).ok_or_else(|| Blame::UnknownAuthor {
            author: author.to_owned(),
        })
    }

    pub fn knows(&self, author: &str) -> bool {
        self.users.contains_key(author)
    }

    /// Number of messages currently in the stream behind `target`.
    pub fn len(&self, target: &StreamRef) -> usize {
        self.stream(target).len()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty()
    }

    /// Author handles in alphabetical order.
    pub fn authors(&self) -> Vec<&str> {
        let mut authors = self.users.keys().map(String::as_str).collect::<Vec<&str>>();
        authors.sort_unstable();
        authors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MessageStore {
        let mut store = MessageStore::default();
        let now = Utc::now();
        store.append("mracus", "first", now);
        store.append("shawndrost", "second", now);
        store.append("mracus", "third", now);
        store
    }

    #[test]
    fn append_lands_in_home_and_author_stream() {
        let store = store();
        assert_eq!(store.len(&StreamRef::Home), 3);
        let mracus = store.stream(&StreamRef::author("mracus"));
        let texts = mracus
            .iter()
            .map(|m| m.text().as_str())
            .collect::<Vec<&str>>();
        assert_eq!(texts, vec!["first", "third"]);
        // Same allocation, not a copy.
        assert!(Arc::ptr_eq(&store.home()[2], &mracus[1]));
    }

    #[test]
    fn sequence_numbers_follow_append_order() {
        let store = store();
        let seqs = store.home().iter().map(|m| *m.seq()).collect::<Vec<u64>>();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn strangers_read_as_empty() {
        let store = store();
        assert!(store.stream(&StreamRef::author("nobody")).is_empty());
        assert!(matches!(
            store.author_stream("nobody"),
            Err(Blame::UnknownAuthor { .. })
        ));
    }

    #[test]
    fn register_keeps_existing_messages() {
        let mut store = store();
        assert!(!store.register("mracus"));
        assert_eq!(store.len(&StreamRef::author("mracus")), 2);
        assert!(store.register("you"));
        assert!(store.knows("you"));
        assert_eq!(store.authors(), vec!["mracus", "shawndrost", "you"]);
    }
}
