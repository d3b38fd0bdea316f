/// The `Blame` enum names everything that can go wrong in `tweetle`, so that every fallible
/// function can point a finger somewhere specific.  The [`Arrive`] alias is the return type we
/// use everywhere: either the value arrives, or somebody gets the blame.
///
/// Most of the variants wrap errors from the crates we lean on, and we implement [`From`] for
/// those through [`derive_more::From`] so that `?` does the converting for us.  The variants
/// with named fields are our own complaints about how the feed is being used.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Blame {
    /// Asked a cursor for the next message when every message was already on screen.
    #[display("nothing left to reveal: {revealed} of {len} already shown")]
    OutOfRange { revealed: usize, len: usize },
    /// Asked the store for an author it has never heard of.
    #[display("no stream for author @{author}")]
    UnknownAuthor { author: String },
    /// Another thread panicked while holding the engine lock.
    #[display("engine lock poisoned")]
    Poisoned,
    /// The chatter channel hung up.
    #[display("chatter channel closed")]
    ChannelClosed,
    /// The viewer typed something we do not understand.
    #[display("unknown command: {input}")]
    UnknownCommand { input: String },
    #[display("config error: {_0}")]
    #[from]
    Config(config::ConfigError),
    #[display("csv error: {_0}")]
    #[from]
    Csv(csv::Error),
    #[display("io error: {_0}")]
    #[from]
    Io(std::io::Error),
    #[display("task failed: {_0}")]
    #[from]
    Join(tokio::task::JoinError),
}

/// The `Arrive` type is a [`Result`] that either arrives with a `T` or lays the [`Blame`].
pub type Arrive<T> = Result<T, Blame>;
