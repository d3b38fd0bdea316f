//! The `tweetle` crate is a feed that tells you now what was posted a little while ago.
//!
//! Tweetles pile up in a store as fast as people post them, and the feed drip-feeds them to the
//! viewer one at a time on a timer, so that the timeline scrolls along instead of arriving as a
//! wall of text.  The viewer can stop the trickle, pause it by pointing at the feed, and open an
//! overlay that shows one author's stream on its own.  Here is a map of where things live:
//!
//! 1. Keeping the messages - [`MessageStore`]
//!     * [`Message`], [`MessageStream`], [`StreamRef`]
//! 2. Remembering what has been shown - [`RevealCursor`]
//!     * [`RevealCursor::reveal_next`]
//!     * [`RevealCursor::catch_up`]
//! 3. Deciding what to show - [`FeedEngine`]
//!     * [`FeedEngine::tick`]
//!     * [`FeedEngine::set_enabled`]
//!     * [`FeedEngine::post_message`]
//!     * [`FeedEngine::select_overlay`]
//!     * [`FeedEngine::pause`] and [`FeedEngine::resume`]
//! 4. Deciding when to show it - [`RevealScheduler`]
//! 5. Showing it - [`PresentationSink`] and the in-memory [`Board`]
//! 6. Making noise - [`Flock`] and [`Chatterbox`]
//! 7. Listening to the viewer - [`App`] and [`Act`]
//!
//! The engine is shared between the scheduler, the chatterboxes and the viewer through an
//! [`EngineHandle`], a mutex around the whole engine.  Every reveal and every append happens
//! under that one lock, which is what keeps a catch-up from being interrupted halfway.
//!
//! The binary reads [`Settings`] from `Tweetle.toml`, creates an [`App`], and hands it stdin.  We
//! decorate the main function with `#[tokio::main]`, using [`tokio`] for our runtime.
mod act;
mod ago;
mod app;
mod chatter;
mod cursor;
mod engine;
mod error;
mod id;
mod message;
mod scheduler;
mod settings;
mod sink;
mod utils;
mod view;

/// Since this is a small crate, we lift all user-facing data types and functions to the parent
/// namespace for ease of access.
pub use act::{Act, Verb};
pub use ago::ago;
pub use app::App;
pub use chatter::{Chatterbox, Chirp, Flock, Quip, Quips};
pub use cursor::RevealCursor;
pub use engine::{EngineHandle, FeedEngine};
pub use error::{Arrive, Blame};
pub use id::{Counter, Identifier};
pub use message::{Message, MessageStore, MessageStream, StreamRef};
pub use scheduler::RevealScheduler;
pub use settings::Settings;
pub use sink::{Board, PresentationSink};
pub use utils::trace_init;
pub use view::{View, ViewState};
