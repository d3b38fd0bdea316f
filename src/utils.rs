use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global [`tracing`] subscriber.  The filter comes from `RUST_LOG` when it is set,
/// and otherwise shows `info` and up from this crate and warnings from everybody else.  Calling it
/// twice is harmless; the second call finds a subscriber already in place and leaves it be.
pub fn trace_init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tweetle=info,warn"));
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
    {
        tracing::trace!("Loading Tweetle...");
    }
}
