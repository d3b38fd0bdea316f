use crate::{RevealCursor, StreamRef};

/// The two places a message can show up.  `Main` is the home timeline, `Overlay` is the panel
/// that slides over it to show a single author.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum View {
    Main,
    Overlay,
}

/// Per-view bookkeeping inside the [`crate::FeedEngine`].
///
/// There are two switches that can stop a view from revealing.  The `manual` switch is the one the
/// viewer flips with the refresh toggle.  The `hover_paused` switch is thrown when the pointer
/// settles on the feed, and only if the view was revealing at the time.  Keeping them apart means
/// moving the pointer away can never turn revealing back on after the viewer switched it off.
///
/// The `shown` flag tracks whether the view is on screen at all.  The main view is always shown;
/// the overlay is shown from the first author selection until it is dismissed, and a hidden view
/// is never ticked.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ViewState {
    #[setters(skip)]
    cursor: RevealCursor,
    manual: bool,
    hover_paused: bool,
    shown: bool,
}

impl ViewState {
    pub fn main() -> Self {
        Self {
            cursor: RevealCursor::new(StreamRef::Home),
            manual: true,
            hover_paused: false,
            shown: true,
        }
    }

    /// The overlay starts out hidden and pointed at nobody.
    pub fn overlay() -> Self {
        Self {
            cursor: RevealCursor::new(StreamRef::author("")),
            manual: true,
            hover_paused: false,
            shown: false,
        }
    }

    /// Whether ticks should reveal anything.
    pub fn enabled(&self) -> bool {
        self.manual && !self.hover_paused
    }

    pub fn cursor_mut(&mut self) -> &mut RevealCursor {
        &mut self.cursor
    }

    pub fn set_manual(&mut self, manual: bool) {
        self.manual = manual;
    }

    pub fn set_hover_paused(&mut self, hover_paused: bool) {
        self.hover_paused = hover_paused;
    }

    pub fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
    }
}
