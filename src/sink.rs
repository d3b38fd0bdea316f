use crate::{ago, Message, View};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Whatever puts revealed messages in front of the viewer.  The [`crate::FeedEngine`] calls
/// [`PresentationSink::render`] exactly once per revealed message, in reveal order, from inside
/// the tick or catch-up that revealed it.
pub trait PresentationSink: Send {
    fn render(&mut self, view: View, message: &Arc<Message>);

    /// Empties a view, called when the overlay opens on a new author.
    fn clear(&mut self, _view: View) {}
}

/// The `Board` is the headless stand-in for the page: a newest-first timeline per view, the way
/// tweetles stack up when each new one is prepended to the feed.  Cloning a `Board` gives another
/// handle on the same timelines, so the app can hand one clone to the engine and keep another to
/// read from.
#[derive(Debug, Default, Clone)]
pub struct Board {
    timelines: Arc<Mutex<BTreeMap<View, VecDeque<Arc<Message>>>>>,
}

impl Board {
    /// Copies out the timeline for `view`, newest first.
    pub fn timeline(&self, view: View) -> Vec<Arc<Message>> {
        let timelines = self.timelines.lock().unwrap_or_else(PoisonError::into_inner);
        timelines
            .get(&view)
            .map(|timeline| timeline.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Formats the timeline for `view` with timestamps relative to `now`.  Calling this again later
    /// refreshes every "minutes ago" on the board.
    pub fn labels(&self, view: View, now: DateTime<Utc>) -> Vec<String> {
        self.timeline(view)
            .iter()
            .map(|message| format!("{} ({})", message, ago(*message.created_at(), now)))
            .collect()
    }

    pub fn len(&self, view: View) -> usize {
        let timelines = self.timelines.lock().unwrap_or_else(PoisonError::into_inner);
        timelines.get(&view).map(VecDeque::len).unwrap_or_default()
    }

    pub fn is_empty(&self, view: View) -> bool {
        self.len(view) == 0
    }
}

impl PresentationSink for Board {
    fn render(&mut self, view: View, message: &Arc<Message>) {
        tracing::info!("[{view}] {message}");
        let mut timelines = self.timelines.lock().unwrap_or_else(PoisonError::into_inner);
        timelines.entry(view).or_default().push_front(message.clone());
    }

    fn clear(&mut self, view: View) {
        tracing::trace!("Clearing {view}.");
        let mut timelines = self.timelines.lock().unwrap_or_else(PoisonError::into_inner);
        timelines.remove(&view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageStore;
    use chrono::Duration;

    #[test]
    fn board_stacks_newest_first() {
        let mut store = MessageStore::default();
        let now = Utc::now();
        let old = store.append("mracus", "old", now - Duration::minutes(3));
        let new = store.append("mracus", "new", now);
        let mut board = Board::default();
        let reader = board.clone();
        board.render(View::Main, &old);
        board.render(View::Main, &new);
        let texts = reader
            .timeline(View::Main)
            .iter()
            .map(|m| m.text().clone())
            .collect::<Vec<String>>();
        assert_eq!(texts, vec!["new", "old"]);
        assert_eq!(
            reader.labels(View::Main, now),
            vec![
                "@mracus: new (a few seconds ago)".to_string(),
                "@mracus: old (3 minutes ago)".to_string(),
            ]
        );
        assert!(reader.is_empty(View::Overlay));
    }

    #[test]
    fn clear_only_touches_one_view() {
        let mut store = MessageStore::default();
        let message = store.append("mracus", "hi", Utc::now());
        let mut board = Board::default();
        board.render(View::Main, &message);
        board.render(View::Overlay, &message);
        board.clear(View::Overlay);
        assert_eq!(board.len(View::Main), 1);
        assert!(board.is_empty(View::Overlay));
    }
}
