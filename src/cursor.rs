use crate::{Arrive, Blame, Message, MessageStore, StreamRef};
use std::sync::Arc;

/// The `RevealCursor` remembers how far into a stream the viewer has been shown.  Everything
/// before `revealed` is on screen, everything from `revealed` on is still waiting its turn.
///
/// The cursor does not own the messages.  It holds a [`StreamRef`] and reads the stream out of the
/// [`MessageStore`] it is handed on each call, which is how new messages become "unrevealed"
/// without anybody telling the cursor about them.
#[derive(Debug, Default, Clone, PartialEq, Eq, derive_new::new, derive_getters::Getters)]
pub struct RevealCursor {
    #[new(default)]
    revealed: usize,
    target: StreamRef,
}

impl RevealCursor {
    /// Whether the target stream holds anything past the `revealed` mark.
    pub fn has_unrevealed(&self, store: &MessageStore) -> bool {
        self.revealed < store.len(&self.target)
    }

    /// Number of messages waiting to be revealed.
    pub fn pending(&self, store: &MessageStore) -> usize {
        store.len(&self.target).saturating_sub(self.revealed)
    }

    /// Takes the next message off the stream and moves the mark forward by exactly one.
    /// Will [`Blame::OutOfRange`] if there is nothing left to show.
    pub fn reveal_next(&mut self, store: &MessageStore) -> Arrive<Arc<Message>> {
        let stream = store.stream(&self.target);
        match stream.get(self.revealed) {
            Some(message) => {
                self.revealed += 1;
                Ok(message.clone())
            }
            None => Err(Blame::OutOfRange {
                revealed: self.revealed,
                len: stream.len(),
            }),
        }
    }

    /// Points the cursor at `target` and starts over from the top.  We reset even when the new
    /// target is the one we already had: picking the same author twice reopens their stream from
    /// the beginning.
    pub fn retarget(&mut self, target: StreamRef) {
        tracing::trace!("Cursor retargeted from {} to {target}.", self.target);
        self.target = target;
        self.revealed = 0;
    }

    /// Reveals everything that is waiting, oldest first.  The `&mut self` borrow keeps anybody
    /// else from ticking this cursor until the whole batch is out.
    pub fn catch_up(&mut self, store: &MessageStore) -> Arrive<Vec<Arc<Message>>> {
        let mut batch = Vec::with_capacity(self.pending(store));
        while self.has_unrevealed(store) {
            batch.push(self.reveal_next(store)?);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store(count: usize) -> MessageStore {
        let mut store = MessageStore::default();
        for i in 0..count {
            let author = if i % 2 == 0 { "even" } else { "odd" };
            store.append(author, &format!("message {i}"), Utc::now());
        }
        store
    }

    #[test]
    fn reveal_next_walks_in_order() {
        let store = store(3);
        let mut cursor = RevealCursor::new(StreamRef::Home);
        let first = cursor.reveal_next(&store).unwrap();
        let second = cursor.reveal_next(&store).unwrap();
        assert_eq!(first.text(), "message 0");
        assert_eq!(second.text(), "message 1");
        assert_eq!(*cursor.revealed(), 2);
    }

    #[test]
    fn reveal_next_past_the_end_is_blamed() {
        let store = store(1);
        let mut cursor = RevealCursor::new(StreamRef::Home);
        cursor.reveal_next(&store).unwrap();
        let blame = cursor.reveal_next(&store).unwrap_err();
        assert!(matches!(blame, Blame::OutOfRange { revealed: 1, len: 1 }));
        assert_eq!(*cursor.revealed(), 1);
    }

    #[test]
    fn catch_up_reveals_exactly_what_was_pending() {
        let store = store(5);
        let mut cursor = RevealCursor::new(StreamRef::Home);
        cursor.reveal_next(&store).unwrap();
        cursor.reveal_next(&store).unwrap();
        let pending = cursor.pending(&store);
        let batch = cursor.catch_up(&store).unwrap();
        assert_eq!(batch.len(), pending);
        assert!(!cursor.has_unrevealed(&store));
        let seqs = batch.iter().map(|m| *m.seq()).collect::<Vec<u64>>();
        assert_eq!(seqs, vec![3, 4, 5]);
        // Nothing left, nothing returned.
        assert!(cursor.catch_up(&store).unwrap().is_empty());
    }

    #[test]
    fn new_messages_become_unrevealed() {
        let mut store = store(2);
        let mut cursor = RevealCursor::new(StreamRef::author("odd"));
        cursor.catch_up(&store).unwrap();
        assert!(!cursor.has_unrevealed(&store));
        store.append("odd", "late arrival", Utc::now());
        assert!(cursor.has_unrevealed(&store));
        assert_eq!(cursor.reveal_next(&store).unwrap().text(), "late arrival");
    }

    #[test]
    fn retarget_always_resets() {
        let store = store(4);
        let mut cursor = RevealCursor::new(StreamRef::author("even"));
        cursor.catch_up(&store).unwrap();
        assert_eq!(*cursor.revealed(), 2);
        cursor.retarget(StreamRef::author("even"));
        assert_eq!(*cursor.revealed(), 0);
        cursor.retarget(StreamRef::author("stranger"));
        assert!(!cursor.has_unrevealed(&store));
        assert!(cursor.catch_up(&store).unwrap().is_empty());
    }
}
