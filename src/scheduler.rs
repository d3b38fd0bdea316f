use crate::{EngineHandle, View};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

/// The `RevealScheduler` keeps the feed trickling.  For each view it runs one background task that
/// wakes up every interval and asks the [`crate::FeedEngine`] to tick.
///
/// Each view gets at most one timer.  Starting a view that already has one aborts the old task
/// before spawning the new one, so hammering `start` never doubles the reveal rate.  The timer
/// does not remember anything about the feed; the cursor inside the engine is the only record of
/// what has been shown, so stopping and restarting cannot skip or repeat a message.
///
/// The scheduler has to be used from inside a [`tokio`] runtime, since [`RevealScheduler::start`]
/// spawns onto it.  Dropping the scheduler stops every timer it owns.
pub struct RevealScheduler {
    engine: EngineHandle,
    timers: HashMap<View, JoinHandle<()>>,
}

impl RevealScheduler {
    const SHORTEST: Duration = Duration::from_millis(1);

    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            timers: HashMap::new(),
        }
    }

    /// Starts ticking `view` every `interval`, replacing any timer the view already had.  The
    /// first tick lands one full interval from now.  Intervals shorter than a millisecond are
    /// rounded up to one, since [`time::interval_at`] will not take a zero period.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, view: View, interval: Duration) {
        let interval = if interval < Self::SHORTEST {
            tracing::warn!("A {interval:?} interval is too short, ticking {view} every 1ms.");
            Self::SHORTEST
        } else {
            interval
        };
        if self.stop(view) {
            tracing::trace!("Replacing the {view} timer.");
        }
        let engine = self.engine.clone();
        let handle = tokio::spawn(async move {
            let mut timer = time::interval_at(time::Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                let tick = engine.lock().and_then(|mut engine| engine.tick(view));
                if let Err(e) = tick {
                    tracing::warn!("The {view} timer gave up: {e}");
                    break;
                }
            }
        });
        self.timers.insert(view, handle);
        tracing::trace!("Ticking {view} every {interval:?}.");
    }

    /// Cancels the timer for `view`.  Safe to call when there is none.  Returns whether a timer
    /// was running.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self, view: View) -> bool {
        match self.timers.remove(&view) {
            Some(handle) => {
                handle.abort();
                tracing::trace!("Stopped the {view} timer.");
                true
            }
            None => false,
        }
    }

    /// Whether `view` has a live timer.
    pub fn is_running(&self, view: View) -> bool {
        self.timers
            .get(&view)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of live timers across all views.
    pub fn running(&self) -> usize {
        self.timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, FeedEngine};
    use chrono::Utc;

    fn handle(count: usize) -> EngineHandle {
        let mut engine = FeedEngine::new("you", Board::default());
        for i in 0..count {
            engine.ingest("mracus", &format!("m{i}"), Utc::now());
        }
        EngineHandle::new(engine)
    }

    fn revealed(engine: &EngineHandle, view: View) -> usize {
        engine.lock().unwrap().revealed(view)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let engine = handle(5);
        let mut scheduler = RevealScheduler::new(engine.clone());
        scheduler.start(View::Main, Duration::from_millis(500));
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(revealed(&engine, View::Main), 0);
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(revealed(&engine, View::Main), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let engine = handle(5);
        let mut scheduler = RevealScheduler::new(engine.clone());
        assert!(!scheduler.stop(View::Main));
        scheduler.start(View::Main, Duration::from_millis(500));
        assert!(scheduler.is_running(View::Main));
        assert!(scheduler.stop(View::Main));
        assert!(!scheduler.stop(View::Main));
        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(revealed(&engine, View::Main), 0);
        assert_eq!(scheduler.running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_rounded_up_instead_of_panicking() {
        let engine = handle(5);
        let mut scheduler = RevealScheduler::new(engine.clone());
        scheduler.start(View::Main, Duration::ZERO);
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(revealed(&engine, View::Main), 5);
        assert!(scheduler.is_running(View::Main));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_stops_the_timers() {
        let engine = handle(5);
        let mut scheduler = RevealScheduler::new(engine.clone());
        scheduler.start(View::Main, Duration::from_millis(500));
        drop(scheduler);
        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(revealed(&engine, View::Main), 0);
    }
}
