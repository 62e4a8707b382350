//! # Game Clock
//!
//! Fixed-rate driver of world time. Each period the clock enqueues one
//! "world-tick" task into the [`TaskQueue`]; the task advances the counter
//! under a ticket mutex (two ticks can never race it, even if a tick
//! suspends mid-flight) and fans out to subscribers. At `day_length` the
//! counter wraps to zero and `on_new_day` fires exactly once.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::queue::TaskQueue;
use crate::task::Task;

/// Current world time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldTime {
    /// Days elapsed since the world started.
    pub day: u64,
    /// Ticks into the current day, in `0..day_length`.
    pub time_of_day: u64,
}

/// Clock tuning.
#[derive(Clone, Copy, Debug)]
pub struct ClockConfig {
    /// Real-time duration of one world tick.
    pub tick_interval: Duration,
    /// Ticks per world day.
    pub day_length: u64,
    /// Time to start counting from.
    pub start: WorldTime,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            day_length: 24,
            start: WorldTime::default(),
        }
    }
}

/// Receives clock events. Registered explicitly at wiring time - there is
/// no ambient subscriber registry.
pub trait ClockSubscriber: Send + Sync {
    /// Called after every tick with the new world time.
    fn on_tick(&self, time: WorldTime);

    /// Called once per day rollover.
    fn on_new_day(&self, day: u64);
}

struct ClockShared {
    config: ClockConfig,
    // Ticket mutex: tick advancement is a compound read-modify-write that
    // must stay serialized even across suspension points.
    time: tokio::sync::Mutex<WorldTime>,
    subscribers: RwLock<Vec<Arc<dyn ClockSubscriber>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// The fixed-rate world clock.
pub struct GameClock {
    queue: TaskQueue,
    shared: Arc<ClockShared>,
}

impl GameClock {
    /// Creates a stopped clock feeding the given queue.
    #[must_use]
    pub fn new(queue: TaskQueue, config: ClockConfig) -> Self {
        let start = config.start;
        Self {
            queue,
            shared: Arc::new(ClockShared {
                config,
                time: tokio::sync::Mutex::new(start),
                subscribers: RwLock::new(Vec::new()),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Registers a subscriber for tick and day-rollover events.
    pub fn subscribe(&self, subscriber: Arc<dyn ClockSubscriber>) {
        self.shared.subscribers.write().push(subscriber);
    }

    /// Snapshot of the current world time.
    pub async fn time(&self) -> WorldTime {
        *self.shared.time.lock().await
    }

    /// Starts the tick timer. Idempotent: a running clock is left alone,
    /// a second timer is never created.
    pub fn start(&self) {
        let mut guard = self.shared.timer.lock();
        if guard.is_some() {
            debug!("game clock already running");
            return;
        }
        info!(interval = ?self.shared.config.tick_interval, "game clock started");
        let queue = self.queue.clone();
        let shared = Arc::clone(&self.shared);
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(shared.config.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it so a
            // full period elapses before the first world tick.
            interval.tick().await;
            loop {
                interval.tick().await;
                let tick_shared = Arc::clone(&shared);
                let task = Task::new("world-tick", move || async move {
                    advance(&tick_shared).await;
                    Ok(())
                });
                // The clock does not consume tick results; failures are
                // logged by the queue.
                drop(queue.enqueue(task).await);
            }
        }));
    }

    /// Stops the tick timer. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.shared.timer.lock().take() {
            handle.abort();
            info!("game clock stopped");
        }
    }

    /// Advances world time by exactly one tick, as the enqueued tick task
    /// does. Exposed for turn-based stepping and deterministic tests.
    pub async fn run_tick(&self) {
        advance(&self.shared).await;
    }
}

/// One serialized tick: bump the counter, wrap at day length, fan out.
async fn advance(shared: &Arc<ClockShared>) {
    let (snapshot, rolled) = {
        let mut time = shared.time.lock().await;
        time.time_of_day += 1;
        if time.time_of_day >= shared.config.day_length {
            time.time_of_day = 0;
            time.day += 1;
            (*time, true)
        } else {
            (*time, false)
        }
    };

    // Fan out after releasing the counter lock; values are snapshotted.
    let subscribers = shared.subscribers.read().clone();
    for subscriber in subscribers {
        subscriber.on_tick(snapshot);
        if rolled {
            subscriber.on_new_day(snapshot.day);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueConfig;

    #[derive(Default)]
    struct Recorder {
        ticks: Mutex<Vec<WorldTime>>,
        days: Mutex<Vec<u64>>,
    }

    impl ClockSubscriber for Recorder {
        fn on_tick(&self, time: WorldTime) {
            self.ticks.lock().push(time);
        }

        fn on_new_day(&self, day: u64) {
            self.days.lock().push(day);
        }
    }

    fn test_clock(start: WorldTime) -> (GameClock, Arc<Recorder>) {
        let queue = TaskQueue::start(QueueConfig::default());
        let clock = GameClock::new(
            queue,
            ClockConfig {
                tick_interval: Duration::from_millis(100),
                day_length: 24,
                start,
            },
        );
        let recorder = Arc::new(Recorder::default());
        clock.subscribe(Arc::clone(&recorder) as Arc<dyn ClockSubscriber>);
        (clock, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_wrap_fires_new_day_exactly_once() {
        let (clock, recorder) = test_clock(WorldTime {
            day: 0,
            time_of_day: 23,
        });

        clock.run_tick().await;

        assert_eq!(
            clock.time().await,
            WorldTime {
                day: 1,
                time_of_day: 0
            }
        );
        assert_eq!(*recorder.days.lock(), vec![1]);
        assert_eq!(recorder.ticks.lock().len(), 1);

        // The next tick must not fire another rollover.
        clock.run_tick().await;
        assert_eq!(*recorder.days.lock(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_ticks_through_queue() {
        let (clock, recorder) = test_clock(WorldTime::default());
        clock.start();

        tokio::time::sleep(Duration::from_millis(350)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        clock.stop();

        assert_eq!(recorder.ticks.lock().len(), 3);
        assert_eq!(clock.time().await.time_of_day, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (clock, recorder) = test_clock(WorldTime::default());
        clock.start();
        clock.start();

        tokio::time::sleep(Duration::from_millis(250)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        clock.stop();

        // A duplicate timer would have doubled the tick count.
        assert_eq!(recorder.ticks.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticking() {
        let (clock, recorder) = test_clock(WorldTime::default());
        clock.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        clock.stop();
        let seen = recorder.ticks.lock().len();

        tokio::time::sleep(Duration::from_millis(500)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(recorder.ticks.lock().len(), seen);
    }
}
