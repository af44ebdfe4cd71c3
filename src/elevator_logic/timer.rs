//! Timers used by the elevator logic.
//!
//! - [Timer]: a restartable timer whose deadline the control loop sleeps on. Used as the travel
//!   watchdog.
//! - [ClaimTimer]: a one-shot task that enqueues [Wake::ClaimExpired] when a pending order's
//!   deadline passes. It never touches the order state itself.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use super::Wake;
use crate::elevio::{Direction, Floor};

/// Restartable timer. `deadline()` is `None` while stopped.
#[derive(Debug)]
pub struct Timer {
    timer_active: bool,
    timeout_duration: Duration,
    start_time: Instant,
}

/// Creates a stopped timer with the given timeout
pub fn new(timeout_duration: Duration) -> Timer {
    Timer {
        timer_active: false,
        timeout_duration,
        start_time: Instant::now(),
    }
}

impl Timer {
    /// (Re)starts the timer from now
    pub fn timer_start(&mut self) {
        self.timer_active = true;
        self.start_time = Instant::now();
    }

    pub fn timer_stop(&mut self) {
        self.timer_active = false;
    }

    /// When the timer times out, if it is running
    pub fn deadline(&self) -> Option<Instant> {
        self.timer_active.then(|| self.start_time + self.timeout_duration)
    }
}

/// The live timer of one pending hall order.
///
/// Dropping it aborts the task, so removing a pending order cancels its timer. An expiry that
/// was already queued when the timer was dropped is caught by the generation check in
/// [`Orders::on_claim_expired`](super::orders::Orders::on_claim_expired).
#[derive(Debug)]
pub struct ClaimTimer {
    deadline: Instant,
    generation: u64,
    handle: JoinHandle<()>,
}

impl ClaimTimer {
    /// Spawns a task that sends `Wake::ClaimExpired` at `deadline`
    pub fn start(
        floor: Floor,
        direction: Direction,
        deadline: Instant,
        generation: u64,
        wake_tx: mpsc::Sender<Wake>,
    ) -> ClaimTimer {
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = wake_tx
                .send(Wake::ClaimExpired { floor, direction, generation })
                .await;
        });
        ClaimTimer { deadline, generation, handle }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for ClaimTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn watchdog_deadline_follows_restarts() {
        let mut t = new(Duration::from_secs(10));
        assert_eq!(t.deadline(), None);

        t.timer_start();
        let first = t.deadline().unwrap();
        assert_eq!(first, Instant::now() + Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        t.timer_start();
        assert_eq!(t.deadline(), Some(first + Duration::from_secs(4)));

        t.timer_stop();
        assert_eq!(t.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_timer_fires_once_at_deadline() {
        let (tx, mut rx) = mpsc::channel(4);
        let deadline = Instant::now() + Duration::from_millis(500);
        let _timer = ClaimTimer::start(2, Direction::Up, deadline, 7, tx);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        let wake = rx.recv().await;
        assert_eq!(
            wake,
            Some(Wake::ClaimExpired { floor: 2, direction: Direction::Up, generation: 7 })
        );
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_claim_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(4);
        let timer = ClaimTimer::start(1, Direction::Down, Instant::now() + Duration::from_secs(1), 1, tx);
        drop(timer);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
