//! Stop and direction decisions.
//!
//! This module extends [Orders] with the dispatch scheduler: whether to stop at a floor, and
//! which way to travel next. Both decisions are derived from the stop table alone; pending
//! orders that are still racing play no part until they are claimed.
//!
//! # Overview
//! - [`Orders::should_stop`]: stop at `floor` given the current travel direction?
//! - [`Orders::next_direction`]: SCAN sweep. Keep going while there is a stop ahead, otherwise
//!   turn around and scan the whole opposite range, otherwise go idle.
//!
//! `next_direction` is the only place the node's travel direction is changed.
//!
//! # Example
//! ```rust,no_run
//! # fn demo(orders: &mut elevatornode::elevator_logic::orders::Orders) {
//! use elevatornode::elevio::Direction;
//!
//! if orders.should_stop(orders.node().current_floor) {
//!     // stop, open the door, clear the floor
//! }
//! match orders.next_direction() {
//!     Direction::None => { /* idle, or serve the current floor in place */ }
//!     dir => { /* run the motor in `dir` */ }
//! }
//! # }
//! ```

use super::orders::Orders;
use crate::elevio::{Direction, Floor};

impl Orders {
    /// First floor above the current one with any stop flag set
    fn above(&self) -> Option<Floor> {
        let cur = self.node().current_floor;
        ((cur + 1)..self.num_floors()).find(|f| self.has_request_at(*f))
    }

    /// First floor below the current one, nearest first
    fn below(&self) -> Option<Floor> {
        let cur = self.node().current_floor;
        (0..cur).rev().find(|f| self.has_request_at(*f))
    }

    fn here(&self) -> Option<Floor> {
        let cur = self.node().current_floor;
        self.has_request_at(cur).then_some(cur)
    }

    /// Whether the car should stop at `floor`.
    ///
    /// True at terminal floors, for a claimed order in the current travel direction, and for
    /// a cab call.
    pub fn should_stop(&self, floor: Floor) -> bool {
        self.is_terminal(floor)
            || self.stop_flag(floor, self.node().current_direction)
            || self.stop_flag(floor, Direction::None)
    }

    /// Picks the next travel direction and stores it as the node's current direction.
    ///
    /// Moving up: the nearest stop above; else scan down from the current floor (inclusive).
    /// Moving down is the mirror image. Idle: the current floor, then above, then below.
    ///
    /// The result is the sign of the offset to the stop found, so a stop at the current
    /// floor gives `Direction::None` with [`Orders::has_request_at`] true for that floor.
    pub fn next_direction(&mut self) -> Direction {
        let target = match self.node().current_direction {
            Direction::Up => self.above().or_else(|| self.here()).or_else(|| self.below()),
            Direction::Down => self.below().or_else(|| self.here()).or_else(|| self.above()),
            Direction::None => self.here().or_else(|| self.above()).or_else(|| self.below()),
        };

        let direction = match target {
            Some(floor) => Direction::towards(self.node().current_floor, floor),
            None => Direction::None,
        };
        self.set_direction(direction);
        direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevator_logic::orders::tests::orders;
    use crate::elevator_logic::Wake;
    use tokio::sync::mpsc;

    /// Claims a hall order by running its timer out
    async fn claim(orders: &mut Orders, rx: &mut mpsc::Receiver<Wake>, floor: Floor, dir: Direction) {
        orders.new_order(floor, dir);
        while orders.is_pending(floor, orders.normalize(floor, dir)) {
            if let Some(Wake::ClaimExpired { floor, direction, generation }) = rx.recv().await {
                orders.on_claim_expired(floor, direction, generation);
            }
        }
    }

    /// Drives the scheduler like the control loop would, returning the floors stopped at
    fn sweep(orders: &mut Orders) -> Vec<Floor> {
        let mut stops = Vec::new();
        for _ in 0..32 {
            let cur = orders.node().current_floor;
            let dir = orders.next_direction();
            if dir == Direction::None {
                if !orders.has_request_at(cur) {
                    break;
                }
                for d in Direction::ALL {
                    orders.clear_order(cur, d);
                }
                stops.push(cur);
                continue;
            }
            let next = if dir == Direction::Up { cur + 1 } else { cur - 1 };
            orders.update_floor(next);
            if orders.should_stop(next) && orders.has_request_at(next) {
                orders.clear_order(next, dir);
                orders.clear_order(next, Direction::None);
                stops.push(next);
            }
        }
        stops
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_floors_always_stop() {
        let (orders, _rx, _dir) = orders(0);
        assert!(orders.should_stop(0));
        assert!(orders.should_stop(3));
        assert!(!orders.should_stop(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_floor_is_no_longer_a_stop() {
        let (mut orders, mut rx, _dir) = orders(0);
        orders.new_order(2, Direction::None);
        assert!(orders.should_stop(2));

        orders.clear_order(2, Direction::None);
        assert!(!orders.should_stop(2));

        claim(&mut orders, &mut rx, 1, Direction::Down).await;
        orders.update_floor(3);
        assert_eq!(orders.next_direction(), Direction::Down);
        assert!(orders.should_stop(1));
        orders.clear_order(1, Direction::Down);
        assert!(!orders.should_stop(1));
    }

    #[tokio::test(start_paused = true)]
    async fn hall_call_against_travel_is_passed() {
        let (mut orders, mut rx, _dir) = orders(0);
        claim(&mut orders, &mut rx, 2, Direction::Down).await;
        orders.new_order(3, Direction::None);

        assert_eq!(orders.next_direction(), Direction::Up);
        orders.update_floor(2);
        assert!(!orders.should_stop(2));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_keeps_direction_then_reverses() {
        let (mut orders, mut rx, _dir) = orders(0);
        orders.update_floor(1);
        orders.new_order(0, Direction::None);
        orders.new_order(3, Direction::None);
        claim(&mut orders, &mut rx, 2, Direction::Up).await;

        // Idle at 1 with stops on both sides: the first found above wins.
        assert_eq!(sweep(&mut orders), vec![2, 3, 0]);
        assert_eq!(orders.node().current_direction, Direction::None);
    }

    #[tokio::test(start_paused = true)]
    async fn request_at_current_floor_gives_none() {
        let (mut orders, _rx, _dir) = orders(0);
        orders.update_floor(2);
        orders.new_order(2, Direction::None);
        assert_eq!(orders.next_direction(), Direction::None);
        assert!(orders.has_request_at(2));
    }

    #[tokio::test(start_paused = true)]
    async fn reverse_scan_includes_current_floor() {
        let (mut orders, mut rx, _dir) = orders(0);
        orders.new_order(3, Direction::None);
        assert_eq!(orders.next_direction(), Direction::Up);
        orders.update_floor(2);
        claim(&mut orders, &mut rx, 2, Direction::Down).await;
        orders.clear_order(3, Direction::None);

        // Nothing above any more; the down call at 2 is found before anything lower.
        orders.new_order(0, Direction::None);
        assert_eq!(orders.next_direction(), Direction::None);
        assert!(orders.has_request_at(2));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_to_do_means_idle() {
        let (mut orders, _rx, _dir) = orders(0);
        orders.update_floor(2);
        assert_eq!(orders.next_direction(), Direction::None);
        assert_eq!(orders.node().current_direction, Direction::None);
    }

    #[tokio::test(start_paused = true)]
    async fn imported_cab_call_is_a_stop_in_every_direction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");
        std::fs::write(&path, "2\n").unwrap();
        let (tx, _rx) = mpsc::channel(4);
        let mut orders = Orders::new(0, 4, crate::backup::CabLog::open(&path, 4).unwrap(), tx);
        assert_eq!(orders.import_cab_log(), 1);

        for d in Direction::ALL {
            orders.set_direction(d);
            assert!(orders.should_stop(2), "no stop at 2 while {}", d);
        }
        assert_eq!(orders.next_direction(), Direction::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_continues_up_past_a_cleared_stop() {
        let (mut orders, _rx, _dir) = orders(0);
        orders.new_order(1, Direction::None);
        orders.new_order(3, Direction::None);
        orders.set_direction(Direction::Up);
        assert_eq!(orders.next_direction(), Direction::Up);

        orders.update_floor(1);
        assert!(orders.should_stop(1));
        orders.clear_order(1, Direction::None);
        assert_eq!(orders.next_direction(), Direction::Up);

        orders.update_floor(3);
        orders.clear_order(3, Direction::None);
        assert_eq!(orders.next_direction(), Direction::None);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_a_hall_order_also_clears_the_cab_call_there() {
        let (mut orders, mut rx, dir) = orders(1);
        orders.new_order(2, Direction::None);
        claim(&mut orders, &mut rx, 2, Direction::Up).await;
        orders.update_floor(1);
        assert_eq!(orders.next_direction(), Direction::Up);

        assert!(orders.clear_order(2, Direction::Up));
        assert!(!orders.should_stop(2));
        assert!(!orders.has_request_at(2));
        let text = std::fs::read_to_string(dir.path().join("cab.log")).unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_hall_order_is_never_a_stop_in_its_direction() {
        for floor in 1..3u8 {
            for d in [Direction::Up, Direction::Down] {
                let (mut orders, mut rx, _dir) = orders(0);
                orders.new_order(floor, Direction::None);
                claim(&mut orders, &mut rx, floor, d).await;

                orders.clear_order(floor, d);
                orders.set_direction(d);
                assert!(!orders.should_stop(floor), "stop at {} ({}) after clearing", floor, d);
            }
        }
    }
}
