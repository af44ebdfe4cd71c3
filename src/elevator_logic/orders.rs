//! ## Order arbitration
//!
//! Every node hears every hall call. Instead of electing someone to hand orders out, each node
//! starts a claim timer whose length is its own cost of serving the order. The cheapest node's
//! timer fires first; it claims the order and broadcasts `AcceptedOrder`, and every other node
//! pushes its own timer far into the future. Whoever finally serves the order broadcasts
//! `CompletedOrder`, which removes it everywhere.
//!
//! [Orders] owns all of this node's order state:
//! - the stop table: `(direction, floor) -> bool`, the orders this node intends to serve
//! - the pending hall orders, each with a [ClaimTimer]
//! - the [CabLog]
//!
//! It is only ever touched from the control loop, so there is no locking.
//!
//! ### Terminal floors
//! The bottom floor only has an up button and the top floor only a down button, but a car
//! always *arrives* at them travelling down and up respectively. Hall orders are therefore
//! keyed by arrival direction: floor 0 is stored as `Down`, the top floor as `Up`.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use super::timer::ClaimTimer;
use super::Wake;
use crate::backup::CabLog;
use crate::config;
use crate::elevio::{Direction, Floor};
use crate::print;

/// Position and travel of this node, as seen by the cost function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    pub node_id: u8,
    /// Last floor the sensor reported
    pub current_floor: Floor,
    /// Set by the scheduler only. `None` means idle.
    pub current_direction: Direction,
}

impl NodeState {
    /// Whether `floor` lies strictly ahead in the direction of travel. Never true when idle.
    pub fn is_ahead(&self, floor: Floor) -> bool {
        match self.current_direction {
            Direction::Up => floor > self.current_floor,
            Direction::Down => floor < self.current_floor,
            Direction::None => false,
        }
    }

    /// Claim delay for a hall order at `(floor, direction)`.
    ///
    /// Moving: `15 units` if not ahead, `10 units` if against the travel direction, one unit
    /// per floor of distance. Idle: nothing but the id offset, so idle nodes race in id order.
    pub fn cost(&self, floor: Floor, direction: Direction) -> Duration {
        let id_offset = config::ID_OFFSET_UNIT * u32::from(self.node_id);
        if self.current_direction == Direction::None {
            return id_offset;
        }

        let mut units = u32::from(floor.abs_diff(self.current_floor));
        if !self.is_ahead(floor) {
            units += config::NOT_AHEAD_PENALTY;
        }
        if direction != self.current_direction {
            units += config::WRONG_DIRECTION_PENALTY;
        }
        config::COST_UNIT * units + id_offset
    }
}

/// An unclaimed hall order and its claim timer
#[derive(Debug)]
pub struct PendingOrder {
    timer: ClaimTimer,
}

impl PendingOrder {
    pub fn deadline(&self) -> Instant {
        self.timer.deadline()
    }
}

/// What [Orders::new_order] did with an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewOrderOutcome {
    /// Cab call, set in the stop table right away
    Stop,
    /// Hall call, claim timer started
    Pending,
    /// Hall call already racing, nothing changed
    AlreadyPending,
    /// Hall call this node has already claimed
    AlreadyClaimed,
    /// Floor out of range
    Rejected,
}

/// All order state of the local node
#[derive(Debug)]
pub struct Orders {
    node: NodeState,
    num_floors: u8,
    /// Indexed by `Direction::index()`, then floor
    stop_table: [Vec<bool>; 3],
    pending: HashMap<(Floor, Direction), PendingOrder>,
    cab_log: CabLog,
    wake_tx: mpsc::Sender<Wake>,
    next_generation: u64,
}

impl Orders {
    /// Empty order state for node `node_id`, parked at floor 0 and idle.
    ///
    /// `wake_tx` is where claim timers report expiries.
    pub fn new(node_id: u8, num_floors: u8, cab_log: CabLog, wake_tx: mpsc::Sender<Wake>) -> Orders {
        let row = vec![false; num_floors.into()];
        Orders {
            node: NodeState {
                node_id,
                current_floor: 0,
                current_direction: Direction::None,
            },
            num_floors,
            stop_table: [row.clone(), row.clone(), row],
            pending: HashMap::new(),
            cab_log,
            wake_tx,
            next_generation: 0,
        }
    }

    pub fn node(&self) -> &NodeState {
        &self.node
    }

    pub fn num_floors(&self) -> u8 {
        self.num_floors
    }

    pub fn top_floor(&self) -> Floor {
        self.num_floors - 1
    }

    pub fn is_terminal(&self, floor: Floor) -> bool {
        floor == 0 || floor == self.top_floor()
    }

    /// Records the floor the sensor just reported
    pub fn update_floor(&mut self, floor: Floor) {
        if floor < self.num_floors {
            self.node.current_floor = floor;
        }
    }

    pub(super) fn set_direction(&mut self, direction: Direction) {
        self.node.current_direction = direction;
    }

    /// Key a hall order is stored under. Cab calls are left alone.
    pub fn normalize(&self, floor: Floor, direction: Direction) -> Direction {
        match direction {
            Direction::None => Direction::None,
            _ if floor == 0 => Direction::Down,
            _ if floor == self.top_floor() => Direction::Up,
            d => d,
        }
    }

    /// Raw stop table lookup, without normalizing
    pub fn stop_flag(&self, floor: Floor, direction: Direction) -> bool {
        self.stop_table[direction.index()]
            .get(floor as usize)
            .copied()
            .unwrap_or(false)
    }

    fn set_stop_flag(&mut self, floor: Floor, direction: Direction, on: bool) -> bool {
        match self.stop_table[direction.index()].get_mut(floor as usize) {
            Some(flag) => std::mem::replace(flag, on),
            None => false,
        }
    }

    /// Whether an unclaimed hall order exists, without normalizing
    pub fn is_pending(&self, floor: Floor, direction: Direction) -> bool {
        self.pending.contains_key(&(floor, direction))
    }

    pub fn pending_deadline(&self, floor: Floor, direction: Direction) -> Option<Instant> {
        let direction = self.normalize(floor, direction);
        self.pending.get(&(floor, direction)).map(PendingOrder::deadline)
    }

    /// Whether any of the three stop flags is set at `floor`
    pub fn has_request_at(&self, floor: Floor) -> bool {
        Direction::ALL.iter().any(|d| self.stop_flag(floor, *d))
    }

    fn arm(&mut self, floor: Floor, direction: Direction, deadline: Instant) {
        self.next_generation += 1;
        let timer = ClaimTimer::start(
            floor,
            direction,
            deadline,
            self.next_generation,
            self.wake_tx.clone(),
        );
        // Replacing an entry drops, and thereby aborts, the old timer.
        self.pending.insert((floor, direction), PendingOrder { timer });
    }

    /// Registers an order, local or from the network.
    ///
    /// Cab calls go straight into the stop table and the cab log. Hall calls start a claim
    /// timer of `cost(floor, direction)`.
    pub fn new_order(&mut self, floor: Floor, direction: Direction) -> NewOrderOutcome {
        if floor >= self.num_floors {
            print::cosmic_err(format!("new_order at floor {}", floor));
            return NewOrderOutcome::Rejected;
        }

        if direction == Direction::None {
            self.set_stop_flag(floor, Direction::None, true);
            self.cab_log.add(floor);
            return NewOrderOutcome::Stop;
        }

        let direction = self.normalize(floor, direction);
        if self.stop_flag(floor, direction) {
            return NewOrderOutcome::AlreadyClaimed;
        }
        if self.is_pending(floor, direction) {
            return NewOrderOutcome::AlreadyPending;
        }

        let cost = self.node.cost(floor, direction);
        self.arm(floor, direction, Instant::now() + cost);
        print::info(format!(
            "Order at floor {} ({}) pending, claiming in {} ms",
            floor,
            direction,
            cost.as_millis()
        ));
        NewOrderOutcome::Pending
    }

    /// A peer claimed `(floor, direction)`: push our own claim back.
    ///
    /// The new deadline is `max(deadline, now) + BACKOFF_DELAY + cost`. Returns `false`, with a
    /// warning, if there was nothing pending.
    pub fn order_accepted_remotely(&mut self, floor: Floor, direction: Direction) -> bool {
        let direction = self.normalize(floor, direction);
        let Some(order) = self.pending.get(&(floor, direction)) else {
            print::warn(format!(
                "AcceptedOrder for floor {} ({}) that is not pending here",
                floor, direction
            ));
            return false;
        };

        let base = order.deadline().max(Instant::now());
        let deadline = base + config::BACKOFF_DELAY + self.node.cost(floor, direction);
        self.arm(floor, direction, deadline);
        true
    }

    /// Removes an order from the stop table and from the pending orders.
    ///
    /// A served hall order means the car has been at the floor, so it also takes the cab call
    /// there with it. Cab calls leave the cab log as well. Returns whether there was anything
    /// to clear.
    pub fn clear_order(&mut self, floor: Floor, direction: Direction) -> bool {
        let direction = self.normalize(floor, direction);
        let was_set = self.set_stop_flag(floor, direction, false);
        let was_pending = self.pending.remove(&(floor, direction)).is_some();
        let cab_was_set = direction != Direction::None && self.set_stop_flag(floor, Direction::None, false);
        self.cab_log.remove(floor);
        was_set || was_pending || cab_was_set
    }

    /// Loads the persisted cab calls into the stop table. Returns how many were loaded.
    pub fn import_cab_log(&mut self) -> usize {
        let floors: Vec<Floor> = self
            .cab_log
            .floors()
            .filter(|f| *f < self.num_floors)
            .collect();
        for floor in &floors {
            self.set_stop_flag(*floor, Direction::None, true);
        }
        floors.len()
    }

    /// A claim timer fired. Claims the order if the timer is still the live one.
    ///
    /// Returns `true` if the order moved into the stop table; the caller then broadcasts
    /// `AcceptedOrder`.
    pub fn on_claim_expired(&mut self, floor: Floor, direction: Direction, generation: u64) -> bool {
        match self.pending.get(&(floor, direction)) {
            Some(order) if order.timer.generation() == generation => {}
            _ => return false,
        }
        self.pending.remove(&(floor, direction));
        self.set_stop_flag(floor, direction, true);
        print::ok(format!("Claimed order at floor {} ({})", floor, direction));
        true
    }
}
