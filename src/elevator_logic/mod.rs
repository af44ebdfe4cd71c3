//! ## The local elevator
//!
//! [LocalElevator] is the control loop of a node. It owns the [orders::Orders] and the driver,
//! and is the only code that mutates either. Everything else (hardware pollers, UDP
//! listeners, claim timers, the door timer) only sends it events:
//!
//! | source            | event                                   |
//! |-------------------|-----------------------------------------|
//! | floor sensor      | [Floor] on every new floor              |
//! | buttons           | [CallButton] on every press             |
//! | stop button       | `bool`, press and release               |
//! | network           | [OrderMessage], already validated       |
//! | timers            | [Wake]                                  |
//!
//! The event handlers are in [fsm], the scheduler in [request].

pub mod fsm;
pub mod lights;
pub mod orders;
pub mod request;
pub mod self_elevator;
pub mod timer;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

use crate::config;
use crate::elevio::{CallButton, Direction, Driver, Floor};
use crate::network::OrderMessage;
use crate::print;
use orders::Orders;

/// Internal events that re-enter the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A claim timer ran out. Only valid if `generation` still matches the pending order.
    ClaimExpired {
        floor: Floor,
        direction: Direction,
        generation: u64,
    },
    /// The door has been open for [config::DOOR_OPEN_TIME]
    DoorClosed,
}

/// Receiving ends of every event source the control loop waits on
pub struct Inputs {
    pub floor_rx: mpsc::Receiver<Floor>,
    pub button_rx: mpsc::Receiver<CallButton>,
    pub stop_rx: mpsc::Receiver<bool>,
    pub net_rx: mpsc::Receiver<OrderMessage>,
    pub wake_rx: mpsc::Receiver<Wake>,
}

/// State of the control loop
pub struct LocalElevator<D: Driver> {
    orders: Orders,
    driver: D,
    outbound_tx: mpsc::Sender<OrderMessage>,
    wake_tx: mpsc::Sender<Wake>,
    door_open: bool,
    /// Stop button held
    halted: bool,
    /// Motor running
    moving: bool,
    /// Driving down to find a floor after a sensor fault
    recovering: bool,
    travel_timer: timer::Timer,
}

impl<D: Driver> LocalElevator<D> {
    /// `wake_tx` must be the sender `orders` was created with.
    pub fn new(
        orders: Orders,
        driver: D,
        outbound_tx: mpsc::Sender<OrderMessage>,
        wake_tx: mpsc::Sender<Wake>,
    ) -> Self {
        Self {
            orders,
            driver,
            outbound_tx,
            wake_tx,
            door_open: false,
            halted: false,
            moving: false,
            recovering: false,
            travel_timer: timer::new(config::TRAVEL_TIMEOUT),
        }
    }

    pub fn orders(&self) -> &Orders {
        &self.orders
    }

    pub fn is_door_open(&self) -> bool {
        self.door_open
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Runs the control loop until every input is closed.
    ///
    /// Handles one event at a time; no handler awaits, so the order state is never seen
    /// half-updated.
    pub async fn run(mut self, mut inputs: Inputs) {
        print::ok(format!(
            "Node {} running at floor {}",
            self.orders.node().node_id,
            self.orders.node().current_floor
        ));
        self.sync_lights();
        print::stop_table(&self.orders);
        // Cab calls loaded from the log are served before anything else arrives.
        self.resume();

        // Kept across iterations so a busy channel cannot push the next poll back.
        let mut recovery_poll = interval(config::RECOVERY_POLL);
        recovery_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let watchdog = self.travel_timer.deadline();
            let recovering = self.recovering;
            tokio::select! {
                Some(floor) = inputs.floor_rx.recv() => self.on_floor_arrival(floor),
                Some(button) = inputs.button_rx.recv() => self.on_button(button),
                Some(pressed) = inputs.stop_rx.recv() => self.on_stop_button(pressed),
                Some(msg) = inputs.net_rx.recv() => self.on_network_order(msg),
                Some(wake) = inputs.wake_rx.recv() => self.on_wake(wake),
                _ = sleep_until(watchdog.unwrap_or_else(Instant::now)), if watchdog.is_some() => {
                    self.on_travel_timeout()
                }
                _ = recovery_poll.tick(), if recovering => self.on_recovery_poll(),
                else => break,
            }
        }
        print::warn("Control loop inputs closed, stopping".to_string());
        self.driver.stop();
    }
}
