//! Event handlers of the control loop.
//!
//! None of these await. Motor commands are only changed while the car is standing still, or at
//! the moment it reaches a floor; a request that arrives between floors is picked up at the
//! next floor.

use tokio::time::sleep;

use super::orders::NewOrderOutcome;
use super::{lights, LocalElevator, Wake};
use crate::config;
use crate::elevio::{CallButton, Direction, Driver, Floor};
use crate::network::{OrderMessage, OrderType};
use crate::print;

/// Finds the floor before anything else starts.
///
/// If the sensor does not see a floor, drives down and polls until it does.
pub async fn on_init<D: Driver>(driver: &D) -> Floor {
    if let Some(floor) = driver.get_floor() {
        driver.set_floor_indicator(floor);
        return floor;
    }

    print::warn("Starting between floors, moving down to find one".to_string());
    driver.run(Direction::Down);
    loop {
        sleep(config::RECOVERY_POLL).await;
        if let Some(floor) = driver.get_floor() {
            driver.stop();
            driver.set_floor_indicator(floor);
            print::ok(format!("Found floor {}", floor));
            return floor;
        }
    }
}

impl<D: Driver> LocalElevator<D> {
    /// Queues a message for the UDP sender
    fn announce(&self, kind: OrderType, floor: Floor, direction: Direction) {
        let msg = OrderMessage::new(kind, self.orders.node().node_id, floor, direction);
        if let Err(e) = self.outbound_tx.try_send(msg) {
            print::err(format!("Could not queue {}: {}", msg, e));
        }
    }

    fn drive(&mut self, direction: Direction) {
        self.driver.run(direction);
        self.moving = true;
        self.travel_timer.timer_start();
    }

    fn stop_motor(&mut self) {
        self.driver.stop();
        self.moving = false;
        self.travel_timer.timer_stop();
    }

    /// Sets every lamp from the order state
    pub(super) fn sync_lights(&self) {
        let top = self.orders.top_floor();
        for floor in 0..self.orders.num_floors() {
            for button in Direction::ALL {
                if (floor == 0 && button == Direction::Down) || (floor == top && button == Direction::Up) {
                    continue;
                }
                let key = self.orders.normalize(floor, button);
                let on = self.orders.stop_flag(floor, key) || self.orders.is_pending(floor, key);
                self.driver.button_lamp(on, floor, button);
            }
        }
        lights::clear_door_open_light(&self.driver);
        lights::clear_stop_button_light(&self.driver);
    }

    /// Picks a new direction if the car is free to move.
    ///
    /// Standing still with a request at the current floor serves it in place.
    pub(super) fn resume(&mut self) {
        if self.door_open || self.halted || self.moving || self.recovering {
            return;
        }
        match self.orders.next_direction() {
            Direction::None => {
                if self.orders.has_request_at(self.orders.node().current_floor) {
                    self.serve_floor();
                }
            }
            dir => self.drive(dir),
        }
    }

    /// Opens the door, completes the orders at the current floor and starts the door timer
    fn serve_floor(&mut self) {
        let floor = self.orders.node().current_floor;
        self.door_open = true;
        lights::set_door_open_light(&self.driver);
        self.complete_here(floor);
        print::stop_table(&self.orders);

        let wake_tx = self.wake_tx.clone();
        tokio::spawn(async move {
            sleep(config::DOOR_OPEN_TIME).await;
            let _ = wake_tx.send(Wake::DoorClosed).await;
        });
    }

    /// Travelling: completes the hall order in the travel direction. Idle: both hall orders.
    /// The cab call is always completed. Hall completions are broadcast.
    fn complete_here(&mut self, floor: Floor) {
        let hall: &[Direction] = match self.orders.node().current_direction {
            Direction::Up => &[Direction::Up],
            Direction::Down => &[Direction::Down],
            Direction::None => &[Direction::Up, Direction::Down],
        };
        if self.orders.clear_order(floor, Direction::None) {
            lights::set_order_light(&self.driver, floor, Direction::None, false);
        }
        for dir in hall {
            let key = self.orders.normalize(floor, *dir);
            if self.orders.clear_order(floor, key) {
                lights::set_order_light(&self.driver, floor, key, false);
                self.announce(OrderType::CompletedOrder, floor, key);
            }
        }
    }

    pub(super) fn on_floor_arrival(&mut self, floor: Floor) {
        if floor >= self.orders.num_floors() {
            print::cosmic_err(format!("on_floor_arrival({})", floor));
            return;
        }
        self.orders.update_floor(floor);
        self.driver.set_floor_indicator(floor);
        self.recovering = false;

        // A sensor edge while standing still carries no decision.
        if !self.moving {
            return;
        }
        self.travel_timer.timer_start();

        if self.orders.should_stop(floor) {
            self.stop_motor();
            self.serve_floor();
            return;
        }
        match self.orders.next_direction() {
            Direction::None => {
                self.stop_motor();
                if self.orders.has_request_at(floor) {
                    self.serve_floor();
                }
            }
            dir => self.drive(dir),
        }
    }

    pub(super) fn on_button(&mut self, button: CallButton) {
        let CallButton { floor, direction } = button;
        print::info(format!("Button pressed: floor {} ({})", floor, direction));

        let key = self.orders.normalize(floor, direction);
        match self.orders.new_order(floor, direction) {
            NewOrderOutcome::Stop => {
                lights::set_order_light(&self.driver, floor, key, true);
                print::stop_table(&self.orders);
            }
            NewOrderOutcome::Pending => {
                lights::set_order_light(&self.driver, floor, key, true);
                self.announce(OrderType::NewOrder, floor, key);
            }
            // Re-announced in case the first frame was lost
            NewOrderOutcome::AlreadyPending => self.announce(OrderType::NewOrder, floor, key),
            NewOrderOutcome::AlreadyClaimed => self.announce(OrderType::AcceptedOrder, floor, key),
            NewOrderOutcome::Rejected => return,
        }
        self.resume();
    }

    pub(super) fn on_network_order(&mut self, msg: OrderMessage) {
        if msg.sender_id == self.orders.node().node_id {
            return;
        }
        print::net(format!("Received {}", msg));

        let OrderMessage { kind, floor, direction, .. } = msg;
        let key = self.orders.normalize(floor, direction);
        match kind {
            OrderType::NewOrder => match self.orders.new_order(floor, direction) {
                NewOrderOutcome::Pending => lights::set_order_light(&self.driver, floor, key, true),
                NewOrderOutcome::AlreadyClaimed => self.announce(OrderType::AcceptedOrder, floor, key),
                _ => {}
            },
            OrderType::AcceptedOrder => {
                self.orders.order_accepted_remotely(floor, direction);
            }
            OrderType::CompletedOrder => {
                self.orders.clear_order(floor, direction);
                lights::set_order_light(&self.driver, floor, key, false);
                lights::set_order_light(&self.driver, floor, Direction::None, false);
                print::stop_table(&self.orders);
            }
            OrderType::Invalid => print::cosmic_err(format!("on_network_order({})", msg)),
        }
    }

    pub(super) fn on_wake(&mut self, wake: Wake) {
        match wake {
            Wake::ClaimExpired { floor, direction, generation } => {
                if self.orders.on_claim_expired(floor, direction, generation) {
                    self.announce(OrderType::AcceptedOrder, floor, direction);
                    print::stop_table(&self.orders);
                    self.resume();
                }
            }
            Wake::DoorClosed => {
                self.door_open = false;
                lights::clear_door_open_light(&self.driver);
                self.resume();
            }
        }
    }

    /// Press halts the car where it is. Release resumes, or recovers if the car is between floors.
    pub(super) fn on_stop_button(&mut self, pressed: bool) {
        if pressed {
            print::warn("Stop button pressed".to_string());
            self.halted = true;
            self.recovering = false;
            self.stop_motor();
            lights::set_stop_button_light(&self.driver);
            return;
        }

        print::info("Stop button released".to_string());
        self.halted = false;
        lights::clear_stop_button_light(&self.driver);
        if self.driver.get_floor().is_none() {
            self.start_recovery();
        } else {
            self.resume();
        }
    }

    fn start_recovery(&mut self) {
        self.travel_timer.timer_stop();
        self.recovering = true;
        self.moving = true;
        self.driver.run(Direction::Down);
    }

    pub(super) fn on_travel_timeout(&mut self) {
        print::err(format!(
            "No floor reached within {:?}, moving down to find one",
            config::TRAVEL_TIMEOUT
        ));
        self.start_recovery();
    }

    pub(super) fn on_recovery_poll(&mut self) {
        if let Some(floor) = self.driver.get_floor() {
            print::ok(format!("Recovered at floor {}", floor));
            self.on_floor_arrival(floor);
        }
    }
}
