//! # Local Elevator hardware
//!
//! This module connects to the elevator server and turns its inputs into the event streams
//! the control loop selects on:
//! - Connecting to the elevator server (`connect`)
//! - Starting the edge-triggered pollers (`start_listeners`)
//! - Forwarding their crossbeam channels onto tokio channels (`read_from_local_elevator`)
//!
//! ## Overview
//! The pollers in [crate::elevio::poll] block, so each gets its own OS thread and reports on a
//! crossbeam channel. One blocking bridge task waits on all of them with `cbc::select!` and
//! forwards every event onto a tokio mpsc channel.

use crate::config;
use crate::elevio::{self, elev as e, CallButton, Floor};
use crate::print;

use anyhow::Context;
use crossbeam_channel as cbc;
use std::thread;
use tokio::sync::mpsc;

struct LocalElevTxs {
    call_button: cbc::Sender<CallButton>,
    floor_sensor: cbc::Sender<u8>,
    stop_button: cbc::Sender<bool>,
}

struct LocalElevRxs {
    call_button: cbc::Receiver<CallButton>,
    floor_sensor: cbc::Receiver<u8>,
    stop_button: cbc::Receiver<bool>,
}

struct LocalElevChannels {
    pub rxs: LocalElevRxs,
    pub txs: LocalElevTxs,
}

impl LocalElevChannels {
    pub fn new() -> Self {
        let (call_button_tx, call_button_rx) = cbc::unbounded::<CallButton>();
        let (floor_sensor_tx, floor_sensor_rx) = cbc::unbounded::<u8>();
        let (stop_button_tx, stop_button_rx) = cbc::unbounded::<bool>();

        LocalElevChannels {
            rxs: LocalElevRxs {
                call_button: call_button_rx,
                floor_sensor: floor_sensor_rx,
                stop_button: stop_button_rx,
            },
            txs: LocalElevTxs {
                call_button: call_button_tx,
                floor_sensor: floor_sensor_tx,
                stop_button: stop_button_tx,
            },
        }
    }
}

/// Tokio ends of the hardware event streams
pub struct HardwareRxs {
    pub floor_rx: mpsc::Receiver<Floor>,
    pub button_rx: mpsc::Receiver<CallButton>,
    pub stop_rx: mpsc::Receiver<bool>,
}

struct HardwareTxs {
    floor_tx: mpsc::Sender<Floor>,
    button_tx: mpsc::Sender<CallButton>,
    stop_tx: mpsc::Sender<bool>,
}

/// Connects to the elevator server at `addr`
pub fn connect(addr: &str) -> anyhow::Result<e::Elevator> {
    let elevator = e::Elevator::init(addr, config::NUM_FLOORS)
        .with_context(|| format!("Elevator server at {} is not reachable", addr))?;
    print::ok(format!("Connected to elevator server at {}", addr));
    Ok(elevator)
}

/// Starts polling the elevator
///
/// ## Parameters
/// `elevator`: the connected elevator
///
/// ## Behavior
/// - Spawns one OS thread per poller: call buttons, floor sensor and stop button
/// - Spawns a blocking task forwarding all three onto tokio channels
///
/// ## Note
/// Must be called from within a tokio runtime. Start this only after the floor is known and
/// the cab log has been imported, so no event is handled against an incomplete state.
pub fn start_listeners(elevator: &e::Elevator) -> HardwareRxs {
    let local_elev_channels = LocalElevChannels::new();
    let LocalElevChannels { rxs, txs } = local_elev_channels;

    {
        let elevator = elevator.clone();
        thread::spawn(move || elevio::poll::call_buttons(elevator, txs.call_button, config::ELEV_POLL));
    }
    {
        let elevator = elevator.clone();
        thread::spawn(move || elevio::poll::floor_sensor(elevator, txs.floor_sensor, config::ELEV_POLL));
    }
    {
        let elevator = elevator.clone();
        thread::spawn(move || elevio::poll::stop_button(elevator, txs.stop_button, config::ELEV_POLL));
    }

    let (floor_tx, floor_rx) = mpsc::channel(config::CHANNEL_CAPACITY);
    let (button_tx, button_rx) = mpsc::channel(config::CHANNEL_CAPACITY);
    let (stop_tx, stop_rx) = mpsc::channel(config::CHANNEL_CAPACITY);
    let txs = HardwareTxs { floor_tx, button_tx, stop_tx };

    tokio::task::spawn_blocking(move || read_from_local_elevator(rxs, txs));

    HardwareRxs { floor_rx, button_rx, stop_rx }
}

/// Forwards hardware events until either side hangs up
fn read_from_local_elevator(rxs: LocalElevRxs, txs: HardwareTxs) {
    loop {
        let forwarded = cbc::select! {
            recv(rxs.call_button) -> msg => match msg {
                Ok(button) => txs.button_tx.blocking_send(button).is_ok(),
                Err(_) => false,
            },
            recv(rxs.floor_sensor) -> msg => match msg {
                Ok(floor) => txs.floor_tx.blocking_send(floor).is_ok(),
                Err(_) => false,
            },
            recv(rxs.stop_button) -> msg => match msg {
                Ok(pressed) => txs.stop_tx.blocking_send(pressed).is_ok(),
                Err(_) => false,
            },
        };
        if !forwarded {
            print::err("Hardware event stream closed".to_string());
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevio::Direction;

    #[tokio::test]
    async fn bridge_forwards_every_kind_of_event() {
        let LocalElevChannels { rxs, txs: cb } = LocalElevChannels::new();
        let (floor_tx, mut floor_rx) = mpsc::channel(4);
        let (button_tx, mut button_rx) = mpsc::channel(4);
        let (stop_tx, mut stop_rx) = mpsc::channel(4);
        let bridge = tokio::task::spawn_blocking(move || {
            read_from_local_elevator(rxs, HardwareTxs { floor_tx, button_tx, stop_tx })
        });

        let press = CallButton { floor: 1, direction: Direction::Down };
        cb.call_button.send(press).unwrap();
        cb.floor_sensor.send(2).unwrap();
        cb.stop_button.send(true).unwrap();

        assert_eq!(button_rx.recv().await, Some(press));
        assert_eq!(floor_rx.recv().await, Some(2));
        assert_eq!(stop_rx.recv().await, Some(true));

        drop(cb);
        bridge.await.unwrap();
    }
}
