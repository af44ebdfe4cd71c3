//! Edge-triggered listeners for the elevator server.
//!
//! Each listener runs on its own OS thread, polls one kind of input every `period`,
//! and sends on its crossbeam channel only when the reading changes. Call buttons are
//! only reported on press. A listener returns when its receiver is gone.

use crossbeam_channel as cbc;
use std::thread;
use std::time;

use super::elev::Elevator;
use super::{CallButton, Direction};
use crate::print;

/// Reports every call button press
pub fn call_buttons(elev: Elevator, ch: cbc::Sender<CallButton>, period: time::Duration) {
    let mut prev = vec![[false; 3]; elev.num_floors.into()];
    loop {
        for floor in 0..elev.num_floors {
            for direction in Direction::ALL {
                let pressed = match elev.call_button(floor, direction as u8) {
                    Ok(v) => v,
                    Err(e) => {
                        print::err(format!("Call button read failed: {}", e));
                        continue;
                    }
                };
                let was = &mut prev[floor as usize][direction.index()];
                if pressed && !*was && ch.send(CallButton { floor, direction }).is_err() {
                    return;
                }
                *was = pressed;
            }
        }
        thread::sleep(period)
    }
}

/// Reports every new floor the sensor sees. Between floors nothing is sent.
pub fn floor_sensor(elev: Elevator, ch: cbc::Sender<u8>, period: time::Duration) {
    let mut prev = u8::MAX;
    loop {
        match elev.floor_sensor() {
            Ok(Some(f)) if f != prev => {
                if ch.send(f).is_err() {
                    return;
                }
                prev = f;
            }
            Ok(_) => {}
            Err(e) => print::err(format!("Floor sensor read failed: {}", e)),
        }
        thread::sleep(period)
    }
}

/// Reports both press (`true`) and release (`false`) of the stop button
pub fn stop_button(elev: Elevator, ch: cbc::Sender<bool>, period: time::Duration) {
    let mut prev = false;
    loop {
        match elev.stop_button() {
            Ok(v) if v != prev => {
                if ch.send(v).is_err() {
                    return;
                }
                prev = v;
            }
            Ok(_) => {}
            Err(e) => print::err(format!("Stop button read failed: {}", e)),
        }
        thread::sleep(period)
    }
}
