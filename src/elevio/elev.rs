//! TCP client for the elevator server (hardware or simulator).
//!
//! Every command is a 4-byte message; reads answer with 4 bytes.
//!
//! | cmd | meaning            | bytes 1..3               | reply             |
//! |-----|--------------------|--------------------------|-------------------|
//! | 1   | motor direction    | dirn                     |                   |
//! | 2   | button lamp        | button, floor, on        |                   |
//! | 3   | floor indicator    | floor                    |                   |
//! | 4   | door lamp          | on                       |                   |
//! | 5   | stop lamp          | on                       |                   |
//! | 6   | read button        | button, floor            | `[6, pressed, ..]`|
//! | 7   | read floor sensor  |                          | `[7, at, floor, ..]` |
//! | 8   | read stop button   |                          | `[8, pressed, ..]`|

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

use anyhow::Context;

use super::{Direction, Driver, Floor};
use crate::print;

/// Motor command for moving down
pub const DIRN_DOWN: u8 = u8::MAX;
/// Motor command for stopping
pub const DIRN_STOP: u8 = 0;
/// Motor command for moving up
pub const DIRN_UP: u8 = 1;

/// Handle to the elevator server. Cheap to clone, all clones share one connection.
#[derive(Clone, Debug)]
pub struct Elevator {
    socket: Arc<Mutex<TcpStream>>,
    /// Number of floors served
    pub num_floors: u8,
}

impl Elevator {
    /// Connects to the elevator server at `addr`
    pub fn init(addr: &str, num_floors: u8) -> anyhow::Result<Elevator> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("Could not connect to elevator server at {}", addr))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            socket: Arc::new(Mutex::new(stream)),
            num_floors,
        })
    }

    fn write(&self, buf: [u8; 4]) -> io::Result<()> {
        let mut sock = self
            .socket
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "elevator socket poisoned"))?;
        sock.write_all(&buf)
    }

    fn query(&self, buf: [u8; 4]) -> io::Result<[u8; 4]> {
        let mut sock = self
            .socket
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "elevator socket poisoned"))?;
        sock.write_all(&buf)?;
        let mut reply = [0u8; 4];
        sock.read_exact(&mut reply)?;
        Ok(reply)
    }

    fn command(&self, buf: [u8; 4]) {
        if let Err(e) = self.write(buf) {
            print::err(format!("Elevator command {:?} failed: {}", buf, e));
        }
    }

    /// Sets the motor direction, one of [DIRN_UP], [DIRN_DOWN], [DIRN_STOP]
    pub fn motor_direction(&self, dirn: u8) {
        self.command([1, dirn, 0, 0]);
    }

    /// Sets a call button lamp. `call` is the button type.
    pub fn call_button_light(&self, floor: u8, call: u8, on: bool) {
        self.command([2, call, floor, on as u8]);
    }

    /// Sets the floor indicator
    pub fn floor_indicator(&self, floor: u8) {
        self.command([3, floor, 0, 0]);
    }

    /// Sets the door open lamp
    pub fn door_light(&self, on: bool) {
        self.command([4, on as u8, 0, 0]);
    }

    /// Sets the stop button lamp
    pub fn stop_button_light(&self, on: bool) {
        self.command([5, on as u8, 0, 0]);
    }

    /// Reads a call button
    pub fn call_button(&self, floor: u8, call: u8) -> io::Result<bool> {
        let reply = self.query([6, call, floor, 0])?;
        Ok(reply[1] != 0)
    }

    /// Reads the floor sensor
    pub fn floor_sensor(&self) -> io::Result<Option<u8>> {
        let reply = self.query([7, 0, 0, 0])?;
        Ok(if reply[1] != 0 { Some(reply[2]) } else { None })
    }

    /// Reads the stop button
    pub fn stop_button(&self) -> io::Result<bool> {
        let reply = self.query([8, 0, 0, 0])?;
        Ok(reply[1] != 0)
    }
}

impl Driver for Elevator {
    fn num_floors(&self) -> u8 {
        self.num_floors
    }

    fn get_floor(&self) -> Option<Floor> {
        match self.floor_sensor() {
            Ok(floor) => floor,
            Err(e) => {
                print::err(format!("Floor sensor read failed: {}", e));
                None
            }
        }
    }

    fn set_floor_indicator(&self, floor: Floor) {
        self.floor_indicator(floor);
    }

    fn run(&self, direction: Direction) {
        match direction {
            Direction::Up => {
                if self.get_floor() == Some(self.num_floors - 1) {
                    print::err("Trying to go up from the top floor, ignored".to_string());
                    return;
                }
                self.motor_direction(DIRN_UP);
            }
            Direction::Down => {
                if self.get_floor() == Some(0) {
                    print::err("Trying to go down from the bottom floor, ignored".to_string());
                    return;
                }
                self.motor_direction(DIRN_DOWN);
            }
            Direction::None => self.motor_direction(DIRN_STOP),
        }
    }

    fn stop(&self) {
        self.motor_direction(DIRN_STOP);
    }

    fn open_door(&self) {
        self.door_light(true);
    }

    fn close_door(&self) {
        self.door_light(false);
    }

    fn button_lamp(&self, on: bool, floor: Floor, direction: Direction) {
        self.call_button_light(floor, direction as u8, on);
    }

    fn stop_lamp(&self, on: bool) {
        self.stop_button_light(on);
    }
}
