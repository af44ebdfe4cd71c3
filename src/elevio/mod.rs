//! ## Elevator I/O module for the local elevator
//!
//! The TCP client for the elevator server lives in [`elev`], the edge-triggered
//! listeners in [`poll`].
//!
//! ## Overview
//! - `Floor` / `Direction`: the shared vocabulary of the node.
//! - `CallButton`: a button press, floor and button direction (`None` for cab buttons).
//! - `Driver`: the narrow hardware boundary the control loop commands through.
//!
//! Directions are numbered like the buttons on the elevator server, so
//! `Direction as u8` is the button type (`0` hall up, `1` hall down, `2` cab).

pub mod elev;
pub mod poll;

use std::fmt;

/// A floor, `0..config::NUM_FLOORS`
pub type Floor = u8;

/// Direction of travel, or the button type of a call.
///
/// `None` means idle when used as a travel direction, and a cab call when used as a call type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Up, or a hall-up call
    Up = 0,
    /// Down, or a hall-down call
    Down = 1,
    /// Idle, or a cab call
    None = 2,
}

impl Direction {
    /// All three directions, in table order
    pub const ALL: [Direction; 3] = [Direction::Up, Direction::Down, Direction::None];

    /// Index into per-direction tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction from the signed offset `to - from`
    pub fn towards(from: Floor, to: Floor) -> Direction {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::None,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            2 => Ok(Direction::None),
            other => Err(other),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::None => "none",
        };
        f.write_str(s)
    }
}

/// Represents a button press on the elevator panel or a hall panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallButton {
    /// The floor where the button is.
    pub floor: Floor,

    /// `Up`/`Down` for hall buttons, `None` for cab buttons.
    pub direction: Direction,
}

/// The hardware boundary of a node.
///
/// Implemented by [`elev::Elevator`] for the elevator server, and by recording mocks in tests.
/// The driver is shared between the control loop and the door task, hence `Clone + Send + Sync`.
pub trait Driver: Clone + Send + Sync + 'static {
    /// Number of floors served
    fn num_floors(&self) -> u8;

    /// Current floor sensor reading, `None` between floors
    fn get_floor(&self) -> Option<Floor>;

    /// Lights the floor indicator for `floor`
    fn set_floor_indicator(&self, floor: Floor);

    /// Starts the motor. `Direction::None` stops it.
    fn run(&self, direction: Direction);

    /// Stops the motor
    fn stop(&self);

    /// Opens the door (door lamp on)
    fn open_door(&self);

    /// Closes the door (door lamp off)
    fn close_door(&self);

    /// Sets a button lamp. `direction` is the button type.
    fn button_lamp(&self, on: bool, floor: Floor, direction: Direction);

    /// Sets the stop button lamp
    fn stop_lamp(&self, on: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn towards_uses_the_sign_of_the_offset() {
        assert_eq!(Direction::towards(1, 3), Direction::Up);
        assert_eq!(Direction::towards(3, 0), Direction::Down);
        assert_eq!(Direction::towards(2, 2), Direction::None);
    }

    #[test]
    fn button_numbers_match_direction() {
        for dir in Direction::ALL {
            assert_eq!(Direction::try_from(dir as u8), Ok(dir));
        }
        assert_eq!(Direction::try_from(7), Err(7));
    }
}
