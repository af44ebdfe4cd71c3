#![warn(missing_docs)]
//! # Leaderless elevator node
//!
//! Several elevator cars share the hall calls of one building without a master. Each node
//! races its peers for every hall call with a timer whose length is its own cost of serving
//! the call; the first to fire claims it and tells the rest to back off. Cab calls are served
//! locally and survive restarts in a small log file.
//!
//! ## Overview
//! - **Config**: Compile-time parameters and print toggles.
//! - **Init**: Runtime arguments and the initial order state.
//! - **Print**: Colour-coded terminal logging.
//! - **Backup**: The durable cab call log.
//! - **Elevio**: Interface for elevator I/O.
//! - **Network**: The order protocol: frames, sockets, sender and listeners.
//! - **Elevator Logic**: Arbitration, scheduling and the control loop.

/// Global variables
pub mod config;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

/// Durable cab call log
#[allow(missing_docs)]
pub mod backup;

/// Interface for elevator input/output: the elevator server client and its pollers.
pub mod elevio;

/// Order protocol over UDP broadcast.
pub mod network;

/// Elevator control logic: order arbitration, scheduling and the event loop.
#[allow(missing_docs)]
pub mod elevator_logic;
