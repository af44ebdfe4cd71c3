//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static program parameters used throughout the node.
//! Runtime arguments (node id, server address, log path) are parsed in [crate::init].

use std::sync::Mutex;
use std::time::Duration;
use once_cell::sync::Lazy;

//
// ──────────────────────────────────────────────────────────────
//   1. NETWORK SETTINGS
// ──────────────────────────────────────────────────────────────
//

/// Port the local unicast socket listens on. All frames are sent from this socket.
pub const LOCAL_PORT: u16 = 13376;

/// Port every node listens for broadcast frames on
pub const BROADCAST_PORT: u16 = 13377;

/// UDP broadcast listen address (bind address)
pub static BC_LISTEN_ADDR: &str = "0.0.0.0";

/// Broadcast address frames are sent to
pub static BC_ADDR: &str = "255.255.255.255";

/// Size of UDP receive buffer in bytes. Anything that is not exactly one frame is dropped.
pub const UDP_BUFFER: usize = 256;

/// Capacity of the tokio mpsc channels between tasks
pub const CHANNEL_CAPACITY: usize = 100;

//
// ──────────────────────────────────────────────────────────────
//   2. SYSTEM & ELEVATOR PARAMETERS
// ──────────────────────────────────────────────────────────────
//

/// Number of floors served by every node
pub const NUM_FLOORS: u8 = 4;

/// Highest valid node id. Ids are sent as a single digit on the wire.
pub const MAX_NODE_ID: u8 = 9;

/// Default address of the elevator server / simulator
pub static DEFAULT_ELEV_ADDR: &str = "localhost:15657";

/// Default file holding outstanding cab calls
pub static DEFAULT_CAB_LOG: &str = "cab_calls.log";

/// Duration between elevator hardware polls
pub const ELEV_POLL: Duration = Duration::from_millis(25);

//
// ──────────────────────────────────────────────────────────────
//   3. TIMING & COST
// ──────────────────────────────────────────────────────────────
//

/// One unit of the claim cost function
pub const COST_UNIT: Duration = Duration::from_millis(100);

/// Penalty (in cost units) for an order that is not ahead of the current travel
pub const NOT_AHEAD_PENALTY: u32 = 15;

/// Penalty (in cost units) for an order in another direction than the current travel
pub const WRONG_DIRECTION_PENALTY: u32 = 10;

/// Per-node offset. Node `n` adds `n * ID_OFFSET_UNIT` to every claim deadline.
pub const ID_OFFSET_UNIT: Duration = Duration::from_millis(250);

/// Extra delay added to a pending order when a peer has accepted it
pub const BACKOFF_DELAY: Duration = Duration::from_secs(20);

/// How long the door stays open at a stop
pub const DOOR_OPEN_TIME: Duration = Duration::from_secs(3);

/// Max travel time between two floor sensors before the node assumes a sensor fault
pub const TRAVEL_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the sensor is polled directly while recovering from an unknown floor
pub const RECOVERY_POLL: Duration = Duration::from_millis(50);

//
// ──────────────────────────────────────────────────────────────
//   4. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable printing of the stop table
pub static PRINT_TABLE_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable miscellaneous debug prints
pub static PRINT_ELSE_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));
