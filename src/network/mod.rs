//! ## Network module
//!
//! Nodes announce, accept and complete hall orders by broadcasting small fixed frames.
//! There is no master and no membership: every node hears every frame (its own included)
//! and reacts to it locally.
//!
//! ## Sub-modules
//! - [frame]: the 8-byte checksummed frame codec
//! - [udp_broadcast]: sockets, the sender task and the listener tasks
//!
//! ## Message kinds
//! - `NewOrder`: a hall button was pressed somewhere. Every node starts its claim timer.
//! - `AcceptedOrder`: a node claimed the order. Everyone else backs off.
//! - `CompletedOrder`: a node served the order. Everyone drops it.

pub mod frame;
pub mod udp_broadcast;

use crate::elevio::{Direction, Floor};
use std::fmt;

/// Kind of an order message.
///
/// `Invalid` is what an unknown type tag maps to; it never leaves the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    /// A hall call was registered
    NewOrder,
    /// The sender claimed the order
    AcceptedOrder,
    /// The sender served the order
    CompletedOrder,
    /// Unknown or corrupt type
    Invalid,
}

impl OrderType {
    /// The two-character tag on the wire
    pub fn tag(self) -> [u8; 2] {
        match self {
            OrderType::NewOrder => *b"NW",
            OrderType::AcceptedOrder => *b"AC",
            OrderType::CompletedOrder => *b"CO",
            OrderType::Invalid => *b"??",
        }
    }

    /// Maps a wire tag back to a type. Unknown tags become `Invalid`.
    pub fn from_tag(tag: [u8; 2]) -> OrderType {
        match &tag {
            b"NW" => OrderType::NewOrder,
            b"AC" => OrderType::AcceptedOrder,
            b"CO" => OrderType::CompletedOrder,
            _ => OrderType::Invalid,
        }
    }
}

/// One protocol message. `direction` is `Up` or `Down`; cab calls are never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderMessage {
    /// What happened
    pub kind: OrderType,
    /// Id of the sending node, `0..=9`
    pub sender_id: u8,
    /// Floor of the hall call
    pub floor: Floor,
    /// Direction of the hall call
    pub direction: Direction,
}

impl OrderMessage {
    /// Creates a message from this node
    pub fn new(kind: OrderType, sender_id: u8, floor: Floor, direction: Direction) -> Self {
        Self { kind, sender_id, floor, direction }
    }
}

impl fmt::Display for OrderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} from node {} (floor {}, {})",
            self.kind, self.sender_id, self.floor, self.direction
        )
    }
}
