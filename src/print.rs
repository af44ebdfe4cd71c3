//! ## Printing Module
//!
//! This module is only here to make logging in the terminal easier to read.
//! It prints in appropriate colors depending on the situation, and every level
//! can be switched off at runtime (see [crate::init::parse_args]).
//! It also provides a box-format for the stop table of the local node.
use crate::config;
use crate::elevator_logic::orders::Orders;
use crate::elevio::Direction;
use ansi_term::Colour::{self, Green, Red, Yellow, Purple, White};
use once_cell::sync::Lazy;
use std::sync::Mutex;
use unicode_width::UnicodeWidthStr;

/// Reads a print toggle. A poisoned toggle counts as enabled.
fn enabled(toggle: &Lazy<Mutex<bool>>) -> bool {
    toggle.lock().map(|on| *on).unwrap_or(true)
}

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
///
/// ## Example
/// ```
/// use elevatornode::print;
///
/// print::err("Something went wrong!".to_string());
/// ```
pub fn err(msg: String) {
    if enabled(&config::PRINT_ERR_ON) {
        println!("{}{}\n", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    if enabled(&config::PRINT_WARN_ON) {
        println!("{}{}\n", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    if enabled(&config::PRINT_OK_ON) {
        println!("{}{}\n", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if enabled(&config::PRINT_INFO_ON) {
        println!("{}{}\n", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Prints a network-specific message in pink to the terminal.
///
/// Used for every frame that is sent or received, so the protocol can be followed live.
///
/// ## Terminal output
/// - "\[NET\]:     {}", msg
pub fn net(msg: String) {
    let pink = Colour::RGB(255, 51, 255);
    if enabled(&config::PRINT_ELSE_ON) {
        println!("{}{}\n", pink.paint("[NET]:     "), pink.paint(msg));
    }
}

/// Prints an error message with a cosmic twist, displaying the message in a rainbow of colors.
///
/// Used when something happens that should be impossible, such as a wake event for a
/// pending order the node never created.
///
/// ## Terminal output
/// - "[ERROR]: Cosmic rays flipped a bit! IN: {fun}"
pub fn cosmic_err(fun: String) {
    if !enabled(&config::PRINT_ERR_ON) {
        return;
    }
    print!("{}", Colour::Red.paint("[ERROR]: "));

    let colors = [
        Colour::Red,
        Colour::Yellow,
        Colour::Green,
        Colour::Cyan,
        Colour::Blue,
        Colour::Purple,
    ];

    let message = format!("Cosmic rays flipped a bit! IN: {}", fun);
    for (i, c) in message.chars().enumerate() {
        let color = colors[i % colors.len()];
        print!("{}", color.paint(c.to_string()));
    }

    println!();
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that take more than one column (e.g. arrows and dots),
/// so the table columns stay aligned.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

/// Green dot for a set flag, red for a cleared one, blank where no button exists.
fn flag_cell(exists: bool, set: bool) -> String {
    if !exists {
        return pad_text(" ", 4);
    }
    if set {
        Green.paint(pad_text("●", 4)).to_string()
    } else {
        Red.paint(pad_text("○", 4)).to_string()
    }
}

/// Logs the current stop table of the local node in a box table.
///
/// Shows, per floor (top floor first), the three stop flags (up, down, cab), whether a hall
/// order is pending in either direction, and the node's position and direction.
///
/// If `config::PRINT_TABLE_ON` is false, the function exits early.
pub fn stop_table(orders: &Orders) {
    if !enabled(&config::PRINT_TABLE_ON) {
        return;
    }
    let node = orders.node();
    let top = orders.num_floors() - 1;

    println!("{}", Purple.bold().paint("┌──────────────────────────────────────────┐"));
    println!(
        "{}",
        Purple.bold().paint(format!(
            "│ NODE {}  floor {}  dir {}│",
            node.node_id,
            node.current_floor,
            pad_text(&format!("{:?}", node.current_direction), 20)
        ))
    );
    println!("├────────┬──────┬──────┬──────┬────────────┤");
    println!("{}", White.bold().paint("│ Floor  │ Up   │ Down │ Cab  │ Pending    │"));
    println!("├────────┼──────┼──────┼──────┼────────────┤");

    for floor in (0..=top).rev() {
        // Terminal floors keep their flag under the normalized direction, see `orders`.
        let up = flag_cell(floor != 0, orders.stop_flag(floor, Direction::Up));
        let down = flag_cell(floor != top, orders.stop_flag(floor, Direction::Down));
        let cab = flag_cell(true, orders.stop_flag(floor, Direction::None));

        let mut pending = String::new();
        if orders.is_pending(floor, Direction::Up) {
            pending.push_str("↑ ");
        }
        if orders.is_pending(floor, Direction::Down) {
            pending.push_str("↓ ");
        }

        println!(
            "│ {} │ {} │ {} │ {} │ {} │",
            pad_text(&floor.to_string(), 6),
            up,
            down,
            cab,
            Yellow.paint(pad_text(&pending, 10))
        );
    }
    println!("└────────┴──────┴──────┴──────┴────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_text_counts_display_width() {
        assert_eq!(pad_text("ab", 4), "ab  ");
        assert_eq!(pad_text("↑ ", 4).chars().count(), 4);
        assert_eq!(pad_text("too long", 3), "too long");
    }
}
