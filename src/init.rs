//! Startup of a node: runtime arguments and the initial order state.
//!
//! Arguments are given as `key::value`:
//!
//! ```text
//! cargo run -- id::2 server::localhost:15657 log::cab_calls_2.log print_info::false
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context};
use once_cell::sync::Lazy;
use tokio::sync::mpsc;

use crate::backup::CabLog;
use crate::config;
use crate::elevator_logic::orders::Orders;
use crate::elevator_logic::Wake;
use crate::elevio::Floor;
use crate::print;

/// Runtime settings of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Node id `0..=9`. Sender id on the wire and the idle cost offset.
    pub node_id: u8,
    /// Address of the elevator server
    pub elevator_addr: String,
    /// Where the cab calls are persisted
    pub cab_log_path: PathBuf,
    /// `help` was given
    pub help: bool,
}

/// Usage text printed for `help`
pub const HELP: &str = "\
Available arguments:
  id::<0-9>                 node id (required)
  server::<host:port>       elevator server (default localhost:15657)
  log::<path>               cab call log (default cab_calls.log)
  print_table::true/false
  print_err::true/false
  print_warn::true/false
  print_ok::true/false
  print_info::true/false
  print_else::true/false
  debug::true               only error messages
  help";

fn set(toggle: &Lazy<Mutex<bool>>, on: bool) {
    if let Ok(mut flag) = toggle.lock() {
        *flag = on;
    }
}

/// Parses the program arguments, without the program name.
///
/// Print toggles take effect right away. Unknown arguments are warned about and ignored; a
/// missing or out-of-range id is an error.
pub fn parse_args<I, S>(args: I) -> anyhow::Result<Settings>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut node_id: Option<u8> = None;
    let mut elevator_addr = config::DEFAULT_ELEV_ADDR.to_string();
    let mut cab_log_path = PathBuf::from(config::DEFAULT_CAB_LOG);
    let mut help = false;

    for arg in args {
        let arg = arg.as_ref();
        let Some((key, value)) = arg.split_once("::") else {
            if arg.eq_ignore_ascii_case("help") {
                help = true;
            } else {
                print::warn(format!("Ignoring argument {:?}", arg));
            }
            continue;
        };

        let key = key.to_lowercase();
        let is_true = value.eq_ignore_ascii_case("true");
        match key.as_str() {
            "id" => {
                let id: u8 = value
                    .parse()
                    .with_context(|| format!("id {:?} is not a number", value))?;
                if id > config::MAX_NODE_ID {
                    bail!("id {} is out of range 0..={}", id, config::MAX_NODE_ID);
                }
                node_id = Some(id);
            }
            "server" => elevator_addr = value.to_string(),
            "log" => cab_log_path = PathBuf::from(value),
            "print_table" => set(&config::PRINT_TABLE_ON, is_true),
            "print_err" => set(&config::PRINT_ERR_ON, is_true),
            "print_warn" => set(&config::PRINT_WARN_ON, is_true),
            "print_ok" => set(&config::PRINT_OK_ON, is_true),
            "print_info" => set(&config::PRINT_INFO_ON, is_true),
            "print_else" => set(&config::PRINT_ELSE_ON, is_true),
            "debug" if is_true => {
                // Debug: only errors
                set(&config::PRINT_TABLE_ON, false);
                set(&config::PRINT_WARN_ON, false);
                set(&config::PRINT_OK_ON, false);
                set(&config::PRINT_INFO_ON, false);
                set(&config::PRINT_ELSE_ON, false);
            }
            _ => print::warn(format!("Ignoring argument {:?}", arg)),
        }
    }

    if help {
        return Ok(Settings {
            node_id: node_id.unwrap_or(0),
            elevator_addr,
            cab_log_path,
            help,
        });
    }

    let Some(node_id) = node_id else {
        bail!("missing node id, start with id::<0-{}>", config::MAX_NODE_ID);
    };
    Ok(Settings { node_id, elevator_addr, cab_log_path, help })
}

/// Builds the order state of a node standing at `floor`.
///
/// Opens the cab log and imports it, so persisted cab calls are stops before any event is
/// handled.
pub fn initialize_orders(settings: &Settings, floor: Floor, wake_tx: mpsc::Sender<Wake>) -> anyhow::Result<Orders> {
    let cab_log = CabLog::open(&settings.cab_log_path, config::NUM_FLOORS)?;
    let mut orders = Orders::new(settings.node_id, config::NUM_FLOORS, cab_log, wake_tx);
    orders.update_floor(floor);
    let imported = orders.import_cab_log();
    if imported > 0 {
        print::info(format!("Restored {} cab call(s) from {}", imported, settings.cab_log_path.display()));
    }
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevio::Direction;

    #[test]
    fn id_is_required() {
        assert!(parse_args(["server::localhost:1"]).is_err());
    }

    #[test]
    fn id_must_fit_in_one_digit() {
        assert!(parse_args(["id::10"]).is_err());
        assert!(parse_args(["id::-1"]).is_err());
        assert!(parse_args(["id::two"]).is_err());
        assert_eq!(parse_args(["id::9"]).unwrap().node_id, 9);
    }

    #[test]
    fn defaults_and_overrides() {
        let s = parse_args(["id::3"]).unwrap();
        assert_eq!(s.elevator_addr, config::DEFAULT_ELEV_ADDR);
        assert_eq!(s.cab_log_path, PathBuf::from(config::DEFAULT_CAB_LOG));

        let s = parse_args(["server::10.0.0.7:15657", "id::1", "log::/tmp/x.log", "bogus"]).unwrap();
        assert_eq!(s.node_id, 1);
        assert_eq!(s.elevator_addr, "10.0.0.7:15657");
        assert_eq!(s.cab_log_path, PathBuf::from("/tmp/x.log"));
        assert!(!s.help);
    }

    #[test]
    fn help_does_not_need_an_id() {
        assert!(parse_args(["help"]).unwrap().help);
    }

    #[tokio::test]
    async fn initialize_orders_imports_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cab.log");
        std::fs::write(&path, "0\n2\n").unwrap();
        let settings = Settings {
            node_id: 5,
            elevator_addr: String::new(),
            cab_log_path: path,
            help: false,
        };
        let (tx, _rx) = mpsc::channel(1);

        let orders = initialize_orders(&settings, 1, tx).unwrap();
        assert_eq!(orders.node().node_id, 5);
        assert_eq!(orders.node().current_floor, 1);
        assert!(orders.stop_flag(0, Direction::None));
        assert!(orders.stop_flag(2, Direction::None));
    }
}
