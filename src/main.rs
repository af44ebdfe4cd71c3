use tokio::sync::mpsc;

use elevatornode::elevator_logic::{self, fsm, self_elevator, LocalElevator};
use elevatornode::elevio::Driver;
use elevatornode::network::udp_broadcast;
use elevatornode::{config, init, print};

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                print::warn(format!("SIGTERM handler not installed: {}", e));
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() {
    let settings = match init::parse_args(std::env::args().skip(1)) {
        Ok(settings) => settings,
        Err(e) => {
            print::err(format!("{:#}", e));
            println!("{}", init::HELP);
            std::process::exit(1);
        }
    };
    if settings.help {
        println!("{}", init::HELP);
        return;
    }
    print::info(format!("Starting node {}", settings.node_id));

    /* START ----------- Hardware ---------------------- */
    let elevator = match self_elevator::connect(&settings.elevator_addr) {
        Ok(elevator) => elevator,
        Err(e) => {
            print::err(format!("{:#}", e));
            std::process::exit(1);
        }
    };
    let floor = fsm::on_init(&elevator).await;
    /* SLUTT ----------- Hardware ---------------------- */

    /* START ----------- Order state ---------------------- */
    let (wake_tx, wake_rx) = mpsc::channel::<elevator_logic::Wake>(config::CHANNEL_CAPACITY);
    let orders = match init::initialize_orders(&settings, floor, wake_tx.clone()) {
        Ok(orders) => orders,
        Err(e) => {
            print::err(format!("{:#}", e));
            std::process::exit(1);
        }
    };
    /* SLUTT ----------- Order state ---------------------- */

    /* START ----------- Listeners ---------------------- */
    let sockets = match udp_broadcast::bind_sockets() {
        Ok(sockets) => sockets,
        Err(e) => {
            print::err(format!("{:#}", e));
            std::process::exit(1);
        }
    };
    let (outbound_tx, net_rx) = udp_broadcast::start_transport(sockets);
    let hardware = self_elevator::start_listeners(&elevator);
    /* SLUTT ----------- Listeners ---------------------- */

    let inputs = elevator_logic::Inputs {
        floor_rx: hardware.floor_rx,
        button_rx: hardware.button_rx,
        stop_rx: hardware.stop_rx,
        net_rx,
        wake_rx,
    };
    let local = LocalElevator::new(orders, elevator.clone(), outbound_tx, wake_tx);

    tokio::select! {
        _ = local.run(inputs) => {}
        _ = shutdown_signal() => {
            print::warn("Shutting down".to_string());
        }
    }
    elevator.stop();
}
