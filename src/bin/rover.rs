//! Remote-unit console: the command dispatch loop behind an in-memory
//! radio, with an operator prompt standing in for the control station.
//!
//! The real radio driver is an external collaborator; this binary wires
//! the protocol to a loopback pair so the whole dispatch path (framing,
//! history, sentinel) runs exactly as it would on hardware.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use roverlink::config::Config;
use roverlink::link::{LoopbackRadio, RadioLink};
use roverlink::log::log_sink::LogSink;
use roverlink::log::logger::Logger;
use roverlink::protocol::constants::{DEFAULT_INTER_PACKET_TIMEOUT, DEFAULT_RECEIVE_CEILING};
use roverlink::protocol::handlers::default_handlers;
use roverlink::protocol::peripherals::{GradientSource, LogActuator};
use roverlink::protocol::{CommandProtocol, MessageReceiver};

fn main() {
    let config = Arc::new(Config::load("roverlink.ini").unwrap_or_else(|_| Config::empty()));
    let logger = Logger::start_rover(1024, config);
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    let (rover_end, mut operator_end) = LoopbackRadio::pair();
    let actuator = Arc::new(Mutex::new(LogActuator::new(sink.clone())));
    let mut protocol = CommandProtocol::new(rover_end, sink);
    protocol.register_all(default_handlers(
        actuator,
        Box::new(GradientSource::new(128, 128)),
    ));

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let dispatcher = thread::spawn(move || protocol.run(&stop_flag));

    println!("LoRa transceiver is initialized. Ready to receive commands!");
    println!("Type commands for the rover. Type 'exit' to quit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if operator_end.send(line.as_bytes()).is_err() {
            eprintln!("[ERROR] Link closed.");
            break;
        }

        // Collect one response message: sentinel, idle timeout, or ceiling.
        let mut receiver = MessageReceiver::new(
            DEFAULT_INTER_PACKET_TIMEOUT,
            DEFAULT_RECEIVE_CEILING,
            Instant::now(),
        );
        let mut count = 0usize;
        while !receiver.is_complete() {
            match operator_end.receive(DEFAULT_INTER_PACKET_TIMEOUT) {
                Ok(Some(packet)) => {
                    receiver.on_packet(&packet, Instant::now());
                    if !receiver.saw_sentinel() {
                        count += 1;
                        println!(
                            "[RECEIVED #{count}] [{} bytes]: {}",
                            packet.len(),
                            String::from_utf8_lossy(&packet).trim_end()
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    eprintln!("[ERROR] Receive failed: {e}");
                    break;
                }
            }
            receiver.poll(Instant::now());
        }
        if receiver.saw_sentinel() {
            println!("[RX] Final packet received. End of message stream.");
        } else {
            println!("[RX] Timeout: message stream ended without sentinel.");
        }
    }

    stop.store(true, Ordering::Relaxed);
    let _ = dispatcher.join();
    println!("Exiting rover console.");
}
