//! Control-station console: interactive command prompt, background stream
//! reader, and image reconstruction.
//!
//! The serial bridge firmware and radio are external collaborators; this
//! binary emulates them in-process (a loopback radio plus a minimal
//! forwarding bridge) so the full station pipeline - demux, gap detection,
//! hex decode, PNG persistence - runs unchanged.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use roverlink::config::Config;
use roverlink::image_codec::{DEFAULT_BIT_DEPTH, DEFAULT_IMAGE_SIZE, ImageCodec};
use roverlink::link::{ByteStream, ChannelByteStream, LoopbackRadio, RadioLink};
use roverlink::log::log_sink::LogSink;
use roverlink::log::logger::Logger;
use roverlink::protocol::CommandProtocol;
use roverlink::protocol::constants::END_OF_STREAM;
use roverlink::protocol::handlers::default_handlers;
use roverlink::protocol::peripherals::{GradientSource, LogActuator};
use roverlink::station::demux::DEFAULT_TRANSFER_GAP;
use roverlink::station::{Reconstructor, StationEvent, StreamReader};

const BRIDGE_POLL: Duration = Duration::from_millis(50);

fn main() {
    let config = Arc::new(Config::load("roverlink.ini").unwrap_or_else(|_| Config::empty()));
    let logger = Logger::start_station(1024, config.clone());
    let sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    // Serial stream between the station and the bridge firmware.
    let (station_end, bridge_end) = ChannelByteStream::pair();
    let command_writer = station_end.writer();

    // In-process rover behind the bridge.
    let (rover_radio, feather_radio) = LoopbackRadio::pair();
    let actuator = Arc::new(Mutex::new(LogActuator::new(sink.clone())));
    let mut protocol = CommandProtocol::new(rover_radio, sink.clone());
    protocol.register_all(default_handlers(
        actuator,
        Box::new(GradientSource::new(128, 128)),
    ));

    let stop = Arc::new(AtomicBool::new(false));
    let dispatcher = {
        let stop = stop.clone();
        thread::spawn(move || protocol.run(&stop))
    };
    let bridge = {
        let stop = stop.clone();
        thread::spawn(move || feather_bridge(bridge_end, feather_radio, &stop))
    };

    // Station receive path: demux + reconstruction.
    let bit_depth = config.get_u64_or("station", "bit_depth", u64::from(DEFAULT_BIT_DEPTH)) as u8;
    let edge = config.get_u64_or("station", "image_size", u64::from(DEFAULT_IMAGE_SIZE.0)) as u32;
    let codec = match ImageCodec::new(bit_depth, (edge, edge)) {
        Ok(codec) => codec,
        Err(e) => {
            eprintln!("[ERROR] Bad image settings in config: {e}");
            return;
        }
    };
    let output = config
        .get_or_default("station", "image_output", "reconstructed.png")
        .to_string();
    let gap = Duration::from_millis(config.get_u64_or(
        "station",
        "transfer_gap_ms",
        DEFAULT_TRANSFER_GAP.as_millis() as u64,
    ));

    let (event_tx, event_rx) = mpsc::channel();
    let reader = StreamReader::spawn(
        station_end,
        gap,
        Reconstructor::new(codec, output, sink.clone()),
        event_tx,
        sink,
    );
    let printer = thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            match event {
                StationEvent::StatusLine(line) => println!("[FEATHER] {line}"),
                StationEvent::TransferStarted => {
                    println!("[FEATHER] Entering file transfer mode (raw binary detected).");
                }
                StationEvent::ImageSaved(path) => {
                    println!("[FEATHER] Image reconstruction complete. Saved to {path:?}");
                }
                StationEvent::TransferFailed(e) => {
                    println!("[ERROR] Failed to reconstruct image: {e}");
                }
            }
        }
    });

    println!("Basestation online. Type commands to send to the rover. Type 'exit' to quit.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        if cmd.eq_ignore_ascii_case("exit") || cmd.eq_ignore_ascii_case("quit") {
            break;
        }
        println!("[SEND] {cmd}");
        if command_writer.write_all(format!("{cmd}\r\n").as_bytes()).is_err() {
            eprintln!("[ERROR] Serial stream is closed.");
            break;
        }
    }

    // Stop the bridge and dispatcher, then the reader; in-flight bytes are
    // dropped by design.
    stop.store(true, Ordering::Relaxed);
    let _ = bridge.join();
    let _ = dispatcher.join();
    reader.shutdown();
    let _ = printer.join();
    println!("Exiting basestation.");
}

/// Minimal stand-in for the bridge firmware: serial command lines go out
/// over the radio (delivery confirmation observed, never retried), radio
/// packets come back over serial. Prefixed status chunks and the sentinel
/// are forwarded as text lines; bulk payload chunks are forwarded verbatim,
/// leaving the station's gap heuristic to spot them.
fn feather_bridge(mut serial: ChannelByteStream, mut radio: LoopbackRadio, stop: &AtomicBool) {
    let mut pending: Vec<u8> = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        match serial.read_timeout(BRIDGE_POLL) {
            Ok(Some(burst)) => {
                pending.extend_from_slice(&burst);
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    let text = String::from_utf8_lossy(&line);
                    let cmd = text.trim();
                    if !cmd.is_empty() {
                        let _ = radio.send_with_ack(cmd.as_bytes());
                    }
                }
            }
            Ok(None) => {}
            Err(_) => break,
        }

        match radio.receive(BRIDGE_POLL) {
            Ok(Some(packet)) => {
                let forwarded = if packet == END_OF_STREAM {
                    serial.write_all(b"[RX] End of message stream.\n")
                } else if packet.first() == Some(&b'[') {
                    let mut line = packet;
                    line.push(b'\n');
                    serial.write_all(&line)
                } else {
                    serial.write_all(&packet)
                };
                if forwarded.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(_) => break,
        }
    }
    serial.close();
}
