//! End-to-end exercises of the transport: command round trips over the
//! loopback radio, loss recovery through the history window, and the
//! station-side demux/decode pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use roverlink::image_codec::quantize::{level_scale, quantize_direct};
use roverlink::image_codec::{ImageCodec, Raster};
use roverlink::link::{LoopbackRadio, RadioLink};
use roverlink::log::NoopLogSink;
use roverlink::protocol::constants::END_OF_STREAM;
use roverlink::protocol::handlers::default_handlers;
use roverlink::protocol::peripherals::{GradientSource, LogActuator};
use roverlink::protocol::{CommandProtocol, SessionConfig};
use roverlink::station::{DemuxEvent, DualModeLineDemux};

fn gradient(edge: u32) -> Raster {
    let span = (2 * edge).saturating_sub(2).max(1);
    let pixels: Vec<u8> = (0..edge)
        .flat_map(|y| (0..edge).map(move |x| (((x + y) * 255) / span) as u8))
        .collect();
    Raster::new(edge, edge, pixels).unwrap()
}

fn spawn_rover(link: LoopbackRadio) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let sink = Arc::new(NoopLogSink);
    let actuator = Arc::new(Mutex::new(LogActuator::new(sink.clone())));
    let mut protocol = CommandProtocol::new(link, sink).with_session(SessionConfig {
        timestamp_enabled: false,
        ..SessionConfig::default()
    });
    protocol.register_all(default_handlers(
        actuator,
        Box::new(GradientSource::new(64, 64)),
    ));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let handle = thread::spawn(move || protocol.run(&stop_flag));
    (stop, handle)
}

/// Collect one response message off the link, sentinel excluded.
fn collect_message(link: &mut LoopbackRadio) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        match link.receive(Duration::from_millis(200)).unwrap() {
            Some(packet) if packet == END_OF_STREAM => return packets,
            Some(packet) => packets.push(packet),
            None => {}
        }
    }
    panic!("no sentinel within the ceiling");
}

#[test]
fn status_round_trip_over_the_loopback_radio() {
    let (rover_end, mut station) = LoopbackRadio::pair();
    let (stop, rover) = spawn_rover(rover_end);

    station.send(b"STATUS").unwrap();
    let packets = collect_message(&mut station);
    assert_eq!(packets.len(), 1);
    let text = String::from_utf8(packets[0].clone()).unwrap();
    assert!(text.ends_with("Rover is online and ready"), "got: {text}");

    stop.store(true, Ordering::Relaxed);
    rover.join().unwrap();
}

#[test]
fn image_command_round_trip_decodes() {
    let (rover_end, mut station) = LoopbackRadio::pair();
    let (stop, rover) = spawn_rover(rover_end);

    station.send(b"IMAGE 4 64").unwrap();
    let packets = collect_message(&mut station);
    assert!(!packets.is_empty());

    // Hex blob chunks carry no prefix; concatenation restores the payload.
    let blob: Vec<u8> = packets.concat();
    let codec = ImageCodec::new(4, (64, 64)).unwrap();
    let raster = codec.decode_hex(&blob).unwrap();
    assert_eq!((raster.width(), raster.height()), (64, 64));

    stop.store(true, Ordering::Relaxed);
    rover.join().unwrap();
}

#[test]
fn dropped_chunk_is_recovered_byte_identically_via_resend() {
    let (rover_end, mut station) = LoopbackRadio::pair();
    let (stop, rover) = spawn_rover(rover_end);

    station.send(b"IMAGE 4 64").unwrap();
    let originals = collect_message(&mut station);
    assert!(originals.len() >= 3, "need several chunks to drop one");

    // Pretend chunk at absolute history index 2 was lost and re-request it.
    station.send(b"RESEND 2").unwrap();
    let replayed = collect_message(&mut station);
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0], originals[2]);

    // The recovered blob still decodes.
    let blob: Vec<u8> = originals.concat();
    let codec = ImageCodec::new(4, (64, 64)).unwrap();
    assert!(codec.decode_hex(&blob).is_ok());

    stop.store(true, Ordering::Relaxed);
    rover.join().unwrap();
}

#[test]
fn gradient_through_demux_stays_within_one_quantization_step() {
    let source = gradient(64);
    let codec = ImageCodec::new(4, (64, 64)).unwrap();
    let hex = codec.encode_hex(&source).unwrap();

    // Feed the hex blob in bursts with simulated timestamps, then let the
    // 1s inactivity gap finalize it 1.2s after the last byte.
    let t0 = Instant::now();
    let mut demux = DualModeLineDemux::new(Duration::from_secs(1));
    let mut now = t0;
    for burst in hex.as_bytes().chunks(200) {
        assert!(demux.push(burst, now).is_empty());
        now += Duration::from_millis(100);
    }
    assert!(demux.poll(now + Duration::from_millis(500)).is_empty());

    let events = demux.poll(now + Duration::from_millis(1200));
    let blob = match events.as_slice() {
        [DemuxEvent::TransferStarted, DemuxEvent::TransferFinalized(blob)] => blob.clone(),
        other => panic!("unexpected demux events: {other:?}"),
    };
    assert_eq!(blob, hex.as_bytes());

    let decoded = codec.decode_hex(&blob).unwrap();

    // Reference: direct quantization of the same source, rescaled to 8-bit.
    let step = level_scale(4);
    let reference: Vec<u8> = quantize_direct(&source, 4)
        .unwrap()
        .iter()
        .map(|&q| (u16::from(q) * step).min(255) as u8)
        .collect();

    let mean_err: f64 = decoded
        .pixels()
        .iter()
        .zip(&reference)
        .map(|(&a, &b)| (f64::from(a) - f64::from(b)).abs())
        .sum::<f64>()
        / reference.len() as f64;
    assert!(
        mean_err <= f64::from(step),
        "mean error {mean_err} exceeds one quantization step ({step})"
    );
}
