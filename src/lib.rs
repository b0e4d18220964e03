//! Roverlink is the application-layer transport between a control station
//! and a remote rover over a radio/serial link that delivers only small,
//! bounded, individually unreliable packets.
//!
//! It provides two binaries:
//! - `rover`: the remote unit's command dispatch loop (run here against an
//!   in-memory link, with the real radio driver as an external collaborator).
//! - `basestation`: the control-station console with the background stream
//!   reader and image reconstruction.
//!
//! The crate is structured into several modules, each responsible for one
//! layer of the transport.

/// Handles configuration loading and management.
pub mod config;
/// Packet framing, reassembly, and the retransmission history window.
pub mod framing;
/// Grayscale quantization, dithering, bit-packing, and compression.
pub mod image_codec;
/// Contracts of the radio and serial drivers, plus in-memory loopbacks.
pub mod link;
/// Logging utilities for the application.
pub mod log;
/// Command parsing, dispatch, and the receive state machine.
pub mod protocol;
/// Control-station receive bridge: demux, reader thread, reconstruction.
pub mod station;
/// Small time helpers shared by logging and framing.
pub mod util;
