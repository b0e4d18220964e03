//! Background reader that drains the serial stream into the demux.
//!
//! The reader must never block the foreground command path: it talks to it
//! only through an mpsc channel of [`StationEvent`]s, and every read on the
//! stream is timeout-bounded so the stop flag is observed promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::link::{ByteStream, LinkError};
use crate::log::log_sink::LogSink;
use crate::station::demux::{DemuxEvent, DualModeLineDemux};
use crate::station::events::StationEvent;
use crate::station::reconstructor::Reconstructor;
use crate::{sink_error, sink_info};

/// Read timeout per loop turn; also bounds stop-flag latency.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct StreamReader {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StreamReader {
    /// Spawns the reader thread. Events flow out through `tx`; decoded
    /// images are persisted by `reconstructor` as transfers finalize.
    pub fn spawn<S: ByteStream + 'static>(
        mut stream: S,
        transfer_gap: Duration,
        reconstructor: Reconstructor,
        tx: Sender<StationEvent>,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let thread = thread::Builder::new()
            .name("station-reader".into())
            .spawn(move || {
                sink_info!(log_sink, "[READER] stream reader started");
                let mut demux = DualModeLineDemux::new(transfer_gap);

                while !stop_flag.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let mut events = match stream.read_timeout(POLL_TIMEOUT) {
                        Ok(Some(burst)) => demux.push(&burst, now),
                        Ok(None) => Vec::new(),
                        Err(LinkError::Closed) => {
                            sink_info!(log_sink, "[READER] stream closed");
                            break;
                        }
                        Err(e) => {
                            sink_error!(log_sink, "[READER] stream read error: {e}");
                            break;
                        }
                    };
                    events.extend(demux.poll(Instant::now()));

                    for event in events {
                        let out = match event {
                            DemuxEvent::StatusLine(line) => StationEvent::StatusLine(line),
                            DemuxEvent::TransferStarted => {
                                sink_info!(
                                    log_sink,
                                    "[READER] entering file transfer mode (raw binary detected)"
                                );
                                StationEvent::TransferStarted
                            }
                            DemuxEvent::TransferFinalized(blob) => {
                                match reconstructor.reconstruct(&blob) {
                                    Ok(path) => StationEvent::ImageSaved(path),
                                    Err(e) => StationEvent::TransferFailed(e.to_string()),
                                }
                            }
                        };
                        if tx.send(out).is_err() {
                            // Foreground is gone; no reason to keep reading.
                            stop_flag.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                }
                stream.close();
                sink_info!(log_sink, "[READER] stream reader stopped");
            })
            .ok();

        Self { stop, thread }
    }

    /// Signal the reader to stop and join it. Bytes still in flight are
    /// discarded.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
