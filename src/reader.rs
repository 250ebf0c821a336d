use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::ScannerConfig;
use crate::decoder::FrameDecoder;
use crate::sink::EventSink;
use crate::transport::ByteSource;
use crate::types::{bytes_to_hex, ScanEvent};

/// Counters collected by one reader session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Non-empty reads
    pub frames: usize,
    /// Frames that decoded to a tag
    pub tags: usize,
    /// Failed reads
    pub errors: usize,
}

/// Background loop draining a [`ByteSource`] into the decoder.
///
/// The thread runs until [`SerialReader::stop`] is called or the reader is
/// dropped. Stopping wakes the thread out of its poll sleep, so shutdown
/// takes at most one read call.
pub struct SerialReader {
    token: CancellationToken,
    handle: Option<JoinHandle<ReaderStats>>,
}

impl SerialReader {
    const THREAD_NAME: &'static str = "lf-reader";

    /// Spawn the read loop on a dedicated thread
    pub fn spawn<S>(
        source: S,
        sink: Arc<dyn EventSink>,
        config: &ScannerConfig,
    ) -> std::io::Result<Self>
    where
        S: ByteSource + Send + 'static,
    {
        let token = CancellationToken::new();
        let thread_token = token.clone();
        let config = config.clone();

        let handle = std::thread::Builder::new()
            .name(Self::THREAD_NAME.into())
            .spawn(move || Self::run(source, sink.as_ref(), &thread_token, &config))?;

        debug!("Reader thread started");
        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    /// Drive the loop on the current thread until `token` is cancelled.
    pub fn run<S: ByteSource>(
        mut source: S,
        sink: &dyn EventSink,
        token: &CancellationToken,
        config: &ScannerConfig,
    ) -> ReaderStats {
        let read_chunk = config.read_chunk();
        let mut stats = ReaderStats::default();
        let mut buffer = [0u8; ScannerConfig::MAX_READ_CHUNK];

        while !token.is_cancelled() {
            match source.read(&mut buffer[..read_chunk]) {
                Ok(0) => {}
                Ok(bytes_read) => {
                    let frame = &buffer[..bytes_read.min(read_chunk)];
                    stats.frames += 1;
                    debug!("Received {} bytes: {}", frame.len(), bytes_to_hex(frame));

                    match FrameDecoder::decode(frame) {
                        Some(tag) => {
                            stats.tags += 1;
                            info!("Tag read: {}", tag);
                            sink.publish(ScanEvent::Rfid(tag.render()));
                        }
                        None => debug!("Frame did not match a tag layout"),
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!("Read error: {:?}", e);
                }
            }

            if token.sleep(config.poll_interval) {
                break;
            }
        }

        debug!(
            "Reader loop exited after {} frames, {} tags, {} errors",
            stats.frames, stats.tags, stats.errors
        );
        stats
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for the thread to exit.
    ///
    /// Returns the session counters, or `None` if the thread was already
    /// joined, panicked, or this is the reader thread itself (then the loop
    /// is only cancelled).
    pub fn stop(&mut self) -> Option<ReaderStats> {
        self.token.cancel();
        let handle = self.handle.take()?;
        if handle.thread().id() == std::thread::current().id() {
            // Called from a sink on the reader thread; the loop exits once publish returns.
            debug!("Reader stopped from its own thread");
            return None;
        }
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("Reader thread panicked");
                None
            }
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.stop();
    }
}
