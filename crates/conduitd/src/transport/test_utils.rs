//! Test helpers for the transport module.

use std::io::Read;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{ConnectionHandler, ConnectionStream};

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler that keeps each connection open until the peer closes it.
pub(crate) struct HoldingHandler {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl HoldingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<Self>) {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            started: Arc::clone(&started),
            finished: Arc::clone(&finished),
        });
        (started, finished, handler)
    }
}

impl ConnectionHandler for HoldingHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut buffer = [0_u8; 64];
        while matches!(stream.read(&mut buffer), Ok(read) if read > 0) {}
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
