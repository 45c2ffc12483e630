//! In-memory SSDP transport for tests
//!
//! Enabled with the `test-support` feature so crates above discovery can
//! drive scans without a multicast socket.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{DiscoveryError, Result};
use crate::transport::{Datagram, SsdpTransport};

/// What a [`ScriptedTransport`] saw, shared with the test body
#[derive(Debug, Default, Clone)]
pub struct TransportLog {
    sent: Arc<Mutex<Vec<String>>>,
    joins: Arc<AtomicUsize>,
    leaves: Arc<AtomicUsize>,
}

impl TransportLog {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn joins(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }

    pub fn leaves(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }
}

/// Transport that delivers datagrams at fixed offsets after `join()`
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<(Duration, Datagram)>,
    joined_at: Option<Instant>,
    fail_join: bool,
    panics_left: usize,
    log: TransportLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose `join()` always fails, like a port that is already taken
    pub fn failing() -> Self {
        Self {
            fail_join: true,
            ..Self::default()
        }
    }

    /// Panic inside `receive()` for the next `count` scans
    pub fn panicking(mut self, count: usize) -> Self {
        self.panics_left = count;
        self
    }

    /// Deliver `payload` from `source_ip` at `at` after joining
    pub fn respond_at(self, at: Duration, source_ip: &str, payload: &str) -> Self {
        self.raw_at(at, source_ip, payload.as_bytes())
    }

    /// Deliver raw bytes
    pub fn raw_at(mut self, at: Duration, source_ip: &str, payload: &[u8]) -> Self {
        let ip = source_ip
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        self.script.push_back((
            at,
            Datagram {
                payload: payload.to_vec(),
                source: SocketAddr::new(ip, 1900),
            },
        ));
        self
    }

    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }
}

impl SsdpTransport for ScriptedTransport {
    fn join(&mut self) -> Result<()> {
        if self.fail_join {
            return Err(DiscoveryError::Transport(
                "Failed to bind port 1900: address in use".to_string(),
            ));
        }
        self.joined_at = Some(Instant::now());
        self.log.joins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.log
            .sent
            .lock()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Datagram>> {
        let joined_at = self
            .joined_at
            .ok_or_else(|| DiscoveryError::Transport("not joined".to_string()))?;

        if self.panics_left > 0 {
            self.panics_left -= 1;
            panic!("scripted receive failure");
        }

        let now = Instant::now();
        match self.script.front() {
            Some((offset, _)) if joined_at + *offset <= now + timeout => {
                let due = joined_at + *offset;
                if due > now {
                    thread::sleep(due - now);
                }
                Ok(self.script.pop_front().map(|(_, datagram)| datagram))
            }
            _ => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn leave(&mut self) {
        if self.joined_at.take().is_some() {
            self.log.leaves.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_joined(&self) -> bool {
        self.joined_at.is_some()
    }
}
