//! Discovery session
//!
//! A time-bounded scan. `start()` joins the multicast group and sends the
//! M-SEARCH on the caller's thread, so socket failures surface there, then
//! lends the transport to a worker thread that feeds responses into the
//! registry until the scan window closes or `stop()` is called. The loan is
//! returned even when the worker panics or never starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::registry::DeviceRegistry;
use crate::ssdp::{build_msearch, SsdpMessage};
use crate::transport::{Datagram, MulticastTransport, SharedMulticastLock, SsdpTransport};

/// Scan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
}

type TransportSlot = Arc<Mutex<Option<Box<dyn SsdpTransport>>>>;

struct ScanWorker {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// A transport on loan to the scan worker, put back in its slot on drop
struct TransportLease {
    slot: TransportSlot,
    transport: Option<Box<dyn SsdpTransport>>,
}

impl Drop for TransportLease {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if transport.is_joined() {
                transport.leave();
            }
            *self.slot.lock() = Some(transport);
        }
    }
}

/// Runs discovery scans against one transport and one registry
pub struct DiscoverySession {
    config: DiscoveryConfig,
    registry: Arc<DeviceRegistry>,
    transport: TransportSlot,
    worker: Option<ScanWorker>,
}

impl DiscoverySession {
    /// Session over an arbitrary transport
    pub fn new(
        config: DiscoveryConfig,
        registry: Arc<DeviceRegistry>,
        transport: Box<dyn SsdpTransport>,
    ) -> Self {
        Self {
            config,
            registry,
            transport: Arc::new(Mutex::new(Some(transport))),
            worker: None,
        }
    }

    /// Session over the UDP multicast transport
    pub fn multicast(
        config: DiscoveryConfig,
        registry: Arc<DeviceRegistry>,
        lock: SharedMulticastLock,
    ) -> Self {
        let transport = MulticastTransport::new(lock, config.recv_buffer_size);
        Self::new(config, registry, Box::new(transport))
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Current state; a scan whose window has closed reads as `Idle`
    pub fn state(&self) -> SessionState {
        match &self.worker {
            Some(worker) if !worker.handle.is_finished() => SessionState::Scanning,
            _ => SessionState::Idle,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == SessionState::Scanning
    }

    /// Begin a scan
    ///
    /// Joins the group, sends one M-SEARCH and clears the registry before
    /// returning. Any transport failure is returned here and leaves the
    /// session `Idle`.
    pub fn start(&mut self) -> Result<()> {
        self.reap_finished();
        if self.worker.is_some() {
            return Err(DiscoveryError::AlreadyScanning);
        }

        self.config.validate()?;

        let mut transport = self
            .transport
            .lock()
            .take()
            .ok_or_else(|| DiscoveryError::Transport("Transport is unavailable".to_string()))?;

        if let Err(e) = Self::open(transport.as_mut(), &self.config) {
            transport.leave();
            *self.transport.lock() = Some(transport);
            error!("Failed to start discovery: {}", e);
            return Err(e);
        }

        let lease = TransportLease {
            slot: Arc::clone(&self.transport),
            transport: Some(transport),
        };
        let cancel = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = {
            let cancel = Arc::clone(&cancel);
            let registry = Arc::clone(&self.registry);
            let config = self.config.clone();
            thread::Builder::new()
                .name("ssdp-scan".to_string())
                .spawn(move || {
                    let mut lease = lease;
                    // Responses to the M-SEARCH queue in the socket until the loop reads them
                    let cleared = registry.clear();
                    if cleared > 0 {
                        debug!("Cleared {} device(s) from the previous scan", cleared);
                    }
                    let _ = ready_tx.send(());

                    if let Some(transport) = lease.transport.as_mut() {
                        run_scan(transport.as_mut(), &registry, &config, &cancel);
                    }
                })
                .map_err(|e| {
                    error!("Failed to spawn scan worker: {}", e);
                    DiscoveryError::Transport(format!("Failed to spawn scan worker: {}", e))
                })?
        };

        let worker = ScanWorker { cancel, handle };
        if ready_rx.recv().is_err() {
            Self::collect(worker);
            return Err(DiscoveryError::Transport(
                "Scan worker exited before the scan began".to_string(),
            ));
        }

        self.worker = Some(worker);
        info!(
            "Discovery started (window {:?}, MX {})",
            self.config.scan_window, self.config.mx
        );
        Ok(())
    }

    fn open(transport: &mut dyn SsdpTransport, config: &DiscoveryConfig) -> Result<()> {
        transport.join()?;
        let request = build_msearch(&config.search_target, config.mx);
        transport.send(request.as_bytes())
    }

    /// End the scan
    ///
    /// Returns once the worker has left the multicast group, which takes at
    /// most one receive timeout. Returns `false` when no scan was running.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        let was_running = !worker.handle.is_finished();
        worker.cancel.store(true, Ordering::SeqCst);
        Self::collect(worker);

        if was_running {
            info!("Discovery stopped");
        }
        was_running
    }

    /// Block until the current scan ends on its own
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            Self::collect(worker);
        }
    }

    fn reap_finished(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.handle.is_finished())
        {
            self.wait();
        }
    }

    fn collect(worker: ScanWorker) {
        if worker.handle.join().is_err() {
            error!("Scan worker panicked; transport returned to the session");
        }
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DiscoverySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverySession")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

fn run_scan(
    transport: &mut dyn SsdpTransport,
    registry: &DeviceRegistry,
    config: &DiscoveryConfig,
    cancel: &AtomicBool,
) {
    let deadline = Instant::now() + config.scan_window;
    let mut received = 0usize;

    while !cancel.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            debug!("Scan window elapsed");
            break;
        }

        let wait = (deadline - now).min(config.receive_timeout);
        match transport.receive(wait) {
            Ok(Some(datagram)) => {
                received += 1;
                handle_datagram(registry, datagram);
            }
            Ok(None) => continue,
            Err(e) => {
                error!("Receive failed, ending scan: {}", e);
                break;
            }
        }
    }

    transport.leave();

    let swept = registry.sweep_stale(config.stale_after, Instant::now());
    info!(
        "Discovery scan finished: {} datagram(s), {} device(s), {} swept",
        received,
        registry.len(),
        swept.len()
    );
}

fn handle_datagram(registry: &DeviceRegistry, datagram: Datagram) {
    let source = datagram.source;
    let text = match std::str::from_utf8(&datagram.payload) {
        Ok(text) => text,
        Err(_) => {
            warn!("Dropping non-UTF-8 datagram from {}", source);
            return;
        }
    };

    let message = match SsdpMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping datagram from {}: {}", source, e);
            return;
        }
    };

    // Our own M-SEARCH and other hosts' NOTIFYs share the group
    if message.is_request() {
        return;
    }

    match message.to_candidate(source.ip()) {
        Some(candidate) => {
            registry.upsert(candidate, Instant::now());
        }
        None => debug!(
            "Ignoring response from {} (ST {:?})",
            source,
            message.header("ST")
        ),
    }
}

/// Run one blocking scan with the multicast transport and return what it found
pub fn discover_renderers(config: DiscoveryConfig) -> Result<Vec<crate::DiscoveredDevice>> {
    let registry = Arc::new(DeviceRegistry::new());
    let mut session =
        DiscoverySession::multicast(config, Arc::clone(&registry), SharedMulticastLock::default());
    session.start()?;
    session.wait();
    Ok(registry.list())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;

    #[test]
    fn test_dropped_lease_returns_transport() {
        let mut transport = ScriptedTransport::new();
        let log = transport.log();
        transport.join().unwrap();

        let slot: TransportSlot = Arc::new(Mutex::new(None));
        let lease = TransportLease {
            slot: Arc::clone(&slot),
            transport: Some(Box::new(transport)),
        };
        drop(lease);

        let restored = slot.lock().take().expect("transport back in its slot");
        assert!(!restored.is_joined());
        assert_eq!(log.leaves(), 1);
    }
}
