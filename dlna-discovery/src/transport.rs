//! SSDP transport
//!
//! [`SsdpTransport`] is the seam between a discovery session and the network.
//! [`MulticastTransport`] is the real implementation; tests script their own.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use local_ip_address::list_afinet_netifas;
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use crate::error::{DiscoveryError, Result};
use crate::ssdp::{MULTICAST_GROUP, SSDP_PORT};

/// One inbound datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub source: SocketAddr,
}

/// Raw send/receive of SSDP datagrams on the multicast group
pub trait SsdpTransport: Send {
    /// Bind, join the group and take the multicast lock
    fn join(&mut self) -> Result<()>;

    /// Send one datagram to the multicast group
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Wait up to `timeout` for one datagram; `Ok(None)` means the wait timed out
    fn receive(&mut self, timeout: Duration) -> Result<Option<Datagram>>;

    /// Leave the group, close the socket and release the multicast lock.
    /// Calling this when not joined does nothing.
    fn leave(&mut self);

    fn is_joined(&self) -> bool;
}

/// Platform hook that keeps multicast reception enabled
///
/// On mobile platforms the OS drops multicast traffic unless the app holds a
/// lock; desktop platforms need nothing.
pub trait MulticastLock: Send {
    fn acquire(&mut self);
    fn release(&mut self);
}

/// Lock for platforms where multicast reception is always on
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMulticastLock;

impl MulticastLock for NoopMulticastLock {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

struct LockState {
    holders: usize,
    platform: Box<dyn MulticastLock>,
}

/// Reference-counted wrapper around a [`MulticastLock`]
///
/// The platform lock is acquired when the first guard is taken and released
/// when the last guard is dropped, so concurrent users never release it early.
#[derive(Clone)]
pub struct SharedMulticastLock {
    state: Arc<Mutex<LockState>>,
}

impl SharedMulticastLock {
    pub fn new(platform: Box<dyn MulticastLock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LockState {
                holders: 0,
                platform,
            })),
        }
    }

    /// Take a hold on the lock
    pub fn acquire(&self) -> MulticastLockGuard {
        let mut state = self.state.lock();
        if state.holders == 0 {
            debug!("Acquiring multicast lock");
            state.platform.acquire();
        }
        state.holders += 1;
        MulticastLockGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of outstanding guards
    pub fn holders(&self) -> usize {
        self.state.lock().holders
    }
}

impl Default for SharedMulticastLock {
    fn default() -> Self {
        Self::new(Box::new(NoopMulticastLock))
    }
}

impl std::fmt::Debug for SharedMulticastLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMulticastLock")
            .field("holders", &self.holders())
            .finish()
    }
}

/// A hold on a [`SharedMulticastLock`], released on drop
pub struct MulticastLockGuard {
    state: Arc<Mutex<LockState>>,
}

impl Drop for MulticastLockGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.holders = state.holders.saturating_sub(1);
        if state.holders == 0 {
            debug!("Releasing multicast lock");
            state.platform.release();
        }
    }
}

/// First up, non-loopback IPv4 interface, in enumeration order
pub fn select_interface() -> Result<Ipv4Addr> {
    let interfaces = list_afinet_netifas()
        .map_err(|e| DiscoveryError::Transport(format!("Failed to list network interfaces: {}", e)))?;

    let (name, ipv4) = first_usable(interfaces, interface_is_up)
        .ok_or_else(|| DiscoveryError::Transport("No usable IPv4 interface found".to_string()))?;
    debug!("Using interface {} ({})", name, ipv4);
    Ok(ipv4)
}

fn first_usable<F>(interfaces: Vec<(String, IpAddr)>, is_up: F) -> Option<(String, Ipv4Addr)>
where
    F: Fn(&str) -> bool,
{
    interfaces.into_iter().find_map(|(name, addr)| match addr {
        IpAddr::V4(ipv4) if !ipv4.is_loopback() && !ipv4.is_unspecified() && is_up(&name) => {
            Some((name, ipv4))
        }
        _ => None,
    })
}

/// local-ip-address reports addresses without link flags, so on Linux the
/// operational state comes from sysfs. Elsewhere an assigned address counts as up.
#[cfg(target_os = "linux")]
fn interface_is_up(name: &str) -> bool {
    match std::fs::read_to_string(format!("/sys/class/net/{}/operstate", name)) {
        Ok(state) => state.trim() != "down",
        Err(_) => true,
    }
}

#[cfg(not(target_os = "linux"))]
fn interface_is_up(_name: &str) -> bool {
    true
}

/// UDP multicast transport on 239.255.255.250:1900
pub struct MulticastTransport {
    socket: Option<UdpSocket>,
    interface: Option<Ipv4Addr>,
    lock: SharedMulticastLock,
    guard: Option<MulticastLockGuard>,
    recv_buffer_size: usize,
}

impl MulticastTransport {
    /// Transport that picks its interface on `join()`
    pub fn new(lock: SharedMulticastLock, recv_buffer_size: usize) -> Self {
        Self {
            socket: None,
            interface: None,
            lock,
            guard: None,
            recv_buffer_size,
        }
    }

    /// Transport pinned to one local interface address
    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    fn group() -> Ipv4Addr {
        // 239.255.255.250
        Ipv4Addr::new(239, 255, 255, 250)
    }

    fn open_socket(interface: Ipv4Addr) -> Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| DiscoveryError::Transport(format!("Failed to create socket: {}", e)))?;

        if let Err(e) = socket.set_reuse_address(true) {
            warn!("Failed to set SO_REUSEADDR: {}", e);
        }

        #[cfg(unix)]
        if let Err(e) = socket.set_reuse_port(true) {
            warn!("Failed to set SO_REUSEPORT: {}", e);
        }

        if let Err(e) = socket.set_multicast_ttl_v4(4) {
            warn!("Failed to set multicast TTL: {}", e);
        }

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, SSDP_PORT);
        socket
            .bind(&SocketAddr::V4(bind_addr).into())
            .map_err(|e| DiscoveryError::Transport(format!("Failed to bind port {}: {}", SSDP_PORT, e)))?;

        socket
            .join_multicast_v4(&Self::group(), &interface)
            .map_err(|e| {
                DiscoveryError::Transport(format!(
                    "Failed to join {} on {}: {}",
                    MULTICAST_GROUP, interface, e
                ))
            })?;

        if let Err(e) = socket.set_multicast_if_v4(&interface) {
            warn!("Failed to set multicast interface {}: {}", interface, e);
        }

        Ok(socket.into())
    }
}

impl SsdpTransport for MulticastTransport {
    fn join(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        let interface = match self.interface {
            Some(interface) => interface,
            None => select_interface()?,
        };

        let socket = Self::open_socket(interface)?;
        self.guard = Some(self.lock.acquire());
        self.socket = Some(socket);
        self.interface = Some(interface);

        info!("Joined SSDP group {} on {}", MULTICAST_GROUP, interface);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| DiscoveryError::Transport("Transport is not joined".to_string()))?;

        let target = SocketAddrV4::new(Self::group(), SSDP_PORT);
        socket
            .send_to(payload, target)
            .map_err(|e| DiscoveryError::Transport(format!("Failed to send to {}: {}", target, e)))?;

        debug!("Sent {} byte datagram to {}", payload.len(), target);
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Datagram>> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| DiscoveryError::Transport("Transport is not joined".to_string()))?;

        // A zero read timeout means "block forever" to the OS
        let timeout = timeout.max(Duration::from_millis(1));
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::Transport(format!("Failed to set read timeout: {}", e)))?;

        let mut buffer = vec![0u8; self.recv_buffer_size];
        match socket.recv_from(&mut buffer) {
            Ok((len, source)) => {
                buffer.truncate(len);
                Ok(Some(Datagram {
                    payload: buffer,
                    source,
                }))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(DiscoveryError::Transport(format!("Receive failed: {}", e))),
        }
    }

    fn leave(&mut self) {
        if let Some(socket) = self.socket.take() {
            if let Some(interface) = self.interface {
                if let Err(e) = socket.leave_multicast_v4(&Self::group(), &interface) {
                    debug!("Failed to leave multicast group: {}", e);
                }
            }
            info!("Left SSDP group {}", MULTICAST_GROUP);
        }
        self.guard = None;
    }

    fn is_joined(&self) -> bool {
        self.socket.is_some()
    }
}

impl Drop for MulticastTransport {
    fn drop(&mut self) {
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLock {
        acquired: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    impl MulticastLock for CountingLock {
        fn acquire(&mut self) {
            self.acquired.fetch_add(1, Ordering::SeqCst);
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_shared_lock_is_reference_counted() {
        let platform = CountingLock::default();
        let acquired = Arc::clone(&platform.acquired);
        let released = Arc::clone(&platform.released);
        let lock = SharedMulticastLock::new(Box::new(platform));

        let first = lock.acquire();
        let second = lock.clone().acquire();
        assert_eq!(lock.holders(), 2);
        assert_eq!(acquired.load(Ordering::SeqCst), 1);

        drop(first);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(second);
        assert_eq!(lock.holders(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let _third = lock.acquire();
        assert_eq!(acquired.load(Ordering::SeqCst), 2);
    }

    fn interfaces() -> Vec<(String, IpAddr)> {
        vec![
            ("lo".to_string(), IpAddr::V4(Ipv4Addr::LOCALHOST)),
            ("eth0".to_string(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))),
            ("wlan0".to_string(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))),
        ]
    }

    #[test]
    fn test_first_usable_skips_loopback() {
        let picked = first_usable(interfaces(), |_| true);
        assert_eq!(
            picked,
            Some(("eth0".to_string(), Ipv4Addr::new(192, 168, 1, 20)))
        );
    }

    #[test]
    fn test_first_usable_skips_down_interfaces() {
        let picked = first_usable(interfaces(), |name| name != "eth0");
        assert_eq!(picked, Some(("wlan0".to_string(), Ipv4Addr::new(10, 0, 0, 7))));
    }

    #[test]
    fn test_first_usable_none_when_all_down() {
        assert_eq!(first_usable(interfaces(), |_| false), None);
    }

    #[test]
    fn test_unjoined_transport() {
        let mut transport = MulticastTransport::new(SharedMulticastLock::default(), 8192);
        assert!(!transport.is_joined());
        assert!(matches!(
            transport.send(b"hello"),
            Err(DiscoveryError::Transport(_))
        ));
        assert!(transport.receive(Duration::from_millis(10)).is_err());

        // leave is idempotent
        transport.leave();
        transport.leave();
        assert!(!transport.is_joined());
    }
}
