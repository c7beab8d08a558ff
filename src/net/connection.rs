use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use crate::config::{Endpoint, SourceConfig};

/// Owns the receiving socket of a source.
///
/// Socket setup happens once on construction and is not retried: if it fails, the connection
///  stays 'not ready' for its entire lifetime.
pub struct ConnectionManager {
    endpoint: Endpoint,
    socket: Mutex<Option<Arc<UdpSocket>>>,
}

impl ConnectionManager {
    /// NB: This must be called from inside a tokio runtime since the socket is registered with
    ///  the runtime's reactor
    pub fn open(config: &SourceConfig) -> ConnectionManager {
        let socket = match config.validate().and_then(|_| Self::bind(config)) {
            Ok(socket) => {
                info!("listening for JSON datagrams on {:?}", config.endpoint);
                Some(Arc::new(socket))
            }
            Err(e) => {
                error!("failed to set up UDP socket for {:?}: {}", config.endpoint, e);
                None
            }
        };

        ConnectionManager {
            endpoint: config.endpoint,
            socket: Mutex::new(socket),
        }
    }

    fn bind(config: &SourceConfig) -> anyhow::Result<UdpSocket> {
        let endpoint = config.endpoint;

        let domain = match endpoint.address() {
            IpAddr::V4(_) => Domain::IPV4,
            IpAddr::V6(_) => Domain::IPV6,
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_nonblocking(true)?;
        socket.set_reuse_address(true)?;
        if let Err(e) = socket.set_recv_buffer_size(config.receive_buffer_size) {
            // the OS keeps its default in this case, which only matters for large payloads
            warn!("unable to set receive buffer size to {} bytes: {}", config.receive_buffer_size, e);
        }

        match endpoint.address() {
            IpAddr::V4(group) if group.is_multicast() => {
                debug!("joining IPv4 multicast group {}", group);
                socket.bind(&SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), endpoint.port()).into())?;
                socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
                socket.set_multicast_loop_v4(true)?;
                socket.set_multicast_ttl_v4(config.multicast_ttl)?;
            }
            IpAddr::V6(group) if group.is_multicast() => {
                debug!("joining IPv6 multicast group {}", group);
                socket.bind(&SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), endpoint.port()).into())?;
                socket.join_multicast_v6(&group, 0)?;
                socket.set_multicast_loop_v6(true)?;
                socket.set_multicast_hops_v6(config.multicast_ttl)?;
            }
            _ => {
                socket.bind(&endpoint.socket_addr().into())?;
            }
        }

        let socket: std::net::UdpSocket = socket.into();
        Ok(UdpSocket::from_std(socket)?)
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// `true` iff the socket was bound successfully and was not closed since
    pub fn is_ready(&self) -> bool {
        self.socket.lock().unwrap().is_some()
    }

    pub fn socket(&self) -> Option<Arc<UdpSocket>> {
        self.socket.lock().unwrap().clone()
    }

    /// The address the socket is actually bound to, which differs from the endpoint for port 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.lock().unwrap()
            .as_ref()
            .and_then(|s| s.local_addr().ok())
    }

    /// Releases the socket. Calling this more than once has no further effect.
    ///
    /// NB: The OS socket is closed when the last reference is dropped, so a running receive loop
    ///  keeps it open until it terminates.
    pub fn close(&self) {
        if self.socket.lock().unwrap().take().is_some() {
            info!("closed UDP socket for {:?}", self.endpoint);
        }
    }
}
