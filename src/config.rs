use std::fmt::{Debug, Display, Formatter};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use anyhow::bail;

/// Largest payload a single UDP datagram can carry over IPv4
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Largest payload a single UDP datagram can carry over IPv6 without jumbograms
pub const MAX_UDP_PAYLOAD_V6: usize = 65_527;

/// The network endpoint a source listens on. Whether the source binds directly (unicast) or joins
///  a group (multicast) is derived from the address rather than configured separately.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Endpoint {
    addr: SocketAddr,
}
impl Endpoint {
    pub fn new(address: IpAddr, port: u16) -> Endpoint {
        Endpoint {
            addr: SocketAddr::new(address, port),
        }
    }

    pub fn address(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn is_multicast(&self) -> bool {
        self.addr.ip().is_multicast()
    }

    /// The largest datagram payload that can arrive on this endpoint's address family
    pub fn max_udp_payload(&self) -> usize {
        match self.addr {
            SocketAddr::V4(_) => MAX_UDP_PAYLOAD,
            SocketAddr::V6(_) => MAX_UDP_PAYLOAD_V6,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Endpoint { addr }
    }
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Endpoint {
            addr: SocketAddr::from_str(s)?,
        })
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_multicast() {
            write!(f, "[multicast {:?}]", self.addr)
        }
        else {
            write!(f, "[{:?}]", self.addr)
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr)
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoint: Endpoint,

    /// Upper bound for waiting on socket readability. Stop requests are only checked between
    ///  waits, so this is also the upper bound for shutdown latency of the receive loop.
    pub poll_interval: Duration,

    /// Size of both the OS level receive buffer and the scratch buffer that datagrams are read
    ///  into. It must accommodate the largest expected JSON payload: datagrams exceeding it are
    ///  truncated by the OS and fail to parse.
    pub receive_buffer_size: usize,

    /// TTL (or hop limit for IPv6) for multicast endpoints, ignored for unicast
    pub multicast_ttl: u32,
}

impl SourceConfig {
    pub fn new(endpoint: Endpoint) -> SourceConfig {
        SourceConfig {
            endpoint,
            poll_interval: Duration::from_millis(100),
            receive_buffer_size: 1024 * 1024,
            multicast_ttl: 2,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }
        let max_udp_payload = self.endpoint.max_udp_payload();
        if self.receive_buffer_size < max_udp_payload {
            bail!("receive buffer size {} is smaller than the maximum UDP payload of {} bytes", self.receive_buffer_size, max_udp_payload);
        }
        Ok(())
    }
}
