use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

use crate::net::datagram_buffer::DatagramBuffer;

/// A received datagram. The bytes are an independent copy, owned exclusively by whoever
///  processes the datagram.
#[derive(Clone, Debug, PartialEq)]
pub struct Datagram {
    pub bytes: Bytes,
    pub sender: SocketAddr,
}

/// Processing of received datagrams. This is called on the blocking thread pool rather than on
///  the receive loop's task, and calls for different datagrams may run concurrently.
pub trait DatagramHandler: Send + Sync + 'static {
    fn on_datagram(&self, datagram: Datagram);
}

/// Handle to the background task that reads datagrams from a socket and dispatches them.
///
/// Stopping is cooperative: the stop flag is checked once per poll interval, so the loop
///  terminates at most one poll interval (plus the current drain cycle) after a stop request.
///  Datagram handlers that were already dispatched run to completion.
pub struct ReceiveLoop {
    stop_requested: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReceiveLoop {
    pub fn spawn(socket: Arc<UdpSocket>, poll_interval: Duration, buffer_size: usize, handler: Arc<dyn DatagramHandler>) -> ReceiveLoop {
        let stop_requested = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(Self::run(
            socket,
            poll_interval,
            DatagramBuffer::new(buffer_size),
            stop_requested.clone(),
            handler,
        ));

        ReceiveLoop {
            stop_requested,
            handle,
        }
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Requests a stop and waits for the loop to terminate. When this returns, no further
    ///  datagrams are dispatched.
    pub async fn stop_and_join(self) {
        self.request_stop();
        if let Err(e) = self.handle.await {
            error!("receive loop terminated abnormally: {}", e);
        }
    }

    async fn run(socket: Arc<UdpSocket>, poll_interval: Duration, mut buf: DatagramBuffer, stop_requested: Arc<AtomicBool>, handler: Arc<dyn DatagramHandler>) {
        info!("starting receive loop");

        while !stop_requested.load(Ordering::Acquire) {
            match timeout(poll_interval, socket.readable()).await {
                Ok(Ok(())) => {
                    let num_dispatched = Self::drain(&socket, &mut buf, &handler);
                    trace!("dispatched {} datagrams", num_dispatched);
                }
                Ok(Err(e)) => {
                    debug!("error waiting for socket to become readable: {}", e);
                }
                Err(_) => {} // poll interval elapsed
            }
        }

        info!("receive loop stopped");
    }

    /// Reads all datagrams that are currently pending, dispatching each for processing
    fn drain(socket: &UdpSocket, buf: &mut DatagramBuffer, handler: &Arc<dyn DatagramHandler>) -> usize {
        let mut num_dispatched = 0;
        loop {
            let (num_read, sender) = match socket.try_recv_from(buf.receive_target()) {
                Ok(x) => x,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!("error receiving datagram: {}", e);
                    break;
                }
            };
            buf.set_len(num_read);

            if buf.is_empty() {
                trace!("received empty datagram from {:?} - skipping", sender);
                continue;
            }
            trace!("received datagram from {:?}, len {}", sender, num_read);

            let datagram = Datagram {
                bytes: buf.copy_out(),
                sender,
            };
            let handler = handler.clone();
            tokio::task::spawn_blocking(move || handler.on_datagram(datagram));
            num_dispatched += 1;
        }
        num_dispatched
    }
}
