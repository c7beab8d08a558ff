use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::{Endpoint, SourceConfig};
use crate::decode::frame_decoder::decode_datagram;
use crate::net::connection::ConnectionManager;
use crate::net::receive_loop::{Datagram, DatagramHandler, ReceiveLoop};
use crate::sink::PipelineSink;
use crate::skeleton::{SubjectKey, SubjectUpdate};
use crate::subject_registry::SubjectRegistry;

pub const SOURCE_TYPE: &str = "JSON LiveLink";
pub const SOURCE_MACHINE_NAME: &str = "localhost";

/// Coarse state of a source, as presented to the host application
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceStatus {
    /// The socket could not be set up, so nothing is received. This is final.
    NotReady,
    Receiving,
    /// Shutdown was requested
    Stopped,
}

impl Display for SourceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStatus::NotReady => write!(f, "Device Not Found"),
            SourceStatus::Receiving => write!(f, "Receiving"),
            SourceStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A source of skeletal animation data, streamed as JSON over UDP.
///
/// Each datagram is a JSON object mapping subject names to their current bones and parameters,
///  and it is decoded and pushed into the [PipelineSink] independently of all other datagrams.
pub struct JsonLiveLinkSource {
    source_id: Uuid,
    connection: ConnectionManager,
    registry: Arc<SubjectRegistry>,
    receive_loop: Option<ReceiveLoop>,
}

impl JsonLiveLinkSource {
    /// Sets up the socket and starts receiving. Failure to set up the socket does not cause an
    ///  error here, but leaves the source in [SourceStatus::NotReady] for its entire lifetime.
    ///
    /// NB: This must be called from inside a tokio runtime
    pub fn new(config: SourceConfig, sink: Arc<dyn PipelineSink>, source_id: Uuid) -> JsonLiveLinkSource {
        let connection = ConnectionManager::open(&config);
        let registry = Arc::new(SubjectRegistry::new());

        let receive_loop = connection.socket().map(|socket| {
            let publisher = SubjectPublisher {
                source_id,
                registry: registry.clone(),
                sink,
            };
            ReceiveLoop::spawn(socket, config.poll_interval, config.receive_buffer_size, Arc::new(publisher))
        });

        if receive_loop.is_some() {
            info!("source {} is receiving on {:?}", source_id, connection.local_addr());
        }

        JsonLiveLinkSource {
            source_id,
            connection,
            registry,
            receive_loop,
        }
    }

    pub fn source_id(&self) -> Uuid {
        self.source_id
    }

    pub fn endpoint(&self) -> Endpoint {
        self.connection.endpoint()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connection.local_addr()
    }

    pub fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    pub fn source_machine_name(&self) -> &'static str {
        SOURCE_MACHINE_NAME
    }

    pub fn status(&self) -> SourceStatus {
        match &self.receive_loop {
            None => SourceStatus::NotReady,
            Some(l) if l.is_stop_requested() => SourceStatus::Stopped,
            Some(_) => SourceStatus::Receiving,
        }
    }

    /// The subjects that were received at least once
    pub fn subject_registry(&self) -> &SubjectRegistry {
        &self.registry
    }

    pub fn is_source_still_valid(&self) -> bool {
        match &self.receive_loop {
            Some(l) => !l.is_stop_requested() && self.connection.is_ready(),
            None => false,
        }
    }

    /// Asks the receive loop to stop without waiting for it. Always succeeds.
    pub fn request_source_shutdown(&self) -> bool {
        if let Some(l) = &self.receive_loop {
            l.request_stop();
        }
        true
    }

    /// Stops the receive loop, waits for it to terminate, and releases the socket. Decoding of
    ///  datagrams that were received before may still be in progress when this returns.
    pub async fn shutdown(mut self) {
        if let Some(receive_loop) = self.receive_loop.take() {
            receive_loop.stop_and_join().await;
        }
        self.connection.close();
    }
}

impl Drop for JsonLiveLinkSource {
    fn drop(&mut self) {
        // without an async context, we can not join the receive loop here: it terminates within
        //  a poll interval, and it holds its own reference to the socket until then
        self.request_source_shutdown();
        self.connection.close();
    }
}

/// Decodes datagrams and pushes the resulting updates to the sink
struct SubjectPublisher {
    source_id: Uuid,
    registry: Arc<SubjectRegistry>,
    sink: Arc<dyn PipelineSink>,
}

impl SubjectPublisher {
    fn publish(&self, update: SubjectUpdate) {
        let subject_key = SubjectKey::new(self.source_id, update.subject_name);

        // static data is pushed with every update, the sink is expected to handle unchanged data
        self.sink.push_static(subject_key.clone(), update.static_data);
        if self.registry.observe(&subject_key.subject_name) {
            debug!("first update for subject {:?}", subject_key);
        }
        self.sink.push_frame(subject_key, update.frame_data);
    }
}

impl DatagramHandler for SubjectPublisher {
    fn on_datagram(&self, datagram: Datagram) {
        let subjects = match decode_datagram(&datagram.bytes) {
            Ok(subjects) => subjects,
            Err(e) => {
                debug!("discarding datagram from {:?}: {}", datagram.sender, e);
                return;
            }
        };

        trace!("datagram from {:?} contains {} subjects", datagram.sender, subjects.len());
        for (subject_name, result) in subjects {
            match result {
                Ok(update) => self.publish(update),
                Err(e) => debug!("discarding update for subject {:?} from {:?}: {}", subject_name, datagram.sender, e),
            }
        }
    }
}
