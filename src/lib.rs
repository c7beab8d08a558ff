//! Receives skeletal animation data as JSON over UDP and turns it into pose updates for an
//!  animation pipeline.
//!
//! A source listens on a UDP endpoint (unicast, or multicast if the endpoint's address is a
//!  multicast group). Every datagram is a self-contained snapshot: it is decoded independently of
//!  all other datagrams, and there is no acknowledgement, retransmission or reordering. Datagrams
//!  may be lost or arrive out of order, and consumers are expected to simply use the latest
//!  state they saw.
//!
//! ## Wire format
//!
//! The payload of each datagram is a UTF-8 encoded JSON object with subject names as keys:
//!
//! ```json
//! {
//!   "<SubjectName>": {
//!     "Bone": [
//!       { "Name": "<string>", "Parent": <int>, "Location": [x,y,z], "Rotation": [x,y,z,w], "Scale": [x,y,z] },
//!       ...
//!     ],
//!     "Parameter": [
//!       { "Name": "<string>", "Value": <number> },
//!       ...
//!     ]
//!   },
//!   "<AnotherSubjectName>": { ... }
//! }
//! ```
//!
//! * Both `"Bone"` and `"Parameter"` are optional.
//! * `"Parent"` is the index of the parent bone in the same `"Bone"` array, or -1 for root bones.
//! * `"Rotation"` is a unit quaternion with the scalar part last.
//! * If `"Parameter"` is present, three properties `headRoll`, `headPitch` and `headYaw` are
//!   appended after the parameters. They are derived from the rotation of the last bone.
//!
//! Malformed input is dropped silently (logged at debug level): a datagram that is not a JSON
//!  object is discarded entirely, and a subject with any structural defect is discarded without
//!  affecting the other subjects in the same datagram.
//!
//! ## Threading
//!
//! Receiving happens on a tokio task that drains all pending datagrams whenever the socket
//!  becomes readable. Decoding happens on the blocking thread pool, one task per datagram, so
//!  a slow decode or a slow sink never delays reading from the socket. The flip side is that
//!  updates may reach the [sink::PipelineSink] out of order and concurrently.

pub mod config;
pub mod decode;
pub mod net;
pub mod sink;
pub mod skeleton;
pub mod source;
pub mod subject_registry;

pub use config::{Endpoint, SourceConfig};
pub use sink::PipelineSink;
pub use skeleton::{AnimationFrameData, SkeletonStaticData, SubjectKey, Transform};
pub use source::{JsonLiveLinkSource, SourceStatus};
