use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// Sentinel parent index for root bones
pub const NO_PARENT: i32 = -1;

/// Names of the properties that carry the derived head orientation. They are appended after the
///  parameters of an update, in this order.
pub const HEAD_ROLL: &str = "headRoll";
pub const HEAD_PITCH: &str = "headPitch";
pub const HEAD_YAW: &str = "headYaw";

/// A bone's transform relative to its parent. The rotation is a unit quaternion in x, y, z, w order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: [f64; 3],
    pub rotation: [f64; 4],
    pub scale: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

/// Per-subject description of the skeleton: bone hierarchy and the names of scalar properties.
///
/// `bone_names` and `bone_parents` are index aligned, and parent indices refer to positions in
///  `bone_names`. `property_names` is index aligned with [AnimationFrameData::property_values].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonStaticData {
    pub bone_names: Vec<String>,
    pub bone_parents: Vec<i32>,
    pub property_names: Vec<String>,
}

/// Per-subject pose snapshot for a single update
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationFrameData {
    pub transforms: Vec<Transform>,
    pub property_values: Vec<f32>,
}

/// The complete result of decoding one subject's entry in a datagram
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectUpdate {
    pub subject_name: String,
    pub static_data: SkeletonStaticData,
    pub frame_data: AnimationFrameData,
}

/// Identifies a subject in the animation pipeline: the same subject name streamed through two
///  different sources are two different subjects.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SubjectKey {
    pub source_id: Uuid,
    pub subject_name: String,
}
impl SubjectKey {
    pub fn new(source_id: Uuid, subject_name: impl Into<String>) -> SubjectKey {
        SubjectKey {
            source_id,
            subject_name: subject_name.into(),
        }
    }
}

impl Debug for SubjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}@{}]", self.subject_name, self.source_id)
    }
}
