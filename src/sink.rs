#[cfg(test)] use mockall::automock;

use crate::skeleton::{AnimationFrameData, SkeletonStaticData, SubjectKey};

/// The animation pipeline that decoded updates are pushed into.
///
/// Pushes happen from decode tasks, i.e. from arbitrary threads and possibly concurrently, so
///  implementations must do their own synchronization. Ownership of the data passes to the sink.
#[cfg_attr(test, automock)]
pub trait PipelineSink: Send + Sync + 'static {
    fn push_static(&self, subject_key: SubjectKey, static_data: SkeletonStaticData);

    fn push_frame(&self, subject_key: SubjectKey, frame_data: AnimationFrameData);
}
