use std::sync::Mutex;
use rustc_hash::FxHashSet;

/// Record of the subject names a source has seen so far. Entries are never removed: the registry
///  lives exactly as long as its source.
#[derive(Debug, Default)]
pub struct SubjectRegistry {
    subjects: Mutex<FxHashSet<String>>,
}

impl SubjectRegistry {
    pub fn new() -> SubjectRegistry {
        Default::default()
    }

    pub fn contains(&self, subject_name: &str) -> bool {
        self.subjects.lock().unwrap()
            .contains(subject_name)
    }

    pub fn insert(&self, subject_name: &str) {
        self.observe(subject_name);
    }

    /// Records the subject, returning `true` if it was not known before. Check and insert happen
    ///  under the same lock, so concurrent decode tasks agree on which one saw a subject first.
    pub fn observe(&self, subject_name: &str) -> bool {
        let mut subjects = self.subjects.lock().unwrap();
        if subjects.contains(subject_name) {
            false
        }
        else {
            subjects.insert(subject_name.to_string())
        }
    }

    pub fn len(&self) -> usize {
        self.subjects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
