use {
    interleave_core::{Artifact, QualifiedName},
    parking_lot::Mutex,
    std::{
        collections::HashMap,
        sync::{Arc, OnceLock},
    },
};

/// One name's critical section and its published artifact. The cell is only set while `lock` is
/// held, and is read without it.
#[derive(Debug, Default)]
struct Slot {
    lock: Mutex<()>,
    published: OnceLock<Arc<Artifact>>,
}

/// Maps names to artifacts, populating each name at most once.
///
/// Every name owns a slot with its own lock, which doubles as that name's critical section.
/// The map lock is only held to find or create a slot, so loads of unrelated names never wait
/// on each other. Readers of a published artifact never take the slot lock.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    slots: Mutex<HashMap<QualifiedName, Arc<Slot>>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the published artifact, if any. A load still in flight counts as absent.
    pub fn get(&self, name: &QualifiedName) -> Option<Arc<Artifact>> {
        let slot = self.slots.lock().get(name).cloned()?;
        slot.published.get().cloned()
    }

    /// Returns the cached artifact or runs `init` inside the name's critical section and
    /// publishes its result. Concurrent callers for the same name block until the first one
    /// finishes. A failed `init` publishes nothing.
    pub fn get_or_try_insert_with<E>(
        &self,
        name: &QualifiedName,
        init: impl FnOnce() -> Result<Arc<Artifact>, E>,
    ) -> Result<Arc<Artifact>, E> {
        let slot = Arc::clone(self.slots.lock().entry(name.clone()).or_default());
        if let Some(artifact) = slot.published.get() {
            return Ok(Arc::clone(artifact));
        }
        let _guard = slot.lock.lock();
        if let Some(artifact) = slot.published.get() {
            return Ok(Arc::clone(artifact));
        }
        let artifact = init()?;
        Ok(Arc::clone(slot.published.get_or_init(|| artifact)))
    }

    /// The number of published artifacts.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.published.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
