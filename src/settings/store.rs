use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use super::Settings;

type BoundSettings = Arc<dyn Any + Send + Sync>;

struct Entry {
    name: &'static str,
    settings: BoundSettings,
}

/// Bound settings instances keyed by type.
///
/// Built once by [`SettingsRegistrar::bind`](super::SettingsRegistrar::bind)
/// and shared read-only afterwards; cloning only bumps a reference count.
#[derive(Clone, Default)]
pub struct SettingsStore {
    entries: Arc<HashMap<TypeId, Entry>>,
}

impl SettingsStore {
    pub(crate) fn from_bound(bound: Vec<(TypeId, &'static str, BoundSettings)>) -> Self {
        let entries = bound
            .into_iter()
            .map(|(type_id, name, settings)| (type_id, Entry { name, settings }))
            .collect();

        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the instance bound for `T`, if `T` was registered.
    pub fn get<T: Settings>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(&entry.settings).downcast::<T>().ok())
    }

    /// Section names of every bound variant, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.names())
            .finish()
    }
}
