/// Tag-invalidated query cache
///
/// Entries are keyed by `(ResourceTag, path)`. A mutation does not patch
/// cached data; it marks every entry under the affected tags stale, and the
/// next read of a stale entry goes back to the server.
///
/// ```text
/// read  (Missing | Stale) ──fetch──▶ insert ──▶ Fresh
/// read  Fresh             ─────────▶ cached value
/// write ──invalidate(tags)──▶ Fresh entries under those tags become Stale
/// ```
///
/// Each tag also carries a generation that every invalidation bumps. A
/// reader snapshots it before fetching and stores the response with
/// [`QueryCache::insert_fetched`], so a response that raced a mutation lands
/// stale instead of fresh.
///
/// The cache is storage only and knows nothing about HTTP;
/// [`crate::cached::CachedPortal`] wires it to a [`crate::PortalClient`].
///
/// # Example
///
/// ```
/// use memberportal_client::cache::{FetchStatus, QueryCache, ResourceTag};
///
/// let mut cache = QueryCache::new();
/// cache.insert(ResourceTag::Tasks, "/api/tasks", vec![1, 2, 3]);
/// assert_eq!(cache.status(ResourceTag::Tasks, "/api/tasks"), FetchStatus::Fresh);
///
/// cache.invalidate(ResourceTag::Tasks);
/// assert_eq!(cache.status(ResourceTag::Tasks, "/api/tasks"), FetchStatus::Stale);
///
/// // Stale data stays readable while a refetch is pending
/// assert_eq!(cache.get::<Vec<i32>>(ResourceTag::Tasks, "/api/tasks"), Some(vec![1, 2, 3]));
/// ```

use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Resource family a cached response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceTag {
    /// The logged-in user (`/api/user`)
    CurrentUser,
    Users,
    Tasks,
    Warnings,
    Bans,
    Tickets,
}

impl ResourceTag {
    pub const ALL: [ResourceTag; 6] = [
        ResourceTag::CurrentUser,
        ResourceTag::Users,
        ResourceTag::Tasks,
        ResourceTag::Warnings,
        ResourceTag::Bans,
        ResourceTag::Tickets,
    ];
}

/// Observable state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Cached and not invalidated since
    Fresh,

    /// Cached, but a related mutation happened; refetch on next read
    Stale,

    /// Never fetched, or dropped
    Missing,
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: DateTime<Utc>,
    stale: bool,
}

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<(ResourceTag, String), Entry>,
    generations: HashMap<ResourceTag, u64>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, tag: ResourceTag, path: &str) -> FetchStatus {
        match self.entries.get(&(tag, path.to_string())) {
            None => FetchStatus::Missing,
            Some(entry) if entry.stale => FetchStatus::Stale,
            Some(_) => FetchStatus::Fresh,
        }
    }

    /// Cached value regardless of staleness
    ///
    /// Returns `None` if nothing is cached or the entry holds another type.
    pub fn get<T>(&self, tag: ResourceTag, path: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&(tag, path.to_string()))
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    /// Cached value only if it is fresh
    pub fn get_fresh<T>(&self, tag: ResourceTag, path: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.status(tag, path) {
            FetchStatus::Fresh => self.get(tag, path),
            _ => None,
        }
    }

    /// When the entry was last fetched
    pub fn fetched_at(&self, tag: ResourceTag, path: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(&(tag, path.to_string()))
            .map(|entry| entry.fetched_at)
    }

    /// Invalidation counter for `tag`
    pub fn generation(&self, tag: ResourceTag) -> u64 {
        self.generations.get(&tag).copied().unwrap_or(0)
    }

    /// Stores a freshly fetched value
    pub fn insert<T>(&mut self, tag: ResourceTag, path: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.store(tag, path, value, false);
    }

    /// Stores a value fetched when `tag` was at `generation`
    ///
    /// If `tag` was invalidated since, the value is kept but marked stale.
    /// Returns whether it was stored fresh.
    pub fn insert_fetched<T>(&mut self, tag: ResourceTag, path: &str, value: T, generation: u64) -> bool
    where
        T: Send + Sync + 'static,
    {
        let current = self.generation(tag) == generation;
        if !current {
            tracing::debug!(?tag, path, "Fetched value raced an invalidation; stored stale");
        }

        self.store(tag, path, value, !current);
        current
    }

    fn store<T>(&mut self, tag: ResourceTag, path: &str, value: T, stale: bool)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(
            (tag, path.to_string()),
            Entry {
                value: Arc::new(value),
                fetched_at: Utc::now(),
                stale,
            },
        );
    }

    /// Marks every entry under `tag` stale; returns how many were fresh
    pub fn invalidate(&mut self, tag: ResourceTag) -> usize {
        *self.generations.entry(tag).or_insert(0) += 1;

        let mut invalidated = 0;

        for ((entry_tag, _), entry) in self.entries.iter_mut() {
            if *entry_tag == tag && !entry.stale {
                entry.stale = true;
                invalidated += 1;
            }
        }

        if invalidated > 0 {
            tracing::debug!(?tag, invalidated, "Cache entries invalidated");
        }

        invalidated
    }

    pub fn invalidate_all(&mut self, tags: &[ResourceTag]) -> usize {
        tags.iter().map(|tag| self.invalidate(*tag)).sum()
    }

    /// Drops every entry
    ///
    /// Generations still advance, so fetches started before the clear
    /// cannot come back fresh.
    pub fn clear(&mut self) {
        self.entries.clear();
        for tag in ResourceTag::ALL {
            *self.generations.entry(tag).or_insert(0) += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
