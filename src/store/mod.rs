/// In-memory record stores
///
/// Each service owns exactly one store. A store keeps its records in
/// insertion order together with a monotonically increasing id counter;
/// ids are never reused, even after deletion. All mutations run under a
/// single write guard so writes to one store never interleave.

pub mod blog;
pub mod comment;
pub mod notification;
pub mod user;

pub use blog::{Blog, BlogPatch, BlogStore, NewBlog};
pub use comment::{Comment, CommentPatch, CommentStore, NewComment};
pub use notification::{
    NewBroadcast, NewNotification, Notification, NotificationFilter, NotificationStore, Priority,
};
pub use user::{NewUser, Role, User, UserPatch, UserStore};

use crate::error::{MeshError, MeshResult};
use serde::{de, Deserialize, Deserializer};
use tokio::sync::RwLock;

/// An entity held by a [`RecordStore`]
pub trait Record: Clone + Send + Sync + 'static {
    /// Human-readable entity name used in error messages ("Blog")
    const KIND: &'static str;

    fn id(&self) -> u64;
}

struct StoreInner<T> {
    records: Vec<T>,
    next_id: u64,
}

impl<T: Record> StoreInner<T> {
    fn position(&self, id: u64) -> MeshResult<usize> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| not_found::<T>())
    }
}

/// Generic insertion-ordered record collection
pub struct RecordStore<T: Record> {
    inner: RwLock<StoreInner<T>>,
}

impl<T: Record> RecordStore<T> {
    /// Create an empty store whose first id is 1
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a store pre-populated with seed records.
    /// The id counter starts above the highest seed id.
    pub fn with_records(records: Vec<T>) -> Self {
        let next_id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(StoreInner { records, next_id }),
        }
    }

    /// Insert a record built from the next id.
    ///
    /// `build` sees the current records so it can enforce uniqueness.
    /// The id is only consumed when `build` succeeds.
    pub async fn insert<F>(&self, build: F) -> MeshResult<T>
    where
        F: FnOnce(u64, &[T]) -> MeshResult<T>,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        let record = build(id, &inner.records)?;
        inner.next_id += 1;
        inner.records.push(record.clone());
        Ok(record)
    }

    /// Point lookup
    pub async fn get(&self, id: u64) -> MeshResult<T> {
        let inner = self.inner.read().await;
        let idx = inner.position(id)?;
        Ok(inner.records[idx].clone())
    }

    pub async fn contains(&self, id: u64) -> bool {
        let inner = self.inner.read().await;
        inner.records.iter().any(|r| r.id() == id)
    }

    /// Snapshot of all records in insertion order
    pub async fn list(&self) -> Vec<T> {
        self.inner.read().await.records.clone()
    }

    /// Records matching `predicate`, in insertion order
    pub async fn list_where<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        let inner = self.inner.read().await;
        inner
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub async fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let inner = self.inner.read().await;
        inner.records.iter().filter(|r| predicate(r)).count()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Apply `apply` to a draft copy of record `id` and commit it only if
    /// `apply` succeeds. `apply` also sees the committed records so it can
    /// check uniqueness against them.
    pub async fn update<F>(&self, id: u64, apply: F) -> MeshResult<T>
    where
        F: FnOnce(&mut T, &[T]) -> MeshResult<()>,
    {
        let mut inner = self.inner.write().await;
        let idx = inner.position(id)?;
        let mut draft = inner.records[idx].clone();
        apply(&mut draft, &inner.records)?;
        inner.records[idx] = draft.clone();
        Ok(draft)
    }

    /// Mutate every record matching `predicate`, returning how many changed
    pub async fn update_where<P, F>(&self, predicate: P, mut apply: F) -> usize
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut inner = self.inner.write().await;
        let mut changed = 0;
        for record in inner.records.iter_mut().filter(|r| predicate(r)) {
            apply(record);
            changed += 1;
        }
        changed
    }

    /// Remove and return record `id`
    pub async fn remove(&self, id: u64) -> MeshResult<T> {
        let mut inner = self.inner.write().await;
        let idx = inner.position(id)?;
        Ok(inner.records.remove(idx))
    }

    /// Remove every record matching `predicate`, returning how many were removed
    pub async fn remove_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|r| !predicate(r));
        before - inner.records.len()
    }
}

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// `NotFound` error for an entity kind
pub fn not_found<T: Record>() -> MeshError {
    MeshError::NotFound(format!("{} not found", T::KIND))
}

/// Treat blank strings as "not provided"
pub(crate) fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accept a reference id either as a JSON number or as a numeric string
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => Ok(Some(n)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a numeric id, got {:?}", s))),
    }
}
