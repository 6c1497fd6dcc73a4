use std::cell::{
  Cell,
  RefCell
};
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::TodoDto;

/// Full point-in-time copy of a
/// collection.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Snapshot {
  #[serde(default)]
  pub revision: u64,
  #[serde(default)]
  pub todos:    Vec<TodoDto>
}

impl Snapshot {
  /// Replaces the todo with the same id in
  /// place, or appends it. Always bumps the
  /// revision.
  pub fn upsert(&mut self, todo: &TodoDto) {
    match self
      .todos
      .iter_mut()
      .find(|existing| existing.id == todo.id)
    {
      | Some(existing) => {
        *existing = todo.clone();
      }
      | None => self.todos.push(todo.clone())
    }
    self.revision += 1;
  }

  /// Returns whether a todo was removed.
  /// The revision only moves when it was.
  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.todos.len();
    self.todos.retain(|todo| todo.id != id);
    if self.todos.len() == before {
      return false;
    }
    self.revision += 1;
    true
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum SyncStatus {
  Loading,
  Ready
}

/// Document collection the to-do list is
/// persisted in.
///
/// Every successful mutation must bump the
/// collection revision so subscribers see
/// a new snapshot.
pub trait TodoBackend {
  fn snapshot(
    &self,
    collection: &str
  ) -> anyhow::Result<Snapshot>;

  /// Insert or replace by `todo.id`.
  fn upsert(
    &self,
    collection: &str,
    todo: &TodoDto
  ) -> anyhow::Result<()>;

  /// Removing an absent id is not an
  /// error.
  fn delete(
    &self,
    collection: &str,
    id: &str
  ) -> anyhow::Result<()>;

  fn subscribe(
    &self,
    collection: &str
  ) -> Subscription<&Self> {
    Subscription::new(self, collection)
  }
}

impl<T: TodoBackend + ?Sized> TodoBackend
  for &T
{
  fn snapshot(
    &self,
    collection: &str
  ) -> anyhow::Result<Snapshot> {
    (**self).snapshot(collection)
  }

  fn upsert(
    &self,
    collection: &str,
    todo: &TodoDto
  ) -> anyhow::Result<()> {
    (**self).upsert(collection, todo)
  }

  fn delete(
    &self,
    collection: &str,
    id: &str
  ) -> anyhow::Result<()> {
    (**self).delete(collection, id)
  }
}

impl<T: TodoBackend + ?Sized> TodoBackend
  for Rc<T>
{
  fn snapshot(
    &self,
    collection: &str
  ) -> anyhow::Result<Snapshot> {
    (**self).snapshot(collection)
  }

  fn upsert(
    &self,
    collection: &str,
    todo: &TodoDto
  ) -> anyhow::Result<()> {
    (**self).upsert(collection, todo)
  }

  fn delete(
    &self,
    collection: &str,
    id: &str
  ) -> anyhow::Result<()> {
    (**self).delete(collection, id)
  }
}

/// Lazy stream of snapshots. Emits the
/// first snapshot unconditionally, then
/// only when the revision moves.
#[derive(Debug)]
pub struct Subscription<B> {
  backend:       B,
  collection:    String,
  last_revision: Option<u64>
}

impl<B: TodoBackend> Subscription<B> {
  pub fn new(
    backend: B,
    collection: &str
  ) -> Self {
    Self {
      backend,
      collection: collection.to_string(),
      last_revision: None
    }
  }

  pub fn status(&self) -> SyncStatus {
    if self.last_revision.is_some() {
      SyncStatus::Ready
    } else {
      SyncStatus::Loading
    }
  }

  pub fn poll(
    &mut self
  ) -> anyhow::Result<Option<Snapshot>>
  {
    let snapshot = self
      .backend
      .snapshot(&self.collection)?;

    if self.last_revision
      == Some(snapshot.revision)
    {
      return Ok(None);
    }

    debug!(
      collection = %self.collection,
      revision = snapshot.revision,
      count = snapshot.todos.len(),
      "subscription emitted snapshot"
    );
    self.last_revision =
      Some(snapshot.revision);
    Ok(Some(snapshot))
  }
}

/// In-process collection store, mostly for
/// tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  collections:
    RefCell<BTreeMap<String, Snapshot>>,
  fail_writes: Cell<bool>
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_todos(
    collection: &str,
    todos: Vec<TodoDto>
  ) -> Self {
    let backend = Self::new();
    backend.collections.borrow_mut().insert(
      collection.to_string(),
      Snapshot {
        revision: 1,
        todos
      }
    );
    backend
  }

  /// Make subsequent writes fail, to
  /// simulate an unreachable store.
  pub fn set_fail_writes(
    &self,
    fail: bool
  ) {
    self.fail_writes.set(fail);
  }

  fn ensure_writable(
    &self
  ) -> anyhow::Result<()> {
    if self.fail_writes.get() {
      return Err(anyhow!(
        "backend is rejecting writes"
      ));
    }
    Ok(())
  }
}

impl TodoBackend for MemoryBackend {
  fn snapshot(
    &self,
    collection: &str
  ) -> anyhow::Result<Snapshot> {
    Ok(
      self
        .collections
        .borrow()
        .get(collection)
        .cloned()
        .unwrap_or_default()
    )
  }

  fn upsert(
    &self,
    collection: &str,
    todo: &TodoDto
  ) -> anyhow::Result<()> {
    self.ensure_writable()?;
    let mut collections =
      self.collections.borrow_mut();
    collections
      .entry(collection.to_string())
      .or_default()
      .upsert(todo);
    Ok(())
  }

  fn delete(
    &self,
    collection: &str,
    id: &str
  ) -> anyhow::Result<()> {
    self.ensure_writable()?;
    let mut collections =
      self.collections.borrow_mut();
    if let Some(entry) =
      collections.get_mut(collection)
    {
      entry.remove(id);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::{
    MemoryBackend,
    Snapshot,
    SyncStatus,
    TodoBackend
  };
  use crate::TodoDto;

  const COLLECTION: &str = "todos";

  fn todo(
    id: &str,
    title: &str
  ) -> TodoDto {
    TodoDto {
      id:          id.to_string(),
      title:       title.to_string(),
      is_complete: false
    }
  }

  #[test]
  fn subscription_emits_only_on_revision_change()
   {
    let backend = MemoryBackend::new();
    let mut sub =
      backend.subscribe(COLLECTION);
    assert_eq!(
      sub.status(),
      SyncStatus::Loading
    );

    let first = sub
      .poll()
      .unwrap()
      .expect("first snapshot");
    assert!(first.todos.is_empty());
    assert_eq!(
      sub.status(),
      SyncStatus::Ready
    );
    assert!(sub.poll().unwrap().is_none());

    backend
      .upsert(COLLECTION, &todo("1", "a"))
      .unwrap();
    let second = sub
      .poll()
      .unwrap()
      .expect("snapshot after write");
    assert_eq!(second.todos.len(), 1);
    assert!(sub.poll().unwrap().is_none());
  }

  #[test]
  fn snapshot_upsert_replaces_or_appends() {
    let mut snap = Snapshot {
      revision: 4,
      todos:    vec![
        todo("1", "a"),
        todo("2", "b"),
      ]
    };

    snap.upsert(&todo("1", "renamed"));
    assert_eq!(snap.revision, 5);
    assert_eq!(
      snap.todos,
      vec![todo("1", "renamed"), todo("2", "b")]
    );

    snap.upsert(&todo("3", "c"));
    assert_eq!(snap.revision, 6);
    assert_eq!(snap.todos[2], todo("3", "c"));
  }

  #[test]
  fn snapshot_remove_moves_revision_only_on_change()
   {
    let mut snap = Snapshot {
      revision: 1,
      todos:    vec![todo("1", "a")]
    };

    assert!(!snap.remove("missing"));
    assert_eq!(snap.revision, 1);

    assert!(snap.remove("1"));
    assert_eq!(snap.revision, 2);
    assert!(snap.todos.is_empty());

    assert!(!snap.remove("1"));
    assert_eq!(snap.revision, 2);
  }

  #[test]
  fn upsert_replaces_in_place() {
    let backend =
      MemoryBackend::with_todos(
        COLLECTION,
        vec![todo("1", "a"), todo("2", "b")]
      );
    backend
      .upsert(
        COLLECTION,
        &todo("1", "renamed")
      )
      .unwrap();

    let snap =
      backend.snapshot(COLLECTION).unwrap();
    assert_eq!(snap.todos.len(), 2);
    assert_eq!(snap.todos[0].title, "renamed");
    assert_eq!(snap.revision, 2);
  }

  #[test]
  fn delete_is_idempotent() {
    let backend =
      MemoryBackend::with_todos(
        COLLECTION,
        vec![todo("1", "a")]
      );
    backend.delete(COLLECTION, "1").unwrap();
    let after_first =
      backend.snapshot(COLLECTION).unwrap();
    backend.delete(COLLECTION, "1").unwrap();
    backend
      .delete("elsewhere", "1")
      .unwrap();
    let after_second =
      backend.snapshot(COLLECTION).unwrap();

    assert!(after_first.todos.is_empty());
    assert_eq!(after_first, after_second);
  }

  #[test]
  fn failing_backend_rejects_writes() {
    let backend = MemoryBackend::new();
    backend.set_fail_writes(true);
    assert!(
      backend
        .upsert(COLLECTION, &todo("1", "a"))
        .is_err()
    );
    assert!(
      backend
        .snapshot(COLLECTION)
        .unwrap()
        .todos
        .is_empty()
    );
  }
}
