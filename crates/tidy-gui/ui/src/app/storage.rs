use anyhow::anyhow;
use tidy_shared::{
  Snapshot,
  TodoBackend,
  TodoDto
};
use wasm_bindgen::JsValue;

const COLLECTION_STORAGE_PREFIX: &str =
  "tidy.collection.";

/// Browser `localStorage` as a document
/// store. Each collection is one JSON
/// encoded snapshot.
#[derive(Debug, Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
  fn storage()
  -> anyhow::Result<web_sys::Storage> {
    web_sys::window()
      .and_then(|window| {
        window
          .local_storage()
          .ok()
          .flatten()
      })
      .ok_or_else(|| {
        anyhow!(
          "local storage is unavailable"
        )
      })
  }

  fn key(collection: &str) -> String {
    format!(
      "{COLLECTION_STORAGE_PREFIX}{collection}"
    )
  }

  fn load(
    collection: &str
  ) -> anyhow::Result<Snapshot> {
    let stored = Self::storage()?
      .get_item(&Self::key(collection))
      .map_err(js_error)?;

    Ok(
      stored
        .map(|raw| {
          parse_snapshot(collection, &raw)
        })
        .unwrap_or_default()
    )
  }

  fn save(
    collection: &str,
    snapshot: &Snapshot
  ) -> anyhow::Result<()> {
    let json =
      serde_json::to_string(snapshot)?;
    Self::storage()?
      .set_item(
        &Self::key(collection),
        &json
      )
      .map_err(js_error)
  }
}

impl TodoBackend for LocalStorageBackend {
  fn snapshot(
    &self,
    collection: &str
  ) -> anyhow::Result<Snapshot> {
    Self::load(collection)
  }

  fn upsert(
    &self,
    collection: &str,
    todo: &TodoDto
  ) -> anyhow::Result<()> {
    let mut snapshot =
      Self::load(collection)?;
    snapshot.upsert(todo);

    Self::save(collection, &snapshot)?;
    tracing::debug!(
      collection,
      id = %todo.id,
      revision = snapshot.revision,
      "saved todo"
    );
    Ok(())
  }

  fn delete(
    &self,
    collection: &str,
    id: &str
  ) -> anyhow::Result<()> {
    let mut snapshot =
      Self::load(collection)?;
    if !snapshot.remove(id) {
      return Ok(());
    }

    Self::save(collection, &snapshot)?;
    tracing::debug!(
      collection,
      id,
      revision = snapshot.revision,
      "deleted todo"
    );
    Ok(())
  }
}

fn parse_snapshot(
  collection: &str,
  raw: &str
) -> Snapshot {
  match serde_json::from_str::<Snapshot>(raw)
  {
    | Ok(snapshot) => snapshot,
    | Err(error) => {
      tracing::error!(
        %error,
        collection,
        "failed parsing todo \
         collection from local \
         storage"
      );
      Snapshot::default()
    }
  }
}

fn js_error(
  value: JsValue
) -> anyhow::Error {
  anyhow!("storage error: {value:?}")
}

#[cfg(test)]
mod tests {
  use tidy_shared::Snapshot;

  use super::{
    LocalStorageBackend,
    parse_snapshot
  };

  #[test]
  fn collections_are_namespaced() {
    assert_eq!(
      LocalStorageBackend::key("todo-list"),
      "tidy.collection.todo-list"
    );
  }

  #[test]
  fn stored_snapshot_is_read_back() {
    let raw = r#"{"revision":3,"todos":[{"id":"1","title":"Buy milk","isComplete":true}]}"#;
    let snapshot =
      parse_snapshot("todo-list", raw);

    assert_eq!(snapshot.revision, 3);
    assert_eq!(snapshot.todos.len(), 1);
    assert!(snapshot.todos[0].is_complete);
  }

  #[test]
  fn corrupt_storage_reads_as_empty() {
    assert_eq!(
      parse_snapshot("todo-list", "{not json"),
      Snapshot::default()
    );
  }
}
