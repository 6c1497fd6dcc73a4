use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use tempfile::NamedTempFile;
use tidy_shared::{Snapshot, TodoBackend, TodoDto};
use tracing::{debug, info};

/// File-backed document collections: `<name>.data` holds one todo per line,
/// `<name>.rev` the collection revision.
#[derive(Debug)]
pub struct DocumentStore {
    pub data_dir: PathBuf,
}

impl DocumentStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened document store");

        Ok(Self { data_dir })
    }

    pub fn data_path(&self, collection: &str) -> anyhow::Result<PathBuf> {
        validate_collection_name(collection)?;
        Ok(self.data_dir.join(format!("{collection}.data")))
    }

    pub fn revision_path(&self, collection: &str) -> anyhow::Result<PathBuf> {
        validate_collection_name(collection)?;
        Ok(self.data_dir.join(format!("{collection}.rev")))
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self, collection: &str) -> anyhow::Result<Snapshot> {
        let data_path = self.data_path(collection)?;
        let revision_path = self.revision_path(collection)?;

        let todos = load_jsonl(&data_path)
            .with_context(|| format!("failed to load collection {collection}"))?;
        let revision = load_revision(&revision_path)
            .with_context(|| format!("failed to load revision of {collection}"))?;

        Ok(Snapshot { revision, todos })
    }

    #[tracing::instrument(skip(self, snapshot), fields(revision = snapshot.revision, count = snapshot.todos.len()))]
    fn commit(&self, collection: &str, snapshot: &Snapshot) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.data_path(collection)?, &snapshot.todos)
            .with_context(|| format!("failed to save collection {collection}"))?;
        save_atomic(
            &self.revision_path(collection)?,
            snapshot.revision.to_string().as_bytes(),
        )
            .with_context(|| format!("failed to save revision of {collection}"))?;
        Ok(())
    }
}

impl TodoBackend for DocumentStore {
    fn snapshot(&self, collection: &str) -> anyhow::Result<Snapshot> {
        self.load(collection)
    }

    #[tracing::instrument(skip(self, todo), fields(id = %todo.id))]
    fn upsert(&self, collection: &str, todo: &TodoDto) -> anyhow::Result<()> {
        let mut snapshot = self.load(collection)?;
        snapshot.upsert(todo);
        self.commit(collection, &snapshot)
    }

    #[tracing::instrument(skip(self))]
    fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        let mut snapshot = self.load(collection)?;
        if !snapshot.remove(id) {
            debug!("document already absent");
            return Ok(());
        }
        self.commit(collection, &snapshot)
    }
}

fn validate_collection_name(collection: &str) -> anyhow::Result<()> {
    if collection.is_empty() {
        bail!("collection name cannot be empty");
    }
    if !collection
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("invalid collection name: {collection}");
    }
    Ok(())
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<TodoDto>> {
    debug!(file = %path.display(), "loading jsonl");
    if !path.exists() {
        return Ok(vec![]);
    }

    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let todo: TodoDto = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(todo);
    }

    debug!(count = out.len(), "loaded todos from jsonl");
    Ok(out)
}

fn load_revision(path: &Path) -> anyhow::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u64>()
        .with_context(|| format!("corrupt revision in {}: {trimmed}", path.display()))
}

#[tracing::instrument(skip(path, todos))]
fn save_jsonl_atomic(path: &Path, todos: &[TodoDto]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = todos.len(), "saving jsonl atomically");

    let mut payload = Vec::new();
    for todo in todos {
        serde_json::to_writer(&mut payload, todo)?;
        payload.push(b'\n');
    }

    save_atomic(path, &payload)
}

fn save_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use tidy_shared::{TodoBackend, TodoDto};

    use super::DocumentStore;

    fn todo(id: &str, title: &str) -> TodoDto {
        TodoDto {
            id: id.to_string(),
            title: title.to_string(),
            is_complete: false,
        }
    }

    #[test]
    fn missing_collection_is_empty_at_revision_zero() {
        let temp = tempdir().expect("tempdir");
        let store = DocumentStore::open(temp.path()).expect("open store");

        let snap = store.snapshot("todo-list").expect("snapshot");
        assert_eq!(snap.revision, 0);
        assert!(snap.todos.is_empty());
    }

    #[test]
    fn upsert_replaces_and_bumps_revision() {
        let temp = tempdir().expect("tempdir");
        let store = DocumentStore::open(temp.path()).expect("open store");

        store.upsert("todo-list", &todo("1", "a")).expect("insert");
        store.upsert("todo-list", &todo("2", "b")).expect("insert");
        store
            .upsert("todo-list", &todo("1", "renamed"))
            .expect("replace");

        let snap = store.snapshot("todo-list").expect("snapshot");
        assert_eq!(snap.revision, 3);
        assert_eq!(snap.todos.len(), 2);
        assert_eq!(snap.todos[0].title, "renamed");
    }

    #[test]
    fn delete_of_absent_id_keeps_revision() {
        let temp = tempdir().expect("tempdir");
        let store = DocumentStore::open(temp.path()).expect("open store");

        store.upsert("todo-list", &todo("1", "a")).expect("insert");
        store.delete("todo-list", "1").expect("delete");
        store.delete("todo-list", "1").expect("delete again");

        let snap = store.snapshot("todo-list").expect("snapshot");
        assert_eq!(snap.revision, 2);
        assert!(snap.todos.is_empty());
    }

    #[test]
    fn rejects_path_like_collection_names() {
        let temp = tempdir().expect("tempdir");
        let store = DocumentStore::open(temp.path()).expect("open store");

        assert!(store.snapshot("../escape").is_err());
        assert!(store.upsert("", &todo("1", "a")).is_err());
    }

    #[test]
    fn corrupt_lines_report_location() {
        let temp = tempdir().expect("tempdir");
        let store = DocumentStore::open(temp.path()).expect("open store");
        fs::write(temp.path().join("todo-list.data"), "{not json}\n").expect("write");

        let err = store.snapshot("todo-list").expect_err("corrupt data");
        assert!(format!("{err:#}").contains("line 1"));
    }
}
