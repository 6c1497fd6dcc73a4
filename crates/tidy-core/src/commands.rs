use anyhow::{Context, anyhow};
use tidy_shared::{Effect, TodoBackend, TodoDto, TodoListController};
use tracing::{debug, info, instrument, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::render::Renderer;

/// Runs one command against `backend`: sync the controller from the current
/// snapshot, apply the operation, carry out its effects, print the list.
#[instrument(skip(backend, cfg, renderer, command))]
pub fn dispatch<B: TodoBackend>(
    backend: &B,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<TodoListController> {
    let collection = cfg.collection();
    let mut controller = TodoListController::new();
    controller.set_filter(cfg.default_filter());

    let mut subscription = backend.subscribe(&collection);
    if let Some(snapshot) = subscription
        .poll()
        .with_context(|| format!("failed to read collection {collection}"))?
    {
        controller.apply_snapshot(snapshot);
    }

    debug!(?command, collection = %collection, "dispatching command");

    let effects = match command {
        Command::List { filter } => {
            if let Some(raw) = filter {
                controller.set_filter_str(&raw);
            }
            vec![]
        }
        Command::Add { words } => {
            info!("command add");
            controller.add_todo(TodoDto::new(words.join(" ")))
        }
        Command::Edit { id, words } => {
            info!("command edit");
            let id = resolve_id(&controller, &id)?;
            let Some(target) = controller.todos().iter().find(|todo| todo.id == id).cloned()
            else {
                return Err(anyhow!("no todo with id {id}"));
            };
            controller.begin_edit(&target.id);
            let updated = TodoDto {
                title: words.join(" "),
                ..target
            };
            controller.submit_edit_form(updated)?
        }
        Command::Done { id } => {
            info!("command done");
            let id = resolve_id(&controller, &id)?;
            if !controller.todos().iter().any(|todo| todo.id == id) {
                return Err(anyhow!("no todo with id {id}"));
            }
            controller.complete_todo(&id)
        }
        Command::Delete { id } => {
            info!("command delete");
            let id = resolve_id(&controller, &id)?;
            controller.delete_todo(&id)
        }
    };

    if effects.is_empty() && controller.is_editing() {
        warn!("title was blank; nothing changed");
    }

    run_effects(backend, &collection, &effects)?;

    renderer.print_list(&controller.list_display(), controller.filter())?;
    Ok(controller)
}

#[instrument(skip(backend, effects), fields(count = effects.len()))]
pub fn run_effects<B: TodoBackend>(
    backend: &B,
    collection: &str,
    effects: &[Effect],
) -> anyhow::Result<()> {
    for effect in effects {
        match effect {
            Effect::Upsert(todo) => backend
                .upsert(collection, todo)
                .with_context(|| format!("failed to save todo {}", todo.id))?,
            Effect::Delete(id) => backend
                .delete(collection, id)
                .with_context(|| format!("failed to delete todo {id}"))?,
            Effect::ScrollToTop => {}
        }
    }
    Ok(())
}

/// Expands a unique id prefix to the full id. Unknown or ambiguous prefixes
/// come back unchanged.
pub fn resolve_id(controller: &TodoListController, raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("todo id cannot be empty"));
    }

    if controller.todos().iter().any(|todo| todo.id == raw) {
        return Ok(raw.to_string());
    }

    let mut matches = controller
        .todos()
        .iter()
        .filter(|todo| todo.id.starts_with(raw));
    match (matches.next(), matches.next()) {
        (Some(only), None) => {
            debug!(prefix = %raw, id = %only.id, "expanded id prefix");
            Ok(only.id.clone())
        }
        (Some(_), Some(_)) => {
            warn!(prefix = %raw, "ambiguous id prefix");
            Ok(raw.to_string())
        }
        _ => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use tidy_shared::{
        Effect, MemoryBackend, Snapshot, TODO_LIST_COLLECTION, TodoBackend, TodoDto,
        TodoListController,
    };

    use super::{dispatch, resolve_id, run_effects};
    use crate::cli::Command;
    use crate::config::Config;
    use crate::render::Renderer;

    fn todo(id: &str, title: &str, is_complete: bool) -> TodoDto {
        TodoDto {
            id: id.to_string(),
            title: title.to_string(),
            is_complete,
        }
    }

    fn seeded() -> MemoryBackend {
        MemoryBackend::with_todos(
            TODO_LIST_COLLECTION,
            vec![
                todo("a1b2", "Buy milk", false),
                todo("a1c3", "Walk dog", true),
            ],
        )
    }

    fn run(backend: &MemoryBackend, command: Command) -> anyhow::Result<TodoListController> {
        let cfg = Config::default();
        let renderer = Renderer::new(&cfg);
        dispatch(backend, &cfg, &renderer, command)
    }

    #[test]
    fn add_writes_new_document() {
        let backend = seeded();
        let controller = run(
            &backend,
            Command::Add {
                words: vec!["Call".to_string(), "mum".to_string()],
            },
        )
        .expect("add");

        assert_eq!(controller.todos()[0].title, "Call mum");
        let snap = backend.snapshot(TODO_LIST_COLLECTION).expect("snapshot");
        assert_eq!(snap.todos.len(), 3);
        assert!(snap.todos.iter().any(|t| t.id == controller.todos()[0].id));
    }

    #[test]
    fn blank_add_writes_nothing() {
        let backend = seeded();
        run(
            &backend,
            Command::Add {
                words: vec!["  ".to_string()],
            },
        )
        .expect("add");

        let snap = backend.snapshot(TODO_LIST_COLLECTION).expect("snapshot");
        assert_eq!(snap.todos.len(), 2);
        assert_eq!(snap.revision, 1);
    }

    #[test]
    fn edit_and_done_accept_prefixes() {
        let backend = seeded();
        run(
            &backend,
            Command::Edit {
                id: "a1b".to_string(),
                words: vec!["Buy".to_string(), "bread".to_string()],
            },
        )
        .expect("edit");
        run(
            &backend,
            Command::Done {
                id: "a1b".to_string(),
            },
        )
        .expect("done");

        let snap = backend.snapshot(TODO_LIST_COLLECTION).expect("snapshot");
        assert_eq!(snap.todos[0], todo("a1b2", "Buy bread", true));
    }

    #[test]
    fn unknown_ids_are_errors_for_edit_and_done() {
        let backend = seeded();
        assert!(
            run(
                &backend,
                Command::Done {
                    id: "zz".to_string()
                }
            )
            .is_err()
        );
        assert!(
            run(
                &backend,
                Command::Edit {
                    id: "zz".to_string(),
                    words: vec!["x".to_string()],
                }
            )
            .is_err()
        );
    }

    #[test]
    fn delete_of_unknown_id_is_quiet() {
        let backend = seeded();
        run(
            &backend,
            Command::Delete {
                id: "zz".to_string(),
            },
        )
        .expect("delete");
        assert_eq!(
            backend
                .snapshot(TODO_LIST_COLLECTION)
                .expect("snapshot")
                .todos
                .len(),
            2
        );
    }

    #[test]
    fn list_filter_is_lenient() {
        let backend = seeded();
        let controller = run(
            &backend,
            Command::List {
                filter: Some("complete".to_string()),
            },
        )
        .expect("list");
        assert_eq!(controller.filtered_todos(), vec![todo("a1c3", "Walk dog", true)]);

        let controller = run(
            &backend,
            Command::List {
                filter: Some("whatever".to_string()),
            },
        )
        .expect("list");
        assert_eq!(controller.filtered_todos().len(), 2);
    }

    #[test]
    fn ambiguous_prefix_is_passed_through() {
        let mut controller = TodoListController::new();
        controller.apply_snapshot(Snapshot {
            revision: 1,
            todos: vec![todo("a1b2", "x", false), todo("a1c3", "y", false)],
        });

        assert_eq!(resolve_id(&controller, "a1").expect("resolve"), "a1");
        assert_eq!(resolve_id(&controller, "a1c").expect("resolve"), "a1c3");
        assert!(resolve_id(&controller, " ").is_err());
    }

    #[test]
    fn failed_writes_surface_as_errors() {
        let backend = seeded();
        backend.set_fail_writes(true);
        let err = run_effects(
            &backend,
            TODO_LIST_COLLECTION,
            &[Effect::Delete("a1b2".to_string())],
        )
        .expect_err("write should fail");
        assert!(format!("{err:#}").contains("a1b2"));
    }
}
