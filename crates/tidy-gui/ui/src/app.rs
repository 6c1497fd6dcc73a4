mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Interval;
use tidy_shared::{
  Effect,
  FilterStatus,
  FormMode,
  ListDisplay,
  Subscription,
  TODO_LIST_COLLECTION,
  TodoBackend,
  TodoDto,
  TodoListController
};
use yew::functional::UseForceUpdateHandle;
use yew::{
  Callback,
  Html,
  NodeRef,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_memo,
  use_mut_ref,
  use_node_ref
};

use self::storage::LocalStorageBackend;
use crate::components::{
  Footer,
  StatusFilter,
  TodoForm,
  TodoItem
};

const SUBSCRIPTION_POLL_MS: u32 = 750;
const LOADING_MESSAGE: &str =
  "Fetching to-do list...";
const EMPTY_MESSAGE: &str =
  "No to-dos to show";

/// Everything a callback needs to commit a
/// controller transition.
#[derive(Clone)]
struct Host {
  controller:
    Rc<RefCell<TodoListController>>,
  backend:      Rc<LocalStorageBackend>,
  heading:      NodeRef,
  force_update: UseForceUpdateHandle
}

impl Host {
  fn commit<F>(&self, op: F)
  where
    F: FnOnce(
      &mut TodoListController
    ) -> Vec<Effect>
  {
    let effects = op(
      &mut *self.controller.borrow_mut()
    );
    self.force_update.force_update();

    for effect in effects {
      match effect {
        | Effect::ScrollToTop => {
          scroll_into_view(&self.heading)
        }
        | remote => {
          let backend =
            self.backend.clone();
          wasm_bindgen_futures::spawn_local(
            async move {
              if let Err(error) =
                write_remote(
                  &*backend,
                  &remote
                )
              {
                tracing::error!(
                  error = %format!("{error:#}"),
                  ?remote,
                  "todo write failed; \
                   waiting for next \
                   snapshot"
                );
              }
            }
          );
        }
      }
    }
  }
}

fn write_remote<B: TodoBackend>(
  backend: &B,
  effect: &Effect
) -> anyhow::Result<()> {
  match effect {
    | Effect::Upsert(todo) => backend
      .upsert(TODO_LIST_COLLECTION, todo),
    | Effect::Delete(id) => backend
      .delete(TODO_LIST_COLLECTION, id),
    | Effect::ScrollToTop => Ok(())
  }
}

fn scroll_into_view(node: &NodeRef) {
  if let Some(element) =
    node.cast::<web_sys::Element>()
  {
    let options =
      web_sys::ScrollIntoViewOptions::new();
    options.set_behavior(
      web_sys::ScrollBehavior::Smooth
    );
    element
      .scroll_into_view_with_scroll_into_view_options(
        &options
      );
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let controller =
    use_mut_ref(TodoListController::new);
  let backend =
    use_memo((), |_| LocalStorageBackend);
  let force_update = use_force_update();
  let heading = use_node_ref();

  {
    let controller = controller.clone();
    let backend = backend.clone();
    let force_update = force_update.clone();
    use_effect_with((), move |_| {
      let mut subscription =
        Subscription::new(
          backend,
          TODO_LIST_COLLECTION
        );
      let mut poll = move || {
        match subscription.poll() {
          | Ok(Some(snapshot)) => {
            controller
              .borrow_mut()
              .apply_snapshot(snapshot);
            force_update.force_update();
          }
          | Ok(None) => {}
          | Err(error) => {
            tracing::error!(
              error = %format!("{error:#}"),
              "failed reading todo \
               collection"
            );
          }
        }
      };

      poll();
      let interval = Interval::new(
        SUBSCRIPTION_POLL_MS,
        poll
      );
      tracing::info!(
        collection = TODO_LIST_COLLECTION,
        "subscribed to todo collection"
      );

      move || drop(interval)
    });
  }

  let host = Host {
    controller: controller.clone(),
    backend,
    heading: heading.clone(),
    force_update
  };

  let on_add = {
    let host = host.clone();
    Callback::from(move |todo: TodoDto| {
      host.commit(|c| c.add_todo(todo));
    })
  };

  let on_edit_submit = {
    let host = host.clone();
    Callback::from(move |todo: TodoDto| {
      host.commit(|c| {
        c.submit_edit_form(todo)
          .unwrap_or_else(|error| {
            tracing::warn!(
              %error,
              "ignoring edit submission"
            );
            vec![]
          })
      });
    })
  };

  let on_filter = {
    let host = host.clone();
    Callback::from(
      move |status: FilterStatus| {
        host.commit(|c| {
          c.set_filter(status);
          vec![]
        });
      }
    )
  };

  let on_complete = {
    let host = host.clone();
    Callback::from(move |id: String| {
      host.commit(|c| c.complete_todo(&id));
    })
  };

  let on_begin_edit = {
    let host = host.clone();
    Callback::from(move |id: String| {
      host.commit(|c| c.begin_edit(&id));
    })
  };

  let on_delete = {
    let host = host.clone();
    Callback::from(move |id: String| {
      host.commit(|c| c.delete_todo(&id));
    })
  };

  let (edit_target, display, filter) = {
    let state = controller.borrow();
    let edit_target =
      match state.form_mode() {
        | FormMode::Edit(todo) => {
          Some(todo.clone())
        }
        | FormMode::Create => None
      };
    (
      edit_target,
      state.list_display(),
      state.filter()
    )
  };

  let form = match edit_target {
    | Some(target) => html! {
        <TodoForm
            key={format!("edit-{}", target.id)}
            edit_item={Some(target.clone())}
            on_submit={on_edit_submit}
        />
    },
    | None => html! {
        <TodoForm key="create" edit_item={None::<TodoDto>} on_submit={on_add} />
    }
  };

  let list = match display {
    | ListDisplay::Loading => html! {
        <p class="status">{ LOADING_MESSAGE }</p>
    },
    | ListDisplay::Empty => html! {
        <p class="status">{ EMPTY_MESSAGE }</p>
    },
    | ListDisplay::Populated {
      filter_disabled,
      todos
    } => html! {
        <>
            <StatusFilter
                value={filter}
                disabled={filter_disabled}
                on_change={on_filter}
            />
            <TodoItem
                todos={todos}
                is_editing={filter_disabled}
                on_complete={on_complete}
                on_edit={on_begin_edit}
                on_delete={on_delete}
            />
        </>
    }
  };

  html! {
      <main class="todo-app">
          <h1 ref={heading}>{ "To-Do List" }</h1>
          { form }
          { list }
          <Footer />
      </main>
  }
}
