use tidy_shared::TodoDto;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TodoItemProps {
  pub todos:       Vec<TodoDto>,
  pub is_editing:  bool,
  pub on_complete: Callback<String>,
  pub on_edit:     Callback<String>,
  pub on_delete:   Callback<String>
}

#[function_component(TodoItem)]
pub fn todo_item(
  props: &TodoItemProps
) -> Html {
  html! {
      <ul class="todo-list">
          {
              for props.todos.iter().map(|todo| {
                  let id = todo.id.clone();
                  let on_complete = {
                      let on_complete = props.on_complete.clone();
                      let id = id.clone();
                      move |_: yew::MouseEvent| on_complete.emit(id.clone())
                  };
                  let on_edit = {
                      let on_edit = props.on_edit.clone();
                      let id = id.clone();
                      move |_: yew::MouseEvent| on_edit.emit(id.clone())
                  };
                  let on_delete = {
                      let on_delete = props.on_delete.clone();
                      let id = id.clone();
                      move |_: yew::MouseEvent| on_delete.emit(id.clone())
                  };
                  let class = if todo.is_complete {
                      "todo-row complete"
                  } else {
                      "todo-row"
                  };

                  html! {
                      <li key={id} class={class}>
                          <button
                              class="selector"
                              title="Toggle complete"
                              onclick={on_complete}
                          >
                              { if todo.is_complete { "✓" } else { "" } }
                          </button>
                          <span class="todo-title">{ &todo.title }</span>
                          <button
                              class="btn"
                              disabled={props.is_editing}
                              onclick={on_edit}
                          >
                              { "Edit" }
                          </button>
                          <button
                              class="btn danger"
                              disabled={props.is_editing}
                              onclick={on_delete}
                          >
                              { "Delete" }
                          </button>
                      </li>
                  }
              })
          }
      </ul>
  }
}
