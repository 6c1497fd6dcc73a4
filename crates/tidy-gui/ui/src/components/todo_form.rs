use tidy_shared::TodoDto;
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html,
  use_state
};

#[derive(Properties, PartialEq)]
pub struct TodoFormProps {
  /// Present in edit mode; the form starts
  /// out pre-filled with its title.
  pub edit_item: Option<TodoDto>,
  pub on_submit: Callback<TodoDto>
}

/// Builds the submitted todo. The input is
/// only cleared after a create; a rejected
/// edit keeps the form open with its text.
fn submission(
  edit_item: Option<&TodoDto>,
  title: &str
) -> (TodoDto, bool) {
  match edit_item {
    | Some(original) => (
      TodoDto {
        title: title.to_string(),
        ..original.clone()
      },
      false
    ),
    | None => (TodoDto::new(title), true)
  }
}

#[function_component(TodoForm)]
pub fn todo_form(
  props: &TodoFormProps
) -> Html {
  let title = {
    let initial = props
      .edit_item
      .as_ref()
      .map(|todo| todo.title.clone())
      .unwrap_or_default();
    use_state(move || initial)
  };

  let on_input = {
    let title = title.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        title.set(input.value());
      }
    )
  };

  let on_submit = {
    let title = title.clone();
    let edit_item =
      props.edit_item.clone();
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        let (todo, clear_input) =
          submission(
            edit_item.as_ref(),
            &title
          );
        on_submit.emit(todo);
        if clear_input {
          title.set(String::new());
        }
      }
    )
  };

  let editing = props.edit_item.is_some();
  let (placeholder, button_label) =
    if editing {
      ("Update your to-do", "Update")
    } else {
      ("Add a to-do", "Add")
    };

  html! {
      <form class={if editing { "todo-form editing" } else { "todo-form" }} onsubmit={on_submit}>
          <input
              class="todo-input"
              type="text"
              value={(*title).clone()}
              placeholder={placeholder}
              oninput={on_input}
          />
          <button class="btn primary" type="submit">{ button_label }</button>
      </form>
  }
}

#[cfg(test)]
mod tests {
  use tidy_shared::TodoDto;

  use super::submission;

  #[test]
  fn edit_submission_keeps_input() {
    let original = TodoDto {
      id:          "1".to_string(),
      title:       "Buy milk".to_string(),
      is_complete: true
    };

    let (todo, clear_input) =
      submission(Some(&original), "  ");

    assert!(!clear_input);
    assert_eq!(todo.id, "1");
    assert_eq!(todo.title, "  ");
    assert!(todo.is_complete);
  }

  #[test]
  fn create_submission_clears_input() {
    let (todo, clear_input) =
      submission(None, "Walk dog");

    assert!(clear_input);
    assert_eq!(todo.title, "Walk dog");
    assert!(!todo.is_complete);
  }
}
