use std::fmt;

use tracing::{
  debug,
  warn
};

use crate::backend::{
  Snapshot,
  SyncStatus
};
use crate::{
  FilterStatus,
  TodoDto,
  filter_todos
};

/// Side effect the host carries out after
/// the local state has already changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  Upsert(TodoDto),
  Delete(String),
  ScrollToTop
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode<'a> {
  Create,
  Edit(&'a TodoDto)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListDisplay {
  Loading,
  Empty,
  Populated {
    filter_disabled: bool,
    todos:           Vec<TodoDto>
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
  NoEditTarget
}

impl fmt::Display for ControllerError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | ControllerError::NoEditTarget => {
        f.write_str(
          "no todo is being edited"
        )
      }
    }
  }
}

impl std::error::Error for ControllerError {}

/// Local mirror of the todo collection plus
/// the view state around it.
///
/// Operations apply their change locally
/// and hand back the effects still to be
/// performed, so the caller decides how
/// and when remote writes happen.
#[derive(Debug, Clone)]
pub struct TodoListController {
  todos:       Vec<TodoDto>,
  filter:      FilterStatus,
  edit_target: Option<TodoDto>,
  sync_status: SyncStatus
}

impl Default for TodoListController {
  fn default() -> Self {
    Self::new()
  }
}

impl TodoListController {
  pub fn new() -> Self {
    Self {
      todos:       Vec::new(),
      filter:      FilterStatus::All,
      edit_target: None,
      sync_status: SyncStatus::Loading
    }
  }

  pub fn todos(&self) -> &[TodoDto] {
    &self.todos
  }

  pub fn filter(&self) -> FilterStatus {
    self.filter
  }

  pub fn edit_target(
    &self
  ) -> Option<&TodoDto> {
    self.edit_target.as_ref()
  }

  pub fn sync_status(&self) -> SyncStatus {
    self.sync_status
  }

  pub fn is_editing(&self) -> bool {
    self.edit_target.is_some()
  }

  #[tracing::instrument(skip_all, fields(revision = snapshot.revision))]
  pub fn apply_snapshot(
    &mut self,
    snapshot: Snapshot
  ) {
    debug!(
      count = snapshot.todos.len(),
      "replacing local todos with snapshot"
    );
    self.todos = snapshot.todos;
    self.sync_status = SyncStatus::Ready;
    self.refresh_edit_target();
  }

  #[tracing::instrument(skip(self, candidate), fields(id = %candidate.id))]
  pub fn add_todo(
    &mut self,
    candidate: TodoDto
  ) -> Vec<Effect> {
    if candidate.has_blank_title() {
      debug!("ignoring todo with blank title");
      return vec![];
    }

    self.todos.insert(0, candidate.clone());
    vec![
      Effect::Upsert(candidate),
      Effect::ScrollToTop,
    ]
  }

  #[tracing::instrument(skip(self, updated), fields(updated_id = %updated.id))]
  pub fn update_todo(
    &mut self,
    original_id: &str,
    updated: TodoDto
  ) -> Vec<Effect> {
    if updated.has_blank_title() {
      debug!("ignoring update with blank title");
      return vec![];
    }

    let mut matched = false;
    for todo in self
      .todos
      .iter_mut()
      .filter(|todo| todo.id == original_id)
    {
      *todo = updated.clone();
      matched = true;
    }
    if !matched {
      debug!(
        "no local todo matched; writing \
         document anyway"
      );
    }

    vec![
      Effect::Upsert(updated),
      Effect::ScrollToTop,
    ]
  }

  #[tracing::instrument(skip(self))]
  pub fn delete_todo(
    &mut self,
    id: &str
  ) -> Vec<Effect> {
    self.todos.retain(|todo| todo.id != id);
    vec![Effect::Delete(id.to_string())]
  }

  #[tracing::instrument(skip(self))]
  pub fn complete_todo(
    &mut self,
    id: &str
  ) -> Vec<Effect> {
    let Some(todo) = self
      .todos
      .iter_mut()
      .find(|todo| todo.id == id)
    else {
      warn!("cannot toggle unknown todo");
      return vec![];
    };

    todo.is_complete = !todo.is_complete;
    let toggled = todo.clone();
    self.refresh_edit_target();
    vec![Effect::Upsert(toggled)]
  }

  #[tracing::instrument(skip(self))]
  pub fn begin_edit(
    &mut self,
    id: &str
  ) -> Vec<Effect> {
    let Some(todo) = self
      .todos
      .iter()
      .find(|todo| todo.id == id)
    else {
      warn!("cannot edit unknown todo");
      return vec![];
    };

    self.edit_target = Some(todo.clone());
    vec![Effect::ScrollToTop]
  }

  /// Applies the edit form to the current
  /// edit target. A blank title leaves the
  /// form open.
  #[tracing::instrument(skip(self, updated), fields(updated_id = %updated.id))]
  pub fn submit_edit_form(
    &mut self,
    updated: TodoDto
  ) -> Result<Vec<Effect>, ControllerError>
  {
    let Some(target) =
      self.edit_target.as_ref()
    else {
      warn!(
        "edit form submitted without an \
         edit target"
      );
      return Err(
        ControllerError::NoEditTarget
      );
    };

    let original_id = target.id.clone();
    let effects =
      self.update_todo(&original_id, updated);
    if !effects.is_empty() {
      self.edit_target = None;
    }
    Ok(effects)
  }

  /// Keeps the edit target in step with
  /// the local copy of the same todo.
  fn refresh_edit_target(&mut self) {
    let Some(target) =
      self.edit_target.as_mut()
    else {
      return;
    };
    if let Some(current) = self
      .todos
      .iter()
      .find(|todo| todo.id == target.id)
    {
      *target = current.clone();
    }
  }

  pub fn set_filter(
    &mut self,
    status: FilterStatus
  ) {
    debug!(filter = %status, "filter changed");
    self.filter = status;
  }

  pub fn set_filter_str(
    &mut self,
    raw: &str
  ) {
    self.set_filter(FilterStatus::parse(raw));
  }

  pub fn filtered_todos(
    &self
  ) -> Vec<TodoDto> {
    filter_todos(&self.todos, self.filter)
  }

  pub fn form_mode(&self) -> FormMode<'_> {
    match self.edit_target.as_ref() {
      | Some(todo) => FormMode::Edit(todo),
      | None => FormMode::Create
    }
  }

  pub fn list_display(&self) -> ListDisplay {
    match self.sync_status {
      | SyncStatus::Loading => {
        ListDisplay::Loading
      }
      | SyncStatus::Ready
        if self.todos.is_empty() =>
      {
        ListDisplay::Empty
      }
      | SyncStatus::Ready => {
        ListDisplay::Populated {
          filter_disabled: self
            .is_editing(),
          todos:           self
            .filtered_todos()
        }
      }
    }
  }
}
