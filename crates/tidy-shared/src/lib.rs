pub mod backend;
pub mod controller;

use std::fmt;

use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

pub use backend::{
  MemoryBackend,
  Snapshot,
  Subscription,
  SyncStatus,
  TodoBackend
};
pub use controller::{
  ControllerError,
  Effect,
  FormMode,
  ListDisplay,
  TodoListController
};

/// Name of the document collection the
/// to-do list lives in.
pub const TODO_LIST_COLLECTION: &str =
  "todo-list";

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TodoDto {
  pub id:          String,
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub is_complete: bool
}

impl TodoDto {
  /// A fresh incomplete todo with a random
  /// v4 id.
  pub fn new(
    title: impl Into<String>
  ) -> Self {
    Self {
      id:          Uuid::new_v4()
        .to_string(),
      title:       title.into(),
      is_complete: false
    }
  }

  pub fn has_blank_title(&self) -> bool {
    is_blank_title(&self.title)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
  #[default]
  All,
  Complete,
  Incomplete
}

impl FilterStatus {
  pub const ALL: [FilterStatus; 3] = [
    FilterStatus::All,
    FilterStatus::Complete,
    FilterStatus::Incomplete
  ];

  /// Lenient parse: anything that is not
  /// `complete` or `incomplete` means
  /// `all`.
  pub fn parse(raw: &str) -> Self {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "complete" => {
        FilterStatus::Complete
      }
      | "incomplete" => {
        FilterStatus::Incomplete
      }
      | _ => FilterStatus::All
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | FilterStatus::All => "all",
      | FilterStatus::Complete => {
        "complete"
      }
      | FilterStatus::Incomplete => {
        "incomplete"
      }
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | FilterStatus::All => "All",
      | FilterStatus::Complete => {
        "Complete"
      }
      | FilterStatus::Incomplete => {
        "Incomplete"
      }
    }
  }
}

impl fmt::Display for FilterStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

pub fn is_blank_title(
  title: &str
) -> bool {
  title.trim().is_empty()
}

/// Order-preserving status filter.
pub fn filter_todos(
  todos: &[TodoDto],
  status: FilterStatus
) -> Vec<TodoDto> {
  match status {
    | FilterStatus::Complete => todos
      .iter()
      .filter(|todo| todo.is_complete)
      .cloned()
      .collect(),
    | FilterStatus::Incomplete => todos
      .iter()
      .filter(|todo| !todo.is_complete)
      .cloned()
      .collect(),
    | FilterStatus::All => todos.to_vec()
  }
}
