mod footer;
mod status_filter;
mod todo_form;
mod todo_item;

pub use footer::Footer;
pub use status_filter::StatusFilter;
pub use todo_form::TodoForm;
pub use todo_item::TodoItem;
