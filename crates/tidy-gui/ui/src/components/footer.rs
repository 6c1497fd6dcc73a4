use yew::{
  Html,
  function_component,
  html
};

#[function_component(Footer)]
pub fn footer() -> Html {
  html! {
      <footer class="footer">
          <span>{ "Tidy" }</span>
          <span class="muted">{ format!("v{}", env!("CARGO_PKG_VERSION")) }</span>
      </footer>
  }
}
