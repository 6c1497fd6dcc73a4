use tidy_shared::FilterStatus;
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct StatusFilterProps {
  pub value:     FilterStatus,
  pub disabled:  bool,
  pub on_change: Callback<FilterStatus>
}

#[function_component(StatusFilter)]
pub fn status_filter(
  props: &StatusFilterProps
) -> Html {
  let on_change = {
    let on_change =
      props.on_change.clone();
    Callback::from(
      move |e: web_sys::Event| {
        let select: web_sys::HtmlSelectElement =
          e.target_unchecked_into();
        on_change.emit(
          FilterStatus::parse(
            &select.value()
          )
        );
      }
    )
  };

  html! {
      <div class="field filter">
          <label for="status-filter">{ "Show" }</label>
          <select
              id="status-filter"
              value={props.value.as_str()}
              onchange={on_change}
              disabled={props.disabled}
          >
              {
                  for FilterStatus::ALL.into_iter().map(|status| html! {
                      <option
                          value={status.as_str()}
                          selected={status == props.value}
                      >
                          { status.label() }
                      </option>
                  })
              }
          </select>
      </div>
  }
}
