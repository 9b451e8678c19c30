use leptos::prelude::*;
use leptos_router::components::A;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="page not-found">
			<h1>"Nothing here"</h1>
			<A href="/">"Back to the scenario list"</A>
		</div>
	}
}
