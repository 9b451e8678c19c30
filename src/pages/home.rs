use leptos::prelude::*;
use leptos_router::components::A;

use crate::scenarios::CATALOG;

/// Scenario list
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<div class="page home">
			<h1>"Step-by-step flows"</h1>
			<p class="subtitle">
				"Pick a scenario, then step through it with the arrow keys or press play."
			</p>
			<ul class="scenario-list">
				{CATALOG
					.iter()
					.map(|info| {
						view! {
							<li>
								<A href=format!("/scenario/{}", info.id)>
									<h2>{info.title}</h2>
								</A>
								<p>{info.summary}</p>
							</li>
						}
					})
					.collect_view()}
			</ul>
		</div>
	}
}
