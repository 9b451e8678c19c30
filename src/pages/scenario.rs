use std::rc::Rc;

use leptos::ev::Event;
use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;

use crate::components::flow_diagram::{FlowDiagram, FlowHandle, Scenario, Step};
use crate::config::{AppConfig, ExplanationProvider, ThemeMode};
use crate::scenarios;

/// Diagram page for `/scenario/:id`. Unknown ids render the error fallback.
#[component]
pub fn ScenarioPage(config: RwSignal<AppConfig>) -> impl IntoView {
	let params = use_params_map();
	let id = move || params.with(|p| p.get("id").unwrap_or_default());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<div class="page error">
					<h1>"Uh oh! Something went wrong!"</h1>
					<ul>
						{move || {
							errors
								.get()
								.into_iter()
								.map(|(_, e)| view! { <li>{e.to_string()}</li> })
								.collect_view()
						}}
					</ul>
					<A href="/">"Back to the scenario list"</A>
				</div>
			}
		}>
			{move || {
				scenarios::load(&id())
					.map(|scenario| view! { <ScenarioView scenario=Rc::new(scenario) config /> })
			}}
		</ErrorBoundary>
	}
}

#[component]
fn ScenarioView(scenario: Rc<Scenario>, config: RwSignal<AppConfig>) -> impl IntoView {
	let flow = FlowHandle::create(scenario.terminal_step());
	let terminal = flow.terminal_step();
	let theme = Signal::derive(move || config.with(|c| c.theme));
	let timeline = StoredValue::new(scenario.timeline.clone());
	let current: Signal<Option<Step>> = Signal::derive(move || {
		let step = flow.step();
		timeline.with_value(|t| t.narrative(step).cloned())
	});
	let title = scenario.title.clone();
	let summary = scenario.summary.clone();

	view! {
		<div class="page scenario">
			<header class="scenario-header">
				<A href="/">"\u{2190} All scenarios"</A>
				<h1>{title}</h1>
				<p class="subtitle">{summary}</p>
				<Settings config />
			</header>

			<FlowDiagram scenario flow theme />

			<nav class="transport">
				<button on:click=move |_| flow.reset() title="Reset (Home)">"\u{23EE}"</button>
				<button
					on:click=move |_| flow.prev_step()
					disabled=move || flow.step() == 0
					title="Previous (\u{2190})"
				>
					"\u{25C0}"
				</button>
				<button on:click=move |_| flow.toggle_play() title="Play / pause (Space)">
					{move || if flow.is_playing() { "\u{23F8}" } else { "\u{25B6}" }}
				</button>
				<button
					on:click=move |_| flow.next_step()
					disabled=move || flow.step() >= terminal
					title="Next (\u{2192})"
				>
					"\u{25B6}\u{25B6}"
				</button>
				<span class="step-counter">
					{move || format!("Step {} / {}", flow.step(), terminal)}
				</span>
			</nav>

			<ol class="step-dots">
				{(0..=terminal)
					.map(|i| {
						view! {
							<li>
								<button
									class:current=move || flow.step() == i
									title=format!("Go to step {i}")
									on:click=move |_| flow.set_step(i as isize)
								>
									{i}
								</button>
							</li>
						}
					})
					.collect_view()}
			</ol>

			<section class="narrative">
				{move || match current.get() {
					None => {
						view! { <p class="idle">"Press play or \u{2192} to begin."</p> }.into_any()
					}
					Some(step) => view! { <Narrative step /> }.into_any(),
				}}
			</section>

			<ExplanationPanel
				provider=Signal::derive(move || config.with(|c| c.provider))
				step=Signal::derive(move || flow.step())
			/>
		</div>
	}
}

#[component]
fn Narrative(step: Step) -> impl IntoView {
	view! {
		<h2>{step.title}</h2>
		<p>{step.description}</p>
		<dl>
			<dt>"What happens"</dt>
			<dd>{step.what}</dd>
			<dt>"Why it matters"</dt>
			<dd>{step.why}</dd>
		</dl>
		{step.code_snippet.map(|code| view! { <pre class="code"><code>{code}</code></pre> })}
	}
}

#[component]
fn Settings(config: RwSignal<AppConfig>) -> impl IntoView {
	let on_theme = move |ev: Event| {
		if let Some(theme) = ThemeMode::parse(&event_target_value(&ev)) {
			config.update(|c| c.theme = theme);
		}
	};
	let on_provider = move |ev: Event| {
		if let Some(provider) = ExplanationProvider::parse(&event_target_value(&ev)) {
			config.update(|c| c.provider = provider);
		}
	};

	view! {
		<div class="settings">
			<label>
				"Theme "
				<select on:change=on_theme prop:value=move || config.with(|c| c.theme.as_str())>
					{ThemeMode::ALL
						.into_iter()
						.map(|mode| view! { <option value=mode.as_str()>{mode.as_str()}</option> })
						.collect_view()}
				</select>
			</label>
			<label>
				"Explanations "
				<select
					on:change=on_provider
					prop:value=move || config.with(|c| c.provider.as_str())
				>
					{ExplanationProvider::ALL
						.into_iter()
						.map(|p| view! { <option value=p.as_str()>{p.display_name()}</option> })
						.collect_view()}
				</select>
			</label>
		</div>
	}
}

/// Placeholder for the provider-backed explanation widget; it only needs the
/// current step number.
#[component]
fn ExplanationPanel(provider: Signal<ExplanationProvider>, step: Signal<usize>) -> impl IntoView {
	view! {
		<Show when=move || provider.get() != ExplanationProvider::Off>
			<aside class="explanation">
				<h3>
					{move || {
						format!("Ask {} about step {}", provider.get().display_name(), step.get())
					}}
				</h3>
			</aside>
		</Show>
	}
}
