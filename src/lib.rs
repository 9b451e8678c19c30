//! Step-driven animated flow diagrams on a canvas.
//!
//! A scenario is a fixed graph plus a timeline of steps. Stepping through it
//! highlights the nodes and edges involved in each step and moves the camera
//! to frame them.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

mod clock;
mod components;
mod config;
mod error;
mod pages;
mod scenarios;

use crate::config::{AppConfig, SettingsStore};
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;
use crate::pages::scenario::ScenarioPage;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Router for the scenario list and the diagram pages. Settings are loaded
/// once and written back whenever they change.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let store = SettingsStore::detect();
	let config = RwSignal::new(AppConfig::load(&store));

	Effect::new(move |prev: Option<()>| {
		let current = config.get();
		// First run is the value we just loaded.
		if prev.is_none() {
			return;
		}
		if let Err(err) = current.save(&store) {
			log::warn!("settings not persisted: {err}");
		}
	});

	view! {
		<Html
			attr:lang="en"
			attr:dir="ltr"
			attr:data-theme=move || config.with(|c| c.theme.as_str())
		/>

		<Title text="Stepflow" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/scenario/:id") view=move || view! { <ScenarioPage config /> } />
			</Routes>
		</Router>
	}
}
