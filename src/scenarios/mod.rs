//! Scenario catalog.

pub mod dex;
pub mod multisig;

use crate::components::flow_diagram::timeline::Scenario;
use crate::error::ScenarioError;

/// Listing entry for the home page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenarioInfo {
	pub id: &'static str,
	pub title: &'static str,
	pub summary: &'static str,
}

pub const CATALOG: &[ScenarioInfo] = &[
	ScenarioInfo {
		id: dex::ID,
		title: dex::TITLE,
		summary: dex::SUMMARY,
	},
	ScenarioInfo {
		id: multisig::ID,
		title: multisig::TITLE,
		summary: multisig::SUMMARY,
	},
];

/// Build the scenario registered under `id`.
pub fn load(id: &str) -> Result<Scenario, ScenarioError> {
	match id {
		dex::ID => dex::scenario(),
		multisig::ID => multisig::scenario(),
		other => Err(ScenarioError::UnknownScenario(other.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_catalog_entry_loads() {
		for info in CATALOG {
			let scenario = load(info.id).unwrap();
			assert_eq!(scenario.id, info.id);
			assert_eq!(scenario.title, info.title);
		}
	}

	#[test]
	fn unknown_id_is_an_error() {
		assert_eq!(
			load("lending").unwrap_err(),
			ScenarioError::UnknownScenario("lending".into())
		);
	}
}
