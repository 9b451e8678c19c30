//! Narrative steps, the per-step highlight table, and the scenario bundle.

use std::collections::BTreeMap;

use super::types::{EdgeId, GraphModel, NodeId};
use crate::error::ScenarioError;

/// Narrative copy for one non-idle step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
	pub title: String,
	pub description: String,
	pub what: String,
	pub why: String,
	pub code_snippet: Option<String>,
}

impl Step {
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			what: String::new(),
			why: String::new(),
			code_snippet: None,
		}
	}

	pub fn what(mut self, what: impl Into<String>) -> Self {
		self.what = what.into();
		self
	}

	pub fn why(mut self, why: impl Into<String>) -> Self {
		self.why = why.into();
		self
	}

	pub fn code(mut self, code: impl Into<String>) -> Self {
		self.code_snippet = Some(code.into());
		self
	}
}

/// Partial node data carried by an `updateNode` override. Only the fields
/// that are `Some` (or non-empty, for `status_by_step`) are applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
	pub label: Option<String>,
	pub status: Option<String>,
	pub status_by_step: BTreeMap<usize, String>,
	pub tooltip: Option<String>,
	pub timestamp: Option<String>,
}

impl NodePatch {
	pub fn status(status: impl Into<String>) -> Self {
		Self {
			status: Some(status.into()),
			..Self::default()
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeUpdate {
	pub id: NodeId,
	pub data: NodePatch,
}

/// Which nodes/edges are active at one step, plus an optional node override.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightEntry {
	pub nodes: Vec<NodeId>,
	pub edges: Vec<EdgeId>,
	pub update_node: Option<NodeUpdate>,
}

/// The idle entry used for step 0 and for any failed lookup.
pub static EMPTY_ENTRY: HighlightEntry = HighlightEntry {
	nodes: Vec::new(),
	edges: Vec::new(),
	update_node: None,
};

impl HighlightEntry {
	pub fn new(nodes: &[&str], edges: &[&str]) -> Self {
		Self {
			nodes: nodes.iter().map(|s| s.to_string()).collect(),
			edges: edges.iter().map(|s| s.to_string()).collect(),
			update_node: None,
		}
	}

	pub fn update(mut self, id: impl Into<NodeId>, data: NodePatch) -> Self {
		self.update_node = Some(NodeUpdate { id: id.into(), data });
		self
	}

	pub fn update_status(self, id: impl Into<NodeId>, status: impl Into<String>) -> Self {
		self.update(id, NodePatch::status(status))
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty() && self.update_node.is_none()
	}
}

/// Ordered narrative steps and the parallel highlight table.
///
/// `highlights.len()` defines the step count; index 0 is the idle state and
/// `steps[i - 1]` narrates highlight index `i`.
#[derive(Clone, Debug)]
pub struct Timeline {
	steps: Vec<Step>,
	highlights: Vec<HighlightEntry>,
}

impl Timeline {
	#[cfg(test)]
	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	#[cfg(test)]
	pub fn highlights(&self) -> &[HighlightEntry] {
		&self.highlights
	}

	/// Last valid step index.
	pub fn terminal_step(&self) -> usize {
		self.highlights.len().saturating_sub(1)
	}

	/// Clamp any requested index, negative included, into `[0, terminal]`.
	pub fn clamp(&self, step: isize) -> usize {
		if step <= 0 {
			0
		} else {
			(step as usize).min(self.terminal_step())
		}
	}

	/// Highlight entry for `step` after clamping. Step 0 is always idle.
	pub fn entry(&self, step: usize) -> &HighlightEntry {
		let step = step.min(self.terminal_step());
		if step == 0 {
			return &EMPTY_ENTRY;
		}
		self.highlights.get(step).unwrap_or(&EMPTY_ENTRY)
	}

	/// Narrative for `step`; `None` at the idle step.
	pub fn narrative(&self, step: usize) -> Option<&Step> {
		let step = step.min(self.terminal_step());
		step.checked_sub(1).and_then(|i| self.steps.get(i))
	}
}

/// A complete scenario: graph, narrative, and highlight table.
#[derive(Clone, Debug)]
pub struct Scenario {
	pub id: String,
	pub title: String,
	pub summary: String,
	pub graph: GraphModel,
	pub timeline: Timeline,
}

impl Scenario {
	/// Assemble and sanity-check a scenario. An empty highlight table is
	/// fatal; every other inconsistency is logged and tolerated.
	pub fn new(
		id: impl Into<String>,
		title: impl Into<String>,
		summary: impl Into<String>,
		graph: GraphModel,
		steps: Vec<Step>,
		highlights: Vec<HighlightEntry>,
	) -> Result<Self, ScenarioError> {
		let id = id.into();
		if highlights.is_empty() {
			return Err(ScenarioError::EmptyHighlightTable(id));
		}
		if steps.len() + 1 != highlights.len() {
			log::warn!(
				"scenario `{}`: {} narrative steps for {} highlight entries",
				id,
				steps.len(),
				highlights.len()
			);
		}
		if !highlights[0].is_empty() {
			log::warn!("scenario `{}`: idle entry 0 is not empty and will be ignored", id);
		}
		for (step, entry) in highlights.iter().enumerate() {
			for node in entry.nodes.iter().filter(|n| !graph.contains_node(n)) {
				log::warn!("scenario `{}` step {}: unknown node `{}`", id, step, node);
			}
			for edge in entry.edges.iter().filter(|e| !graph.contains_edge(e)) {
				log::warn!("scenario `{}` step {}: unknown edge `{}`", id, step, edge);
			}
			if let Some(update) = &entry.update_node {
				if !graph.contains_node(&update.id) {
					log::warn!(
						"scenario `{}` step {}: updateNode targets unknown node `{}`",
						id,
						step,
						update.id
					);
				}
			}
		}

		Ok(Self {
			id,
			title: title.into(),
			summary: summary.into(),
			graph,
			timeline: Timeline { steps, highlights },
		})
	}

	pub fn terminal_step(&self) -> usize {
		self.timeline.terminal_step()
	}
}
