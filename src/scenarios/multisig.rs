//! 2-of-3 multisig approving a mint, then burning the minted supply.

use std::collections::HashMap;

use crate::components::flow_diagram::timeline::{HighlightEntry, Scenario, Step};
use crate::components::flow_diagram::types::{
	Edge, EdgeKind, GraphModel, Handle, Node, SemanticType, VisualKind,
};
use crate::error::ScenarioError;

pub const ID: &str = "multisig";
pub const TITLE: &str = "Multisig mint and burn";
pub const SUMMARY: &str = "Three signers vote on a mint proposal; once the threshold is met the \
	treasury mints, later burns.";

fn graph() -> Result<GraphModel, ScenarioError> {
	let nodes = vec![
		Node::new("proposer", VisualKind::Actor, SemanticType::Signer, "Proposer", 0.0, 160.0)
			.tooltip("Signer 0, opens proposals"),
		Node::new("voter1", VisualKind::Actor, SemanticType::Signer, "Signer 1", 280.0, 0.0),
		Node::new("voter2", VisualKind::Actor, SemanticType::Signer, "Signer 2", 280.0, 160.0),
		Node::new("voter3", VisualKind::Actor, SemanticType::Signer, "Signer 3", 280.0, 320.0)
			.status_at(4, "ABSTAINED"),
		Node::new(
			"multisig",
			VisualKind::Gate,
			SemanticType::Treasury,
			"Multisig wallet",
			560.0,
			160.0,
		)
			.status("IDLE")
			.status_at(1, "PROPOSAL_OPEN")
			.tooltip("Threshold: 2 of 3")
			.timestamp("block 19,204,551"),
		Node::new("token", VisualKind::Store, SemanticType::Token, "Stable token", 840.0, 160.0),
		Node::new("recipient", VisualKind::Actor, SemanticType::Wallet, "Recipient", 840.0, 340.0),
	];

	let edges = vec![
		Edge::new("e1", "proposer", "multisig").label("propose mint 1,000"),
		Edge::new("e2", "multisig", "voter1").label("request signature"),
		Edge::new("e3", "multisig", "voter2").label("request signature"),
		Edge::new("e4", "voter1", "proposer").label("approve").color("#2ca02c"),
		Edge::new("e5", "voter2", "proposer").label("approve").color("#2ca02c"),
		Edge::new("e6", "multisig", "voter3").label("request signature"),
		Edge::new("e7", "proposer", "multisig").label("execute").kind(EdgeKind::Straight),
		Edge::new("e8", "multisig", "token").label("mint").kind(EdgeKind::Straight),
		Edge::new("e9", "token", "recipient").label("credit").kind(EdgeKind::Step),
		Edge::new("e10", "recipient", "multisig").label("return for burn").kind(EdgeKind::Step),
		Edge::new("e11", "multisig", "token").label("burn").color("#d62728"),
	];

	let handles = HashMap::from([
		("proposer".to_string(), Handle { side: true }),
		("multisig".to_string(), Handle { side: true }),
		("token".to_string(), Handle { side: false }),
	]);

	GraphModel::new(nodes, edges, handles)
}

fn steps() -> Vec<Step> {
	vec![
		Step::new("Open a proposal", "The proposer submits a mint of 1,000 tokens.")
			.what("A pending transaction is stored in the multisig.")
			.why("Nothing executes until enough signers agree.")
			.code("multisig.submitTransaction(token, 0, mint(recipient, 1000))"),
		Step::new("Request signatures", "Every signer is notified of the proposal.")
			.what("The proposal id is shared with all three signers.")
			.why("Each signer reviews independently."),
		Step::new("First approval", "Signer 1 approves.")
			.what("One of the two required signatures is collected.")
			.why("Votes accumulate against the threshold."),
		Step::new("Threshold reached", "Signer 2 approves; signer 3 abstains.")
			.what("Two of three signatures are now held.")
			.why("A 2-of-3 threshold tolerates one absent signer."),
		Step::new("Execute", "The proposer triggers execution.")
			.what("The multisig verifies the signatures and runs the call.")
			.why("Execution is a separate transaction anyone may send.")
			.code("multisig.executeTransaction(txId)"),
		Step::new("Mint", "The multisig calls mint on the token contract.")
			.what("Total supply increases by 1,000.")
			.why("Only the multisig holds the minter role."),
		Step::new("Credit the recipient", "The new tokens land in the recipient's wallet.")
			.what("The recipient balance grows by 1,000.")
			.why("Mint and transfer happen in the same call."),
		Step::new("Return for burn", "The recipient sends the tokens back for redemption.")
			.what("Tokens move to the multisig.")
			.why("Redemption reduces circulating supply."),
		Step::new("Burn", "The multisig burns the returned tokens.")
			.what("Total supply decreases by 1,000.")
			.why("A burn needs the same signer approval path as a mint.")
			.code("token.burn(1000)"),
		Step::new("Settled", "Supply is back where it started.")
			.what("The audit trail shows a matched mint and burn.")
			.why("Every supply change is attributable to signer votes."),
	]
}

fn highlights() -> Vec<HighlightEntry> {
	vec![
		HighlightEntry::default(),
		HighlightEntry::new(&["proposer", "multisig"], &["e1"]),
		HighlightEntry::new(&["multisig", "voter1", "voter2", "voter3"], &["e2", "e3", "e6"])
			.update_status("multisig", "AWAITING_SIGNATURES"),
		HighlightEntry::new(&["voter1", "proposer"], &["e4"])
			.update_status("proposer", "VOTING_IN_PROGRESS"),
		HighlightEntry::new(&["voter2", "voter3", "proposer"], &["e5"])
			.update_status("proposer", "THRESHOLD_MET"),
		HighlightEntry::new(&["proposer", "multisig"], &["e7"])
			.update_status("multisig", "EXECUTED"),
		HighlightEntry::new(&["multisig", "token"], &["e8"]).update_status("token", "MINTED"),
		HighlightEntry::new(&["token", "recipient"], &["e9"])
			.update_status("recipient", "RECEIVED"),
		HighlightEntry::new(&["recipient", "multisig"], &["e10"])
			.update_status("recipient", "RETURNED"),
		HighlightEntry::new(&["multisig", "token"], &["e11"]).update_status("token", "BURNED"),
		HighlightEntry::new(&[], &[]).update_status("multisig", "SETTLED"),
	]
}

pub fn scenario() -> Result<Scenario, ScenarioError> {
	Scenario::new(ID, TITLE, SUMMARY, graph()?, steps(), highlights())
}
