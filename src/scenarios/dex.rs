//! Token swap, then adding and removing liquidity on a constant-product pool.

use std::collections::HashMap;

use crate::components::flow_diagram::timeline::{HighlightEntry, Scenario, Step};
use crate::components::flow_diagram::types::{
	Edge, EdgeKind, GraphModel, Handle, Node, SemanticType, VisualKind,
};
use crate::error::ScenarioError;

pub const ID: &str = "dex";
pub const TITLE: &str = "DEX swap and liquidity";
pub const SUMMARY: &str =
	"Swap token A for token B through a router, then provide and withdraw liquidity.";

fn graph() -> Result<GraphModel, ScenarioError> {
	let nodes = vec![
		Node::new("user", VisualKind::Actor, SemanticType::User, "Trader", 0.0, 0.0)
			.tooltip("Wants 1 ETH worth of USDC"),
		Node::new("wallet", VisualKind::Actor, SemanticType::Wallet, "Browser wallet", 0.0, 160.0)
			.status("CONNECTED"),
		Node::new("router", VisualKind::Process, SemanticType::Contract, "Router", 280.0, 160.0)
			.tooltip("Finds the pool and enforces slippage limits"),
		Node::new("pool", VisualKind::Store, SemanticType::Pool, "ETH/USDC pool", 560.0, 160.0)
			.status("IDLE")
			.status_at(3, "PRICING")
			.tooltip("x * y = k"),
		Node::new("token_a", VisualKind::Store, SemanticType::Token, "WETH", 560.0, 0.0),
		Node::new("token_b", VisualKind::Store, SemanticType::Token, "USDC", 560.0, 340.0),
		Node::new("lp_token", VisualKind::Store, SemanticType::Token, "LP token", 840.0, 160.0)
			.tooltip("Share of the pool reserves"),
	];

	let edges = vec![
		Edge::new("e1", "user", "wallet").label("sign"),
		Edge::new("e2", "wallet", "router").label("swapExactTokensForTokens"),
		Edge::new("e3", "router", "pool").label("swap(amountIn, minOut)"),
		Edge::new("e4", "token_a", "pool").label("transferFrom").kind(EdgeKind::Straight),
		Edge::new("e5", "pool", "token_b").label("transfer out").kind(EdgeKind::Straight),
		Edge::new("e6", "token_b", "wallet").label("USDC received").kind(EdgeKind::Step),
		Edge::new("e7", "wallet", "router").label("add/removeLiquidity").color("#2ca02c"),
		Edge::new("e8", "router", "pool").label("deposit WETH + USDC").color("#2ca02c"),
		Edge::new("e9", "pool", "lp_token").label("mint").color("#2ca02c"),
		Edge::new("e10", "lp_token", "wallet")
			.label("LP shares")
			.color("#2ca02c")
			.kind(EdgeKind::Step),
		Edge::new("e11", "lp_token", "pool").label("burn").color("#d62728"),
		Edge::new("e12", "pool", "wallet")
			.label("WETH + USDC back")
			.color("#d62728")
			.kind(EdgeKind::Step),
	];

	let handles = HashMap::from([
		("wallet".to_string(), Handle { side: true }),
		("router".to_string(), Handle { side: true }),
		("pool".to_string(), Handle { side: true }),
		("lp_token".to_string(), Handle { side: true }),
	]);

	GraphModel::new(nodes, edges, handles)
}

fn steps() -> Vec<Step> {
	vec![
		Step::new("Sign the swap", "The trader approves a WETH to USDC swap in their wallet.")
			.what("The wallet builds and signs a transaction.")
			.why("Only the key holder can move the trader's tokens."),
		Step::new("Call the router", "The signed transaction reaches the router contract.")
			.what("swapExactTokensForTokens is invoked with a minimum output.")
			.why("The router shields the trader from pool selection and slippage.")
			.code("router.swapExactTokensForTokens(amountIn, minOut, [WETH, USDC], to, deadline)"),
		Step::new(
			"Price against the pool",
			"The router pulls WETH into the pool and prices the trade.",
		)
			.what("WETH is transferred in and the curve yields the output amount.")
			.why("The constant-product invariant sets the price."),
		Step::new("Receive USDC", "The pool pays out USDC to the trader's wallet.")
			.what("USDC moves from the pool reserves to the wallet.")
			.why("The swap settles atomically within one transaction."),
		Step::new("Approve liquidity", "The trader decides to provide liquidity with both tokens.")
			.what("The wallet signs an addLiquidity call.")
			.why("Liquidity providers earn a share of swap fees."),
		Step::new("Deposit both tokens", "The router deposits WETH and USDC at the current ratio.")
			.what("Both reserves grow proportionally.")
			.why("Depositing off-ratio would shift the price.")
			.code("router.addLiquidity(WETH, USDC, amountA, amountB, minA, minB, to, deadline)"),
		Step::new("Mint LP shares", "The pool mints LP tokens representing the deposit.")
			.what("LP tokens are credited to the wallet.")
			.why("Shares track each provider's claim on the reserves."),
		Step::new("Request withdrawal", "Later, the provider calls removeLiquidity.")
			.what("The router is asked to redeem LP shares.")
			.why("Providers can exit at any time."),
		Step::new("Burn LP shares", "The LP tokens are returned to the pool and burned.")
			.what("Total LP supply shrinks.")
			.why("Burning keeps the remaining shares correctly priced."),
		Step::new("Withdraw reserves", "The pool returns WETH and USDC to the wallet.")
			.what("Both tokens arrive, including accrued fees.")
			.why("The provider's share is paid out pro rata.")
			.code("router.removeLiquidity(WETH, USDC, liquidity, minA, minB, to, deadline)"),
	]
}

fn highlights() -> Vec<HighlightEntry> {
	vec![
		HighlightEntry::default(),
		HighlightEntry::new(&["user", "wallet"], &["e1"]).update_status("wallet", "SIGNING"),
		HighlightEntry::new(&["wallet", "router"], &["e2"]).update_status("router", "ROUTING"),
		HighlightEntry::new(&["router", "pool", "token_a"], &["e3", "e4"]),
		HighlightEntry::new(&["pool", "token_b", "wallet"], &["e5", "e6"])
			.update_status("wallet", "SWAP_COMPLETE"),
		HighlightEntry::new(&["user", "wallet"], &["e1"]).update_status("wallet", "SIGNING"),
		HighlightEntry::new(&["wallet", "router", "pool"], &["e7", "e8"])
			.update_status("pool", "DEPOSIT_LOCKED"),
		HighlightEntry::new(&["pool", "lp_token", "wallet"], &["e9", "e10"])
			.update_status("lp_token", "MINTED"),
		HighlightEntry::new(&["wallet", "router"], &["e7"])
			.update_status("router", "PROCESSING_WITHDRAWAL"),
		HighlightEntry::new(&["lp_token", "pool"], &["e11"]).update_status("lp_token", "BURNED"),
		HighlightEntry::new(&["pool", "wallet"], &["e12"]).update_status("wallet", "COMPLETE"),
	]
}

pub fn scenario() -> Result<Scenario, ScenarioError> {
	Scenario::new(ID, TITLE, SUMMARY, graph()?, steps(), highlights())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_diagram::flow::local_flow;
	use crate::components::flow_diagram::resolve::resolve;

	#[test]
	fn ten_steps_then_clamped() {
		let s = scenario().unwrap();
		assert_eq!(s.timeline.highlights().len(), 11);
		let flow = local_flow(s.terminal_step());
		for _ in 0..10 {
			flow.next_step();
		}
		assert_eq!(flow.step(), 10);
		flow.next_step();
		assert_eq!(flow.step(), 10);
	}

	#[test]
	fn narrative_matches_table() {
		let s = scenario().unwrap();
		assert_eq!(s.timeline.steps().len() + 1, s.timeline.highlights().len());
		assert_eq!(s.timeline.narrative(1).unwrap().title, "Sign the swap");
		assert_eq!(s.timeline.narrative(10).unwrap().title, "Withdraw reserves");
	}

	#[test]
	fn wallet_status_progresses() {
		let s = scenario().unwrap();
		let wallet = |step| {
			resolve(step, &s.graph, &s.timeline)
				.node("wallet")
				.and_then(|n| n.data.status.clone())
		};
		assert_eq!(wallet(0).as_deref(), Some("CONNECTED"));
		assert_eq!(wallet(1).as_deref(), Some("SIGNING"));
		assert_eq!(wallet(3).as_deref(), Some("SIGNING"));
		assert_eq!(wallet(4).as_deref(), Some("SWAP_COMPLETE"));
		assert_eq!(wallet(10).as_deref(), Some("COMPLETE"));
	}

	#[test]
	fn status_by_step_shows_then_sticks() {
		let s = scenario().unwrap();
		let pool = |step| {
			resolve(step, &s.graph, &s.timeline)
				.node("pool")
				.and_then(|n| n.data.status.clone())
		};
		assert_eq!(pool(2).as_deref(), Some("IDLE"));
		assert_eq!(pool(3).as_deref(), Some("PRICING"));
		assert_eq!(pool(4).as_deref(), Some("PRICING"));
		assert_eq!(pool(6).as_deref(), Some("DEPOSIT_LOCKED"));
	}
}
