// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The seam towards the gossip-maintained channel graph.
//!
//! Route selection itself is delegated: the orchestrator only formulates [`RouteRequest`]s and
//! interprets the returned hop list. An empty reply means no route was found.

use crate::types::RouteHop;

use bitcoin::secp256k1::PublicKey;

use async_trait::async_trait;

/// A request for a route through the channel graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
	/// The node the route starts from, i.e., us.
	pub sender_id: PublicKey,
	/// The destination node.
	pub receiver_id: PublicKey,
	/// The amount to be delivered to the destination, in millisatoshi.
	pub amount_msat: u64,
	/// The caller's riskfactor, scaled by 1000.
	pub riskfactor_scaled: u64,
	/// The CLTV delta required at the final hop, in blocks.
	pub min_final_cltv_expiry: u32,
	/// The edge-weight perturbation factor to apply during route search, in [0.0, 0.75].
	pub fuzz: f64,
	/// A fresh random seed, making the fuzzing unpredictable per attempt.
	pub seed: u64,
}

/// The route-discovery collaborator.
///
/// Implemented over whatever answers route queries in the embedding node, typically a gossip
/// daemon maintaining the channel graph.
#[async_trait]
pub trait Router: Send + Sync {
	/// Queries a route satisfying the given request.
	///
	/// Returns the hops in forwarding order, or an empty `Vec` if no route could be found.
	async fn find_route(&self, request: &RouteRequest) -> Vec<RouteHop>;
}
