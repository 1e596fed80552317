// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use crate::router::RouteRequest;
use crate::types::RouteHop;

use bitcoin::secp256k1::PublicKey;

use rand::{thread_rng, Rng};

/// The ownership region for a single payment attempt.
///
/// One scope is created per attempt and replaced at the start of the next, so everything an
/// attempt allocates (its route request with the per-attempt randomization seed, and the route
/// once the reply has been bound) is released atomically at the attempt boundary. Long-retrying
/// payments never accumulate routing state.
///
/// The retry-delay timer is awaited while the scheduling attempt's scope is still live, tying the
/// timer's lifetime to the same boundary.
#[derive(Debug)]
pub(crate) struct AttemptScope {
	/// The route request dispatched for this attempt.
	pub request: RouteRequest,
	/// The route the gossip collaborator answered with, once bound.
	pub route: Vec<RouteHop>,
}

impl AttemptScope {
	/// Starts a fresh attempt scope, drawing a new randomization seed.
	pub fn begin(
		sender_id: PublicKey, receiver_id: PublicKey, amount_msat: u64, riskfactor_scaled: u64,
		min_final_cltv_expiry: u32, fuzz: f64,
	) -> Self {
		let request = RouteRequest {
			sender_id,
			receiver_id,
			amount_msat,
			riskfactor_scaled,
			min_final_cltv_expiry,
			fuzz,
			seed: thread_rng().gen(),
		};
		Self { request, route: Vec::new() }
	}

	/// Takes ownership of the route reply for the remainder of the attempt.
	pub fn bind_route(&mut self, route: Vec<RouteHop>) {
		self.route = route;
	}
}
