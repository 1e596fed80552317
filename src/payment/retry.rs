// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The retry controller driving a payment to its terminal reply.
//!
//! A payment cycles through route discovery (`AwaitingRoute`) and dispatch (`AwaitingSend`),
//! possibly pausing (`Delayed`) between attempts, until it reaches a terminal outcome: success,
//! a reported failure, no route, an exhausted fee budget, or invoice expiry. Each pass around
//! the loop is one attempt; the loop's suspension points are the two collaborator awaits and the
//! retry-delay sleep.

use crate::config::{Config, FUZZ_REDUCTION_STEP, INITIAL_ROUTE_FUZZ};
use crate::logger::{log_debug, log_info, LdkLogger, Logger};
use crate::payment::attempt::AttemptScope;
use crate::payment::fee::{evaluate_route_fee, FeeDecision};
use crate::response::{PayFailure, PaySuccess};
use crate::router::Router;
use crate::sendpay::{classify, PaymentSender, RetryDecision};
use crate::types::RouteHop;

use bitcoin::secp256k1::PublicKey;
use lightning_types::payment::PaymentHash;

use tokio::time::Instant;

use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// The parameters a payment holds constant across all of its attempts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PaymentParams {
	pub payment_hash: PaymentHash,
	pub receiver_id: PublicKey,
	/// The invoice's absolute expiry, as a duration since the Unix epoch.
	pub expiry: Duration,
	pub min_final_cltv_expiry: u32,
	pub amount_msat: u64,
	pub riskfactor_scaled: u64,
	pub max_fee_percent: f64,
}

/// Drives one payment through route discovery, fee vetting, dispatch, and retries.
pub(crate) struct RetryController {
	params: PaymentParams,

	getroute_tries: u32,
	sendpay_tries: u32,
	fuzz: f64,
	/// The current attempt's allocations; replaced at every attempt start.
	attempt: Option<AttemptScope>,

	/// Wall-clock base and monotonic tick captured at start; together they answer "now" for
	/// the expiry checks.
	started_wall: Duration,
	started_tick: Instant,

	node_id: PublicKey,
	router: Arc<dyn Router>,
	sender: Arc<dyn PaymentSender>,
	config: Arc<Config>,
	logger: Arc<Logger>,
}

impl RetryController {
	pub(crate) fn new(
		params: PaymentParams, node_id: PublicKey, router: Arc<dyn Router>,
		sender: Arc<dyn PaymentSender>, config: Arc<Config>, logger: Arc<Logger>,
	) -> Self {
		// A clock before the epoch degrades to a zero base; that can only defer the
		// expiry cutoff, never trigger it early.
		let started_wall = SystemTime::now()
			.duration_since(SystemTime::UNIX_EPOCH)
			.unwrap_or(Duration::from_secs(0));
		Self {
			params,
			getroute_tries: 0,
			sendpay_tries: 0,
			fuzz: INITIAL_ROUTE_FUZZ,
			attempt: None,
			started_wall,
			started_tick: Instant::now(),
			node_id,
			router,
			sender,
			config,
			logger,
		}
	}

	fn now_since_epoch(&self) -> Duration {
		self.started_wall + (Instant::now() - self.started_tick)
	}

	/// Runs attempts until the payment reaches a terminal reply.
	///
	/// Dropping the returned future cancels the payment: the current attempt's scope and any
	/// pending retry timer are released, and late collaborator replies go nowhere.
	pub(crate) async fn run(mut self) -> Result<PaySuccess, PayFailure> {
		loop {
			let now = self.now_since_epoch();
			if now >= self.params.expiry {
				log_info!(self.logger, "pay({}): Invoice expired", self.params.payment_hash);
				return Err(PayFailure::invoice_expired(
					now.as_secs(),
					self.params.expiry.as_secs(),
					self.getroute_tries,
					self.sendpay_tries,
				));
			}

			if let Some(cap) = self.config.max_getroute_tries {
				if self.getroute_tries >= cap {
					log_info!(
						self.logger,
						"pay({}): Giving up after {} route queries",
						self.params.payment_hash,
						self.getroute_tries
					);
					return Err(PayFailure::stopped_retrying(
						self.getroute_tries,
						self.sendpay_tries,
					));
				}
			}

			// Replacing the scope releases the previous attempt's allocations.
			let scope = self.attempt.insert(AttemptScope::begin(
				self.node_id,
				self.params.receiver_id,
				self.params.amount_msat,
				self.params.riskfactor_scaled,
				self.params.min_final_cltv_expiry,
				self.fuzz,
			));
			self.getroute_tries += 1;
			log_debug!(
				self.logger,
				"pay({}): Requesting route, attempt {} (fuzz {:.2})",
				self.params.payment_hash,
				self.getroute_tries,
				self.fuzz
			);

			let route = self.router.find_route(&scope.request).await;
			if route.is_empty() {
				log_info!(
					self.logger,
					"pay({}): Could not find a route",
					self.params.payment_hash
				);
				return Err(PayFailure::route_not_found(self.getroute_tries, self.sendpay_tries));
			}

			match evaluate_route_fee(
				&route,
				self.params.amount_msat,
				self.params.max_fee_percent,
				self.fuzz,
			) {
				FeeDecision::Accept => {},
				FeeDecision::RejectRetry { fee_msat, fee_percent } => {
					let lowered = next_fuzz(self.fuzz);
					log_debug!(
						self.logger,
						"pay({}): Route fee {}msat ({}%) over limit, lowering fuzz {:.2} -> {:.2}",
						self.params.payment_hash,
						fee_msat,
						fee_percent,
						self.fuzz,
						lowered
					);
					self.fuzz = lowered;
					continue;
				},
				FeeDecision::RejectFatal { fee_msat, fee_percent } => {
					log_info!(
						self.logger,
						"pay({}): Route fee {}msat ({}%) exceeds limit with fuzz exhausted",
						self.params.payment_hash,
						fee_msat,
						fee_percent
					);
					return Err(PayFailure::route_too_expensive(
						fee_msat,
						fee_percent,
						self.params.amount_msat,
						self.params.max_fee_percent,
						self.getroute_tries,
						self.sendpay_tries,
					));
				},
			}

			scope.bind_route(route);
			self.sendpay_tries += 1;
			log_info!(
				self.logger,
				"pay({}): Sending along route: {}",
				self.params.payment_hash,
				describe_route(&scope.route)
			);

			let result = self.sender.send_payment(self.params.payment_hash, &scope.route).await;
			match classify(result) {
				RetryDecision::Success(preimage) => {
					log_info!(self.logger, "pay({}): Success", self.params.payment_hash);
					return Ok(PaySuccess {
						payment_preimage: preimage,
						getroute_tries: self.getroute_tries,
						sendpay_tries: self.sendpay_tries,
					});
				},
				RetryDecision::Report(failure) => {
					log_info!(
						self.logger,
						"pay({}): Failed, reporting to caller",
						self.params.payment_hash
					);
					return Err(PayFailure::from_sendpay(
						failure,
						self.getroute_tries,
						self.sendpay_tries,
					));
				},
				RetryDecision::RetryNow => {
					log_info!(self.logger, "pay({}): Try another route", self.params.payment_hash);
				},
				RetryDecision::RetryAfterDelay(reason) => {
					log_info!(
						self.logger,
						"pay({}): Delay before retry: {}",
						self.params.payment_hash,
						reason
					);
					// The timer belongs to the attempt that scheduled it: the scope is
					// only replaced once the next attempt actually begins.
					tokio::time::sleep(self.config.retry_delay).await;
				},
			}
		}
	}
}

/// The fuzz to use after a fee-too-high retry.
pub(crate) fn next_fuzz(fuzz: f64) -> f64 {
	(fuzz - FUZZ_REDUCTION_STEP).max(0.0)
}

/// Renders a route as a chain of hops, starting from our own node.
fn describe_route(route: &[RouteHop]) -> String {
	let mut description = String::from("us");
	for hop in route {
		let _ = write!(
			description,
			" -> {} ({}msat, {}blk) -> {}",
			hop.channel_id, hop.amount_msat, hop.cltv_delay, hop.node_id
		);
	}
	description
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::ShortChannelId;

	use bitcoin::secp256k1::{Secp256k1, SecretKey};

	use proptest::prelude::*;

	#[test]
	fn route_description_renders_each_hop() {
		let secp = Secp256k1::new();
		let node =
			PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[0x21; 32]).unwrap());
		let route = vec![
			RouteHop {
				channel_id: ShortChannelId::new(571, 2, 1),
				node_id: node,
				amount_msat: 10_040,
				cltv_delay: 15,
			},
			RouteHop {
				channel_id: ShortChannelId::new(600, 1, 0),
				node_id: node,
				amount_msat: 10_000,
				cltv_delay: 9,
			},
		];

		let description = describe_route(&route);
		assert!(description.starts_with("us -> 571:2:1 (10040msat, 15blk) -> "));
		assert!(description.contains(" -> 600:1:0 (10000msat, 9blk) -> "));
	}

	proptest! {
		#[test]
		fn fuzz_is_non_increasing_and_clamped(fuzz in 0.0f64..=INITIAL_ROUTE_FUZZ) {
			let lowered = next_fuzz(fuzz);
			prop_assert!(lowered <= fuzz);
			prop_assert!(lowered >= 0.0);
			if fuzz >= FUZZ_REDUCTION_STEP {
				prop_assert!((lowered - (fuzz - FUZZ_REDUCTION_STEP)).abs() < f64::EPSILON);
			} else {
				prop_assert_eq!(lowered, 0.0);
			}
		}
	}
}
