// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use std::time::Duration;

// Config defaults
const DEFAULT_RISKFACTOR: f64 = 1.0;
const DEFAULT_MAX_FEE_PERCENT: f64 = 0.5;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

// The factor by which the caller-provided riskfactor is scaled before it is handed to the route
// query.
pub(crate) const RISKFACTOR_SCALE: f64 = 1000.0;

// The fuzz we pass into the first route query. Higher fuzz makes it more likely that high-fee
// paths get selected, so starting high lets a generous `maxfeepercent` buy extra route
// randomization.
pub(crate) const INITIAL_ROUTE_FUZZ: f64 = 0.75;

// How much we back the fuzz off when the returned route was over the fee ceiling.
pub(crate) const FUZZ_REDUCTION_STEP: f64 = 0.15;

// Below this fuzz there is no randomization left to blame for an expensive route, so a route over
// the ceiling becomes fatal.
pub(crate) const FUZZ_EXHAUSTED_THRESHOLD: f64 = 0.01;

// The largest payment amount we accept, in millisatoshi. Keeps the fee percentage computation
// exact to well beyond six significant digits in an `f64`.
pub(crate) const MAX_PAYMENT_MSAT: u64 = u32::MAX as u64;

#[derive(Debug, Clone)]
/// Represents the configuration of a [`Payer`] instance.
///
/// ### Defaults
///
/// | Parameter                 | Value |
/// |---------------------------|-------|
/// | `default_riskfactor`      | 1.0   |
/// | `default_max_fee_percent` | 0.5   |
/// | `retry_delay`             | 3s    |
/// | `max_getroute_tries`      | None  |
///
/// [`Payer`]: crate::Payer
pub struct Config {
	/// The riskfactor used for route queries when the caller doesn't provide one.
	pub default_riskfactor: f64,
	/// The fee ceiling applied when the caller doesn't provide one, as a percentage of the
	/// payment amount (e.g. 0.5 => 0.5%).
	pub default_max_fee_percent: f64,
	/// How long we wait before retrying after a failure that hints at a block-height
	/// disagreement with a remote peer.
	pub retry_delay: Duration,
	/// An optional cap on the number of route queries a single payment may make.
	///
	/// If set to `None`, retries are bounded only by the invoice expiry.
	pub max_getroute_tries: Option<u32>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			default_riskfactor: DEFAULT_RISKFACTOR,
			default_max_fee_percent: DEFAULT_MAX_FEE_PERCENT,
			retry_delay: DEFAULT_RETRY_DELAY,
			max_getroute_tries: None,
		}
	}
}
