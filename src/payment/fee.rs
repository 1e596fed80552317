// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use crate::config::FUZZ_EXHAUSTED_THRESHOLD;
use crate::types::RouteHop;

/// The fee policy's verdict on a proposed route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FeeDecision {
	/// The fee is within the caller's ceiling; send along this route.
	Accept,
	/// The fee is over the ceiling, but lowering the route fuzz may yield a cheaper route.
	RejectRetry {
		/// The route's total fee, in millisatoshi.
		fee_msat: u64,
		/// The fee as a percentage of the payment amount.
		fee_percent: f64,
	},
	/// The fee is over the ceiling and the fuzz is exhausted; the payment fails.
	RejectFatal {
		/// The route's total fee, in millisatoshi.
		fee_msat: u64,
		/// The fee as a percentage of the payment amount.
		fee_percent: f64,
	},
}

/// Evaluates the proposed route's fee against the caller's ceiling.
///
/// The fee is what the first hop receives beyond the amount delivered to the destination. The
/// percentage is computed in `f64`; with amounts bounded to `u32::MAX` msat this is exact to well
/// beyond six significant digits. A fee exactly at the ceiling is acceptable.
pub(crate) fn evaluate_route_fee(
	route: &[RouteHop], amount_msat: u64, max_fee_percent: f64, fuzz: f64,
) -> FeeDecision {
	debug_assert!(!route.is_empty());
	debug_assert!(route[0].amount_msat >= amount_msat);

	let fee_msat = route[0].amount_msat.saturating_sub(amount_msat);
	let fee_percent = (fee_msat as f64) * 100.0 / (amount_msat as f64);

	if fee_percent <= max_fee_percent {
		FeeDecision::Accept
	} else if fuzz < FUZZ_EXHAUSTED_THRESHOLD {
		FeeDecision::RejectFatal { fee_msat, fee_percent }
	} else {
		FeeDecision::RejectRetry { fee_msat, fee_percent }
	}
}
