// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The structured replies a payment resolves to.
//!
//! Strings we did not produce ourselves (collaborator failure details, erring-node output) pass
//! through [`sanitize`] before they land in a reply, so every emitted string field consists of
//! printable ASCII and never contains a `"` or `\`.

use crate::hex_utils;
use crate::sendpay::{failcode_name, RoutingFailure, SendpayErrorCode, SendpayFailure};

use lightning_types::payment::PaymentPreimage;

use serde_json::{json, Value};

use std::fmt;

/// The numeric error codes carried by failure replies.
pub mod codes {
	/// A payment for the same payment hash is already in flight.
	pub const PAY_IN_PROGRESS: i64 = 200;
	/// A payment for the same payment hash already succeeded.
	pub const PAY_RHASH_ALREADY_USED: i64 = 201;
	/// The destination permanently rejected the payment.
	pub const PAY_DESTINATION_PERM_FAIL: i64 = 203;
	/// No route to the destination was found.
	pub const PAY_ROUTE_NOT_FOUND: i64 = 205;
	/// Every acceptable route exceeded the caller's fee ceiling.
	pub const PAY_ROUTE_TOO_EXPENSIVE: i64 = 206;
	/// The invoice expired before an attempt could start.
	pub const PAY_INVOICE_EXPIRED: i64 = 207;
	/// The configured attempt cap was reached before the payment went through.
	pub const PAY_STOPPED_RETRYING: i64 = 210;
	/// The request itself was invalid; no payment was started.
	pub const INVALID_PARAMS: i64 = -32602;
}

/// Replaces every byte that is not printable ASCII, as well as `"` and `\`, with `?`.
///
/// Reply consumers get strings they can embed anywhere without further escaping, at the cost of
/// mangling non-ASCII text.
pub fn sanitize(input: &str) -> String {
	input
		.bytes()
		.map(|b| match b {
			b'"' | b'\\' => '?',
			0x20..=0x7e => b as char,
			_ => '?',
		})
		.collect()
}

/// A successfully completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaySuccess {
	/// The preimage the destination revealed, proving receipt.
	pub payment_preimage: PaymentPreimage,
	/// How many route queries the payment took.
	pub getroute_tries: u32,
	/// How many send attempts the payment took.
	pub sendpay_tries: u32,
}

impl PaySuccess {
	/// Renders the reply payload.
	pub fn to_json(&self) -> Value {
		json!({
			"payment_preimage": hex_utils::to_string(&self.payment_preimage.0),
			"getroute_tries": self.getroute_tries,
			"sendpay_tries": self.sendpay_tries,
		})
	}
}

/// A failed payment, shaped for a JSON-RPC style error reply.
///
/// `code` is one of [`codes`]; `data` carries the code-specific structured fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PayFailure {
	/// The numeric error code identifying the failure condition.
	pub code: i64,
	/// A human-readable description of the failure. Not intended for parsing.
	pub message: String,
	/// Structured, code-specific failure details.
	pub data: Option<Value>,
}

impl fmt::Display for PayFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}]: {}", self.code, self.message)
	}
}

impl std::error::Error for PayFailure {}

impl PayFailure {
	/// A request-validation failure; no payment context was created.
	pub(crate) fn invalid_params(message: String) -> Self {
		Self { code: codes::INVALID_PARAMS, message: sanitize(&message), data: None }
	}

	/// The invoice expired before the next attempt could begin.
	pub(crate) fn invoice_expired(
		now_secs: u64, expiry_secs: u64, getroute_tries: u32, sendpay_tries: u32,
	) -> Self {
		Self {
			code: codes::PAY_INVOICE_EXPIRED,
			message: "Invoice expired".to_string(),
			data: Some(json!({
				"now": now_secs,
				"expiry": expiry_secs,
				"getroute_tries": getroute_tries,
				"sendpay_tries": sendpay_tries,
			})),
		}
	}

	/// The route query came back empty.
	pub(crate) fn route_not_found(getroute_tries: u32, sendpay_tries: u32) -> Self {
		Self {
			code: codes::PAY_ROUTE_NOT_FOUND,
			message: "Could not find a route".to_string(),
			data: Some(json!({
				"getroute_tries": getroute_tries,
				"sendpay_tries": sendpay_tries,
			})),
		}
	}

	/// The proposed route's fee exceeded the ceiling with no fuzz left to lower.
	pub(crate) fn route_too_expensive(
		fee_msat: u64, fee_percent: f64, amount_msat: u64, max_fee_percent: f64,
		getroute_tries: u32, sendpay_tries: u32,
	) -> Self {
		Self {
			code: codes::PAY_ROUTE_TOO_EXPENSIVE,
			message: format!(
				"Fee {} is {}% of payment {}; max fee requested is {}%",
				fee_msat, fee_percent, amount_msat, max_fee_percent
			),
			data: Some(json!({
				"fee": fee_msat,
				"feepercent": fee_percent,
				"msatoshi": amount_msat,
				"maxfeepercent": max_fee_percent,
				"getroute_tries": getroute_tries,
				"sendpay_tries": sendpay_tries,
			})),
		}
	}

	/// The configured attempt cap was reached.
	pub(crate) fn stopped_retrying(getroute_tries: u32, sendpay_tries: u32) -> Self {
		Self {
			code: codes::PAY_STOPPED_RETRYING,
			message: "Gave up retrying".to_string(),
			data: Some(json!({
				"getroute_tries": getroute_tries,
				"sendpay_tries": sendpay_tries,
			})),
		}
	}

	/// A send failure the classifier routed to the caller.
	pub(crate) fn from_sendpay(
		failure: SendpayFailure, getroute_tries: u32, sendpay_tries: u32,
	) -> Self {
		match failure.code {
			SendpayErrorCode::InProgress => Self {
				code: codes::PAY_IN_PROGRESS,
				message: sanitize(&failure.details),
				data: Some(json!({
					"getroute_tries": getroute_tries,
					"sendpay_tries": sendpay_tries,
				})),
			},
			SendpayErrorCode::RhashAlreadyUsed => Self {
				code: codes::PAY_RHASH_ALREADY_USED,
				message: sanitize(&failure.details),
				data: Some(json!({
					"getroute_tries": getroute_tries,
					"sendpay_tries": sendpay_tries,
				})),
			},
			SendpayErrorCode::DestinationPermFail => {
				let data = failure.routing_failure.as_ref().map(routing_failure_data);
				let failcode =
					failure.routing_failure.as_ref().map(|f| f.failcode).unwrap_or_default();
				Self {
					code: codes::PAY_DESTINATION_PERM_FAIL,
					message: sanitize(&format!(
						"failed: {} ({})",
						failcode_name(failcode),
						failure.details
					)),
					data,
				}
			},
			// The classifier retries or fail-stops on these before they can reach us.
			SendpayErrorCode::UnparseableOnion | SendpayErrorCode::TryOtherRoute => {
				unreachable!("non-reportable sendpay error handed to the formatter")
			},
		}
	}

	/// Renders the reply payload.
	pub fn to_json(&self) -> Value {
		let mut reply = json!({
			"code": self.code,
			"message": self.message,
		});
		if let Some(data) = &self.data {
			reply["data"] = data.clone();
		}
		reply
	}
}

fn routing_failure_data(failure: &RoutingFailure) -> Value {
	let mut data = json!({
		"erring_index": failure.erring_index,
		"failcode": failure.failcode,
		"erring_node": hex_utils::to_string(&failure.erring_node.serialize()),
		"erring_channel": failure.erring_channel.to_string(),
	});
	if let Some(update) = &failure.channel_update {
		data["channel_update"] = Value::String(hex_utils::to_string(update));
	}
	data
}
