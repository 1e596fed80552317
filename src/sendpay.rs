// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The seam towards the payment-send subsystem, its failure taxonomy, and the classifier mapping
//! a send outcome to the orchestrator's next move.

use crate::types::{RouteHop, ShortChannelId};

use bitcoin::secp256k1::PublicKey;
use lightning_types::payment::{PaymentHash, PaymentPreimage};

use async_trait::async_trait;

use std::fmt;

/// BOLT4 onion failure codes, as far as this crate names them.
pub mod failcode {
	/// Set for failure codes where the erring node doesn't know the onion's ephemeral key.
	pub const BADONION: u16 = 0x8000;
	/// Set for permanent failures; retrying the same route won't help.
	pub const PERM: u16 = 0x4000;
	/// Set for failures relating to the erring node itself.
	pub const NODE: u16 = 0x2000;
	/// Set when the failure message carries a channel update.
	pub const UPDATE: u16 = 0x1000;

	/// An intermediate hop considered the HTLC expiry too close to the current height.
	pub const EXPIRY_TOO_SOON: u16 = UPDATE | 14;
	/// The final hop considered the HTLC expiry too close to the current height.
	pub const FINAL_EXPIRY_TOO_SOON: u16 = 17;
	/// A hop considered the total CLTV budget of the route excessive.
	pub const EXPIRY_TOO_FAR: u16 = 21;
}

/// Returns the BOLT4 name of the given onion failure code.
pub fn failcode_name(code: u16) -> &'static str {
	use failcode::{BADONION, NODE, PERM, UPDATE};
	match code {
		c if c == (PERM | 1) => "WIRE_INVALID_REALM",
		c if c == (NODE | 2) => "WIRE_TEMPORARY_NODE_FAILURE",
		c if c == (PERM | NODE | 2) => "WIRE_PERMANENT_NODE_FAILURE",
		c if c == (PERM | NODE | 3) => "WIRE_REQUIRED_NODE_FEATURE_MISSING",
		c if c == (BADONION | PERM | 4) => "WIRE_INVALID_ONION_VERSION",
		c if c == (BADONION | PERM | 5) => "WIRE_INVALID_ONION_HMAC",
		c if c == (BADONION | PERM | 6) => "WIRE_INVALID_ONION_KEY",
		c if c == (UPDATE | 7) => "WIRE_TEMPORARY_CHANNEL_FAILURE",
		c if c == (PERM | 8) => "WIRE_PERMANENT_CHANNEL_FAILURE",
		c if c == (PERM | 9) => "WIRE_REQUIRED_CHANNEL_FEATURE_MISSING",
		c if c == (PERM | 10) => "WIRE_UNKNOWN_NEXT_PEER",
		c if c == (UPDATE | 11) => "WIRE_AMOUNT_BELOW_MINIMUM",
		c if c == (UPDATE | 12) => "WIRE_FEE_INSUFFICIENT",
		c if c == (UPDATE | 13) => "WIRE_INCORRECT_CLTV_EXPIRY",
		failcode::EXPIRY_TOO_SOON => "WIRE_EXPIRY_TOO_SOON",
		c if c == (PERM | 15) => "WIRE_UNKNOWN_PAYMENT_HASH",
		c if c == (PERM | 16) => "WIRE_INCORRECT_PAYMENT_AMOUNT",
		failcode::FINAL_EXPIRY_TOO_SOON => "WIRE_FINAL_EXPIRY_TOO_SOON",
		18 => "WIRE_FINAL_INCORRECT_CLTV_EXPIRY",
		19 => "WIRE_FINAL_INCORRECT_HTLC_AMOUNT",
		c if c == (UPDATE | 20) => "WIRE_CHANNEL_DISABLED",
		failcode::EXPIRY_TOO_FAR => "WIRE_EXPIRY_TOO_FAR",
		_ => "WIRE_UNKNOWN_FAILURE",
	}
}

/// Details of a routing failure reported through the onion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingFailure {
	/// The index of the erring hop within the route, 0 meaning our own node.
	pub erring_index: u32,
	/// The BOLT4 failure code the erring hop reported.
	pub failcode: u16,
	/// The erring node.
	pub erring_node: PublicKey,
	/// The channel the failure concerns.
	pub erring_channel: ShortChannelId,
	/// A channel update the erring hop may have attached, as raw gossip bytes.
	pub channel_update: Option<Vec<u8>>,
}

/// The error class a failed send resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendpayErrorCode {
	/// A payment for the same payment hash is already in flight.
	InProgress,
	/// A payment for the same payment hash already succeeded.
	RhashAlreadyUsed,
	/// An intermediate hop could not parse the onion we constructed.
	///
	/// The send subsystem resolves these internally; one surfacing here is a contract
	/// violation.
	UnparseableOnion,
	/// The destination itself permanently rejected the payment.
	DestinationPermFail,
	/// The route failed in a way that another route may not.
	TryOtherRoute,
}

impl fmt::Display for SendpayErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InProgress => write!(f, "payment already in progress"),
			Self::RhashAlreadyUsed => write!(f, "payment hash already used"),
			Self::UnparseableOnion => write!(f, "malformed onion"),
			Self::DestinationPermFail => write!(f, "destination permanently failed payment"),
			Self::TryOtherRoute => write!(f, "route failed, another may succeed"),
		}
	}
}

/// A failed send, as reported by the payment-send collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendpayFailure {
	/// The error class.
	pub code: SendpayErrorCode,
	/// The routing failure extracted from the onion error, where one exists.
	pub routing_failure: Option<RoutingFailure>,
	/// A human-readable description of the failure.
	pub details: String,
}

/// The terminal outcome of a single payment send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendpayResult {
	/// The destination accepted the payment and revealed the preimage.
	Success {
		/// The preimage of the payment hash, proving receipt.
		preimage: PaymentPreimage,
	},
	/// The payment did not go through.
	Failure(SendpayFailure),
}

/// The payment-send collaborator.
///
/// Implemented over the subsystem constructing onions and tracking HTLC state. A call resolves
/// exactly once, after the payment's fate along the given route is known.
#[async_trait]
pub trait PaymentSender: Send + Sync {
	/// Dispatches the payment along the given route and waits for its outcome.
	async fn send_payment(&self, payment_hash: PaymentHash, route: &[RouteHop]) -> SendpayResult;
}

/// What the orchestrator should do in response to a send outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RetryDecision {
	/// The payment succeeded.
	Success(PaymentPreimage),
	/// The failure is final for this payment; report it to the caller.
	Report(SendpayFailure),
	/// Try another route right away.
	RetryNow,
	/// Try another route after a short pause, for the contained reason.
	RetryAfterDelay(String),
}

/// Classifies a send outcome into the orchestrator's next move.
///
/// The `WIRE_EXPIRY_TOO_FAR`, `WIRE_EXPIRY_TOO_SOON`, and `WIRE_FINAL_EXPIRY_TOO_SOON` routing
/// failures may arise due to disagreement between peers about the current block height, so those
/// get a pause before the retry.
///
/// # Panics
///
/// Panics if the result carries [`SendpayErrorCode::UnparseableOnion`]; the send subsystem
/// resolves those internally, so one reaching this layer is a programming error.
pub(crate) fn classify(result: SendpayResult) -> RetryDecision {
	let failure = match result {
		SendpayResult::Success { preimage } => return RetryDecision::Success(preimage),
		SendpayResult::Failure(failure) => failure,
	};

	match failure.code {
		SendpayErrorCode::InProgress
		| SendpayErrorCode::RhashAlreadyUsed
		| SendpayErrorCode::DestinationPermFail => RetryDecision::Report(failure),
		SendpayErrorCode::UnparseableOnion => {
			panic!("send subsystem reported an unparseable onion for a payment we constructed");
		},
		SendpayErrorCode::TryOtherRoute => {
			match failure.routing_failure.as_ref().map(|f| f.failcode) {
				Some(
					code @ (failcode::EXPIRY_TOO_SOON
					| failcode::FINAL_EXPIRY_TOO_SOON
					| failcode::EXPIRY_TOO_FAR),
				) => RetryDecision::RetryAfterDelay(format!(
					"Possible blockheight disagreement ({} from peer)",
					failcode_name(code)
				)),
				_ => RetryDecision::RetryNow,
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dummy_node() -> PublicKey {
		let secp = bitcoin::secp256k1::Secp256k1::new();
		let seckey = bitcoin::secp256k1::SecretKey::from_slice(&[0x42; 32]).unwrap();
		PublicKey::from_secret_key(&secp, &seckey)
	}

	fn try_other_route(failcode: u16) -> SendpayResult {
		SendpayResult::Failure(SendpayFailure {
			code: SendpayErrorCode::TryOtherRoute,
			routing_failure: Some(RoutingFailure {
				erring_index: 1,
				failcode,
				erring_node: dummy_node(),
				erring_channel: ShortChannelId::new(100, 1, 0),
				channel_update: None,
			}),
			details: "channel unhappy".to_string(),
		})
	}

	#[test]
	fn success_classifies_as_success() {
		let preimage = PaymentPreimage([0x11; 32]);
		assert_eq!(
			classify(SendpayResult::Success { preimage }),
			RetryDecision::Success(preimage)
		);
	}

	#[test]
	fn fatal_codes_classify_as_report() {
		for code in [
			SendpayErrorCode::InProgress,
			SendpayErrorCode::RhashAlreadyUsed,
			SendpayErrorCode::DestinationPermFail,
		] {
			let failure = SendpayFailure {
				code,
				routing_failure: None,
				details: "nope".to_string(),
			};
			assert_eq!(
				classify(SendpayResult::Failure(failure.clone())),
				RetryDecision::Report(failure)
			);
		}
	}

	#[test]
	fn blockheight_disagreement_classifies_as_delayed_retry() {
		for code in [
			failcode::EXPIRY_TOO_SOON,
			failcode::FINAL_EXPIRY_TOO_SOON,
			failcode::EXPIRY_TOO_FAR,
		] {
			match classify(try_other_route(code)) {
				RetryDecision::RetryAfterDelay(reason) => {
					assert!(reason.contains(failcode_name(code)));
				},
				decision => panic!("unexpected decision {:?}", decision),
			}
		}
	}

	#[test]
	fn other_route_failures_classify_as_immediate_retry() {
		assert_eq!(
			classify(try_other_route(failcode::UPDATE | 7)),
			RetryDecision::RetryNow
		);

		// A missing routing-failure record still means the route is worth replacing.
		let failure = SendpayFailure {
			code: SendpayErrorCode::TryOtherRoute,
			routing_failure: None,
			details: "no details".to_string(),
		};
		assert_eq!(classify(SendpayResult::Failure(failure)), RetryDecision::RetryNow);
	}

	#[test]
	#[should_panic]
	fn unparseable_onion_is_fail_stop() {
		let failure = SendpayFailure {
			code: SendpayErrorCode::UnparseableOnion,
			routing_failure: None,
			details: "garbage".to_string(),
		};
		classify(SendpayResult::Failure(failure));
	}

	#[test]
	fn failcode_names_cover_the_delay_set() {
		assert_eq!(failcode_name(failcode::EXPIRY_TOO_SOON), "WIRE_EXPIRY_TOO_SOON");
		assert_eq!(failcode_name(failcode::FINAL_EXPIRY_TOO_SOON), "WIRE_FINAL_EXPIRY_TOO_SOON");
		assert_eq!(failcode_name(failcode::EXPIRY_TOO_FAR), "WIRE_EXPIRY_TOO_FAR");
		assert_eq!(failcode_name(0xffff), "WIRE_UNKNOWN_FAILURE");
	}
}
