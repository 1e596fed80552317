// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Holds a payment handler allowing to pay [BOLT 11] invoices.
//!
//! [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md

use crate::config::{Config, MAX_PAYMENT_MSAT, RISKFACTOR_SCALE};
use crate::logger::{log_info, LdkLogger, Logger};
use crate::payment::retry::{PaymentParams, RetryController};
use crate::response::{PayFailure, PaySuccess};
use crate::router::Router;
use crate::sendpay::PaymentSender;

use lightning_invoice::{Bolt11Invoice, Bolt11InvoiceDescriptionRef};
use lightning_types::payment::PaymentHash;

use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::PublicKey;

use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::sync::Arc;

/// A request to pay a [BOLT 11] invoice.
///
/// Mirrors the fields of the `pay` command; omitted optional fields fall back to the defaults
/// configured via [`Config`].
///
/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
	/// The invoice to pay.
	pub bolt11: String,
	/// The amount to pay, in millisatoshi.
	///
	/// Required if and only if the invoice doesn't carry an amount itself.
	pub msatoshi: Option<u64>,
	/// The full description the invoice's description hash commits to.
	///
	/// Required if and only if the invoice uses a description hash.
	pub description: Option<String>,
	/// The riskfactor for route queries. Defaults to [`Config::default_riskfactor`].
	pub riskfactor: Option<f64>,
	/// The maximum acceptable fee as a percentage of the payment amount (e.g. 0.5 => 0.5%),
	/// in [0.0, 100.0]. Defaults to [`Config::default_max_fee_percent`].
	pub maxfeepercent: Option<f64>,
}

impl PayRequest {
	/// A request for the given invoice, with every optional field left to its default.
	pub fn new(bolt11: String) -> Self {
		Self { bolt11, msatoshi: None, description: None, riskfactor: None, maxfeepercent: None }
	}
}

/// A payment handler allowing to pay [BOLT 11] invoices.
///
/// Should be retrieved by calling [`Payer::bolt11_payment`].
///
/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
/// [`Payer::bolt11_payment`]: crate::Payer::bolt11_payment
pub struct Bolt11Payment {
	node_id: PublicKey,
	router: Arc<dyn Router>,
	sender: Arc<dyn PaymentSender>,
	config: Arc<Config>,
	logger: Arc<Logger>,
}

impl Bolt11Payment {
	pub(crate) fn new(
		node_id: PublicKey, router: Arc<dyn Router>, sender: Arc<dyn PaymentSender>,
		config: Arc<Config>, logger: Arc<Logger>,
	) -> Self {
		Self { node_id, router, sender, config, logger }
	}

	/// Pays the requested invoice, retrying with adjusted route parameters until the payment
	/// succeeds or fails for good.
	///
	/// Returns as soon as the payment's fate is known; a payment whose invoice has already
	/// expired (or whose request doesn't validate) resolves without suspending. Dropping the
	/// returned future cancels the payment, in which case no reply is produced and any pending
	/// attempt is released.
	pub async fn send(&self, request: PayRequest) -> Result<PaySuccess, PayFailure> {
		let params = self.validate(&request)?;

		log_info!(
			self.logger,
			"Initiating sending {}msat to {}",
			params.amount_msat,
			params.receiver_id
		);

		let controller = RetryController::new(
			params,
			self.node_id,
			Arc::clone(&self.router),
			Arc::clone(&self.sender),
			Arc::clone(&self.config),
			Arc::clone(&self.logger),
		);
		controller.run().await
	}

	/// Checks the request against the invoice and resolves the effective payment parameters.
	///
	/// Validation failures never construct a payment context.
	fn validate(&self, request: &PayRequest) -> Result<PaymentParams, PayFailure> {
		let invoice = Bolt11Invoice::from_str(&request.bolt11)
			.map_err(|e| PayFailure::invalid_params(format!("Invalid bolt11: {}", e)))?;

		if let Bolt11InvoiceDescriptionRef::Hash(hash) = invoice.description() {
			let description = request.description.as_ref().ok_or_else(|| {
				PayFailure::invalid_params(
					"description parameter required, invoice uses a description hash".to_string(),
				)
			})?;
			if Sha256::hash(description.as_bytes()) != hash.0 {
				return Err(PayFailure::invalid_params(
					"description does not match the invoice's description hash".to_string(),
				));
			}
		}

		let amount_msat = match invoice.amount_milli_satoshis() {
			Some(amount_msat) => {
				if request.msatoshi.is_some() {
					return Err(PayFailure::invalid_params(
						"msatoshi parameter unnecessary".to_string(),
					));
				}
				amount_msat
			},
			None => request.msatoshi.ok_or_else(|| {
				PayFailure::invalid_params("msatoshi parameter required".to_string())
			})?,
		};
		if amount_msat == 0 || amount_msat > MAX_PAYMENT_MSAT {
			return Err(PayFailure::invalid_params(format!(
				"msatoshi {} out of range, must be positive and at most {}",
				amount_msat, MAX_PAYMENT_MSAT
			)));
		}

		let riskfactor = request.riskfactor.unwrap_or(self.config.default_riskfactor);

		let max_fee_percent = request.maxfeepercent.unwrap_or(self.config.default_max_fee_percent);
		if !(max_fee_percent >= 0.0) {
			return Err(PayFailure::invalid_params(format!(
				"{} maxfeepercent must be non-negative",
				max_fee_percent
			)));
		}
		if !(max_fee_percent <= 100.0) {
			return Err(PayFailure::invalid_params(format!(
				"{} maxfeepercent must be <= 100.0",
				max_fee_percent
			)));
		}

		let expiry = invoice.duration_since_epoch().saturating_add(invoice.expiry_time());

		Ok(PaymentParams {
			payment_hash: PaymentHash(invoice.payment_hash().to_byte_array()),
			receiver_id: invoice.recover_payee_pub_key(),
			expiry,
			min_final_cltv_expiry: invoice.min_final_cltv_expiry_delta() as u32,
			amount_msat,
			riskfactor_scaled: (riskfactor * RISKFACTOR_SCALE) as u64,
			max_fee_percent,
		})
	}
}
