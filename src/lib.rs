// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

#![crate_name = "ln_payer"]

//! # LN Payer
//! A payment attempt orchestrator for Lightning-style payment channel nodes.
//!
//! Given a [BOLT 11] payment request, the orchestrator repeatedly discovers a route through the
//! embedding node's channel graph, dispatches the payment along it, and interprets the outcome:
//! success, a fatal failure reported upstream, or a retryable failure triggering another attempt
//! with adjusted routing parameters. Route selection and onion construction are delegated to the
//! embedding node through the [`Router`] and [`PaymentSender`] seams.
//!
//! ## Getting Started
//!
//! The primary abstraction of the library is the [`Payer`], constructed from the node's own id,
//! the two collaborator seams, and a [`Config`]. Payments are made through the handler returned
//! by [`bolt11_payment`]:
//!
//! ```no_run
//! use ln_payer::{Config, Logger, LogLevel, Payer, PayRequest};
//! use std::sync::Arc;
//!
//! # async fn run(
//! # node_id: ln_payer::bitcoin::secp256k1::PublicKey,
//! # router: Arc<dyn ln_payer::Router>,
//! # sender: Arc<dyn ln_payer::PaymentSender>,
//! # ) {
//! let logger = Arc::new(Logger::new_fs_writer("/tmp/ln_payer.log".to_string(), LogLevel::Debug).unwrap());
//! let payer = Payer::new(Config::default(), node_id, router, sender, logger);
//!
//! let request = PayRequest::new("INVOICE_STR".to_string());
//! match payer.bolt11_payment().send(request).await {
//! 	Ok(success) => println!("paid: {}", success.to_json()),
//! 	Err(failure) => println!("failed: {}", failure.to_json()),
//! }
//! # }
//! ```
//!
//! [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
//! [`bolt11_payment`]: Payer::bolt11_payment
//!
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![allow(ellipsis_inclusive_range_patterns)]

mod config;
pub mod hex_utils;
mod logger;
mod payment;
mod response;
mod router;
mod sendpay;
mod types;

pub use crate::config::Config;
pub use crate::logger::{LogLevel, LogRecord, LogWriter, Logger};
pub use crate::payment::{Bolt11Payment, PayRequest};
pub use crate::response::{codes, sanitize, PayFailure, PaySuccess};
pub use crate::router::{RouteRequest, Router};
pub use crate::sendpay::{
	failcode, failcode_name, PaymentSender, RoutingFailure, SendpayErrorCode, SendpayFailure,
	SendpayResult,
};
pub use crate::types::{RouteHop, ShortChannelId};

pub use bitcoin;
pub use lightning_invoice;
pub use lightning_types;

use bitcoin::secp256k1::PublicKey;

use std::sync::Arc;

/// The payment orchestrator of a Lightning-style node.
///
/// Holds the collaborator seams and configuration shared by all payments, and hands out the
/// per-protocol payment handlers.
pub struct Payer {
	node_id: PublicKey,
	router: Arc<dyn Router>,
	sender: Arc<dyn PaymentSender>,
	config: Arc<Config>,
	logger: Arc<Logger>,
}

impl Payer {
	/// Creates a new payer for the node identified by `node_id`, querying routes and
	/// dispatching sends through the given collaborators.
	pub fn new(
		config: Config, node_id: PublicKey, router: Arc<dyn Router>,
		sender: Arc<dyn PaymentSender>, logger: Arc<Logger>,
	) -> Self {
		Self { node_id, router, sender, config: Arc::new(config), logger }
	}

	/// Returns the id of the node this payer pays on behalf of.
	pub fn node_id(&self) -> PublicKey {
		self.node_id
	}

	/// Returns a payment handler allowing to pay [BOLT 11] invoices.
	///
	/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
	pub fn bolt11_payment(&self) -> Bolt11Payment {
		Bolt11Payment::new(
			self.node_id,
			Arc::clone(&self.router),
			Arc::clone(&self.sender),
			Arc::clone(&self.config),
			Arc::clone(&self.logger),
		)
	}
}
