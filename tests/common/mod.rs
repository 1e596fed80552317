#![allow(dead_code)]

use ln_payer::{
	Config, LogRecord, LogWriter, Logger, PayRequest, Payer, PaymentSender, RouteHop,
	RouteRequest, Router, SendpayResult, ShortChannelId,
};

use lightning_invoice::{Currency, InvoiceBuilder};
use lightning_types::payment::{PaymentHash, PaymentPreimage, PaymentSecret};

use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};

use async_trait::async_trait;

use tokio::time::Instant;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// The preimage all test invoices commit to.
pub const TEST_PREIMAGE: PaymentPreimage = PaymentPreimage([0x11; 32]);

/// The key test invoices are signed with; its public key is the payment destination.
const INVOICE_KEY: [u8; 32] = [0x42; 32];

pub fn test_payment_hash() -> PaymentHash {
	PaymentHash(Sha256::hash(&TEST_PREIMAGE.0).to_byte_array())
}

pub fn node_key(byte: u8) -> PublicKey {
	let secp = Secp256k1::new();
	PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&[byte; 32]).unwrap())
}

pub fn invoice_node_id() -> PublicKey {
	let secp = Secp256k1::new();
	PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&INVOICE_KEY).unwrap())
}

/// Builds a freshly-timestamped test invoice committing to [`TEST_PREIMAGE`].
pub fn build_invoice(amount_msat: Option<u64>, expiry: Duration) -> String {
	let secp = Secp256k1::new();
	let seckey = SecretKey::from_slice(&INVOICE_KEY).unwrap();

	let builder = InvoiceBuilder::new(Currency::Regtest)
		.description("integration test".to_string())
		.payment_hash(Sha256::hash(&TEST_PREIMAGE.0))
		.payment_secret(PaymentSecret([0x02; 32]))
		.duration_since_epoch(SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap())
		.expiry_time(expiry)
		.min_final_cltv_expiry_delta(18);
	let builder = match amount_msat {
		Some(amount_msat) => builder.amount_milli_satoshis(amount_msat),
		None => builder,
	};
	builder
		.build_signed(|hash| secp.sign_ecdsa_recoverable(hash, &seckey))
		.unwrap()
		.to_string()
}

/// A two-hop route delivering `final_amount_msat` to the invoice's destination, with the fee
/// being the difference to `first_amount_msat`.
pub fn two_hop_route(first_amount_msat: u64, final_amount_msat: u64) -> Vec<RouteHop> {
	vec![
		RouteHop {
			channel_id: ShortChannelId::new(571, 2, 1),
			node_id: node_key(0x55),
			amount_msat: first_amount_msat,
			cltv_delay: 27,
		},
		RouteHop {
			channel_id: ShortChannelId::new(600, 1, 0),
			node_id: invoice_node_id(),
			amount_msat: final_amount_msat,
			cltv_delay: 18,
		},
	]
}

/// One scripted reply of the route-discovery mock.
#[derive(Debug, Clone)]
pub enum RouterReply {
	Route(Vec<RouteHop>),
	NoRoute,
	/// Never reply; the query stays outstanding forever.
	Pending,
}

/// A `Router` handing out scripted replies and recording every request it sees.
///
/// Once the script runs dry, further queries find no route.
pub struct ScriptedRouter {
	replies: Mutex<VecDeque<RouterReply>>,
	requests: Mutex<Vec<(RouteRequest, Instant)>>,
}

impl ScriptedRouter {
	pub fn new(replies: Vec<RouterReply>) -> Arc<Self> {
		Arc::new(Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) })
	}

	pub fn requests(&self) -> Vec<(RouteRequest, Instant)> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl Router for ScriptedRouter {
	async fn find_route(&self, request: &RouteRequest) -> Vec<RouteHop> {
		self.requests.lock().unwrap().push((*request, Instant::now()));
		let reply = self.replies.lock().unwrap().pop_front();
		match reply {
			Some(RouterReply::Route(route)) => route,
			Some(RouterReply::NoRoute) | None => Vec::new(),
			Some(RouterReply::Pending) => {
				std::future::pending::<()>().await;
				unreachable!()
			},
		}
	}
}

/// One scripted reply of the payment-send mock.
#[derive(Debug, Clone)]
pub enum SenderReply {
	Result(SendpayResult),
	/// Resolve with the result only after the given (virtual) time has passed.
	DelayedResult(Duration, SendpayResult),
}

/// A `PaymentSender` handing out scripted results and recording every dispatch.
pub struct ScriptedSender {
	replies: Mutex<VecDeque<SenderReply>>,
	calls: Mutex<Vec<(PaymentHash, Vec<RouteHop>, Instant)>>,
}

impl ScriptedSender {
	pub fn new(replies: Vec<SenderReply>) -> Arc<Self> {
		Arc::new(Self { replies: Mutex::new(replies.into()), calls: Mutex::new(Vec::new()) })
	}

	pub fn calls(&self) -> Vec<(PaymentHash, Vec<RouteHop>, Instant)> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl PaymentSender for ScriptedSender {
	async fn send_payment(&self, payment_hash: PaymentHash, route: &[RouteHop]) -> SendpayResult {
		self.calls.lock().unwrap().push((payment_hash, route.to_vec(), Instant::now()));
		let reply = self
			.replies
			.lock()
			.unwrap()
			.pop_front()
			.expect("test script provided no sendpay result");
		match reply {
			SenderReply::Result(result) => result,
			SenderReply::DelayedResult(delay, result) => {
				tokio::time::sleep(delay).await;
				result
			},
		}
	}
}

struct PrintWriter;

impl LogWriter for PrintWriter {
	fn log(&self, record: LogRecord) {
		println!(
			"{:<5} [{}:{}] {}",
			record.level.to_string(),
			record.module_path,
			record.line,
			record.args
		);
	}
}

pub fn test_logger() -> Arc<Logger> {
	Arc::new(Logger::new_custom_writer(Arc::new(PrintWriter)))
}

pub fn test_payer(router: &Arc<ScriptedRouter>, sender: &Arc<ScriptedSender>) -> Payer {
	test_payer_with_config(Config::default(), router, sender)
}

pub fn test_payer_with_config(
	config: Config, router: &Arc<ScriptedRouter>, sender: &Arc<ScriptedSender>,
) -> Payer {
	Payer::new(
		config,
		node_key(0x01),
		Arc::clone(router) as Arc<dyn Router>,
		Arc::clone(sender) as Arc<dyn PaymentSender>,
		test_logger(),
	)
}

pub fn pay_request(amount_msat: Option<u64>, expiry: Duration) -> PayRequest {
	PayRequest::new(build_invoice(amount_msat, expiry))
}
