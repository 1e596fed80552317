// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Types shared between the collaborator seams and the orchestrator.

use bitcoin::secp256k1::PublicKey;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A BOLT7 short channel id identifying a channel by its funding transaction's position in the
/// chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShortChannelId(u64);

impl ShortChannelId {
	/// Assembles a short channel id from block height, transaction index, and output index.
	///
	/// The block height and transaction index are truncated to the 24 bits BOLT7 grants them.
	pub fn new(block: u32, tx_index: u32, output_index: u16) -> Self {
		Self(
			((block as u64 & 0xFFFFFF) << 40)
				| ((tx_index as u64 & 0xFFFFFF) << 16)
				| output_index as u64,
		)
	}

	/// The height of the block the funding transaction was confirmed in.
	pub fn block(&self) -> u32 {
		(self.0 >> 40) as u32
	}

	/// The index of the funding transaction within its block.
	pub fn tx_index(&self) -> u32 {
		((self.0 >> 16) & 0xFFFFFF) as u32
	}

	/// The index of the funding output within its transaction.
	pub fn output_index(&self) -> u16 {
		(self.0 & 0xFFFF) as u16
	}
}

impl From<u64> for ShortChannelId {
	fn from(value: u64) -> Self {
		Self(value)
	}
}

impl From<ShortChannelId> for u64 {
	fn from(scid: ShortChannelId) -> Self {
		scid.0
	}
}

impl fmt::Display for ShortChannelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.block(), self.tx_index(), self.output_index())
	}
}

/// One hop of a proposed payment route.
///
/// The first hop's `amount_msat` is the total amount the sender dispatches; later hops' amounts
/// decrease by the fee each traversed node keeps for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHop {
	/// The channel to forward over.
	pub channel_id: ShortChannelId,
	/// The node the channel leads to.
	pub node_id: PublicKey,
	/// The amount to hand to this hop, in millisatoshi.
	pub amount_msat: u64,
	/// The CLTV delay to grant this hop, in blocks.
	pub cltv_delay: u32,
}
