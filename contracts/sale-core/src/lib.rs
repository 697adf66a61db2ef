//! Linear bonding-curve sale core.
//!
//! Prices purchases on `price(x) = slope * x + base_price` with exact 512-bit
//! integer arithmetic, applies the sale's fee policy, and advances the sale
//! only once the payment has settled.
//!
//! ```ignore
//! use sale_core::{get_cost, U256, U512};
//!
//! // three units after five sold, at 2x + 7: 19 + 21 + 23
//! let cost = get_cost(U256::from(5u64), U256::from(3u64), U512::from(2u64), U512::from(7u64))?;
//! assert_eq!(cost, U512::from(63u64));
//! ```
//!
//! Builds without `std` for use inside contracts; the `std` feature adds
//! [`SharedSale`] for hosts that take purchases from many threads.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod curves;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod purchase;
pub mod settlement;
#[cfg(feature = "std")]
pub mod shared;
pub mod state;

#[cfg(test)]
mod golden_vectors;

pub use casper_types::{U256, U512};

pub use curves::{cost_by_summation, get_cost, get_token_price, max_affordable, LinearCurve};
pub use error::{Result, SaleError};
pub use fees::{apply_fee, Charge, FeePolicy, FeeSplit, BPS_DENOMINATOR};
pub use ledger::InMemoryLedger;
pub use purchase::{purchase, quote, quote_max_amount, Quote, Receipt};
pub use settlement::{PaymentLeg, Settlement, SettlementPlan};
#[cfg(feature = "std")]
pub use shared::SharedSale;
pub use state::{OverpaymentPolicy, PaymentAsset, SaleConfig, SaleState};
