use casper_types::U512;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SaleError};

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fee taken from an amount, and what is left of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee: U512,
    pub net: U512,
}

/// Split `amount` into a fee and the remainder.
///
/// The fee rounds up so the fee recipient is never under-charged;
/// `fee + net == amount` holds exactly.
pub fn apply_fee(amount: U512, fee_bps: u64) -> Result<FeeSplit> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(SaleError::InvalidFee);
    }

    let denominator = U512::from(BPS_DENOMINATOR);
    let scaled = amount
        .checked_mul(U512::from(fee_bps))
        .ok_or(SaleError::ArithmeticOverflow)?;

    let mut fee = scaled / denominator;
    if !(scaled % denominator).is_zero() {
        fee += U512::one();
    }

    Ok(FeeSplit {
        fee,
        net: amount - fee,
    })
}

/// How a sale charges its fee, fixed when the sale is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "bps", rename_all = "snake_case")]
pub enum FeePolicy {
    /// No fee
    #[default]
    None,
    /// Buyer pays the curve cost plus the fee
    AddOnTop(u64),
    /// Buyer pays the curve cost; the fee comes out of the proceeds
    DeductFromProceeds(u64),
}

/// Amounts owed by a buyer for one purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charge {
    /// What the buyer must pay
    pub total_due: U512,
    /// Share routed to the fee recipient
    pub fee: U512,
    /// Share routed to the treasury
    pub proceeds: U512,
}

impl FeePolicy {
    pub fn bps(&self) -> u64 {
        match self {
            FeePolicy::None => 0,
            FeePolicy::AddOnTop(bps) | FeePolicy::DeductFromProceeds(bps) => *bps,
        }
    }

    pub fn charges_fee(&self) -> bool {
        self.bps() > 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.bps() > BPS_DENOMINATOR {
            return Err(SaleError::InvalidFee);
        }
        Ok(())
    }

    /// Price a curve cost under this policy. `proceeds + fee == total_due`.
    pub fn charge(&self, cost: U512) -> Result<Charge> {
        match *self {
            FeePolicy::None => Ok(Charge {
                total_due: cost,
                fee: U512::zero(),
                proceeds: cost,
            }),
            FeePolicy::AddOnTop(bps) => {
                let split = apply_fee(cost, bps)?;
                let total_due = cost
                    .checked_add(split.fee)
                    .ok_or(SaleError::ArithmeticOverflow)?;
                Ok(Charge {
                    total_due,
                    fee: split.fee,
                    proceeds: cost,
                })
            }
            FeePolicy::DeductFromProceeds(bps) => {
                let split = apply_fee(cost, bps)?;
                Ok(Charge {
                    total_due: cost,
                    fee: split.fee,
                    proceeds: split.net,
                })
            }
        }
    }
}
