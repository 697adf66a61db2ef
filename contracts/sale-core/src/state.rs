use casper_types::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::curves::LinearCurve;
use crate::error::{Result, SaleError};
use crate::fees::FeePolicy;

/// What buyers pay with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAsset<A> {
    /// The chain's native currency, attached to the purchase
    Native,
    /// An external fungible token, pulled from the buyer by allowance
    Token(A),
}

/// What happens to native payment above the amount due.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentPolicy {
    /// Collect exactly the amount due and leave the rest with the buyer
    #[default]
    Refund,
    /// Fail the purchase unless the payment is exact
    Reject,
}

/// Construction-time parameters of a sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig<A> {
    pub slope: U512,
    pub base_price: U512,
    #[serde(default)]
    pub end_time: Option<u64>,
    #[serde(default)]
    pub fee_policy: FeePolicy,
    #[serde(default)]
    pub fee_recipient: Option<A>,
    pub treasury: A,
    pub payment_asset: PaymentAsset<A>,
    #[serde(default)]
    pub overpayment: OverpaymentPolicy,
    #[serde(default)]
    pub supply_cap: Option<U256>,
}

impl<A> SaleConfig<A> {
    pub fn validate(&self) -> Result<()> {
        self.fee_policy.validate()?;
        if self.fee_policy.charges_fee() && self.fee_recipient.is_none() {
            return Err(SaleError::InvalidConfig);
        }
        if matches!(self.supply_cap, Some(cap) if cap.is_zero()) {
            return Err(SaleError::InvalidConfig);
        }
        Ok(())
    }
}

/// Bookkeeping for one sale instance.
///
/// `total_sold` only moves forward, and only in [`crate::purchase::purchase`]
/// after the payment has settled. Fields are read through accessors so no
/// caller outside this crate can rewind them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleState<A> {
    pub(crate) total_sold: U256,
    pub(crate) curve: LinearCurve,
    pub(crate) end_time: Option<u64>,
    pub(crate) fee_policy: FeePolicy,
    pub(crate) fee_recipient: Option<A>,
    pub(crate) treasury: A,
    pub(crate) payment_asset: PaymentAsset<A>,
    pub(crate) overpayment: OverpaymentPolicy,
    pub(crate) supply_cap: Option<U256>,
    /// Payment routed to the treasury so far
    pub(crate) proceeds: U512,
    /// Payment routed to the fee recipient so far
    pub(crate) fees_collected: U512,
}

impl<A> SaleState<A> {
    /// Open a sale with nothing sold.
    pub fn new(config: SaleConfig<A>) -> Result<Self> {
        Self::restore(config, U256::zero(), U512::zero(), U512::zero())
    }

    /// Rebuild a sale from persisted running totals.
    pub fn restore(
        config: SaleConfig<A>,
        total_sold: U256,
        proceeds: U512,
        fees_collected: U512,
    ) -> Result<Self> {
        config.validate()?;
        if matches!(config.supply_cap, Some(cap) if total_sold > cap) {
            return Err(SaleError::InvalidConfig);
        }
        Ok(Self {
            total_sold,
            curve: LinearCurve::new(config.slope, config.base_price),
            end_time: config.end_time,
            fee_policy: config.fee_policy,
            fee_recipient: config.fee_recipient,
            treasury: config.treasury,
            payment_asset: config.payment_asset,
            overpayment: config.overpayment,
            supply_cap: config.supply_cap,
            proceeds,
            fees_collected,
        })
    }

    pub fn total_sold(&self) -> U256 {
        self.total_sold
    }

    pub fn curve(&self) -> &LinearCurve {
        &self.curve
    }

    pub fn end_time(&self) -> Option<u64> {
        self.end_time
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.fee_policy
    }

    pub fn fee_recipient(&self) -> Option<&A> {
        self.fee_recipient.as_ref()
    }

    pub fn treasury(&self) -> &A {
        &self.treasury
    }

    pub fn payment_asset(&self) -> &PaymentAsset<A> {
        &self.payment_asset
    }

    pub fn overpayment(&self) -> OverpaymentPolicy {
        self.overpayment
    }

    pub fn supply_cap(&self) -> Option<U256> {
        self.supply_cap
    }

    /// Payment routed to the treasury so far
    pub fn proceeds(&self) -> U512 {
        self.proceeds
    }

    /// Payment routed to the fee recipient so far
    pub fn fees_collected(&self) -> U512 {
        self.fees_collected
    }

    pub fn is_open(&self, now: u64) -> bool {
        self.end_time.map_or(true, |end| now <= end)
    }

    /// Units still available, or `None` for an uncapped sale.
    pub fn remaining(&self) -> Option<U256> {
        self.supply_cap
            .map(|cap| cap.checked_sub(self.total_sold).unwrap_or_default())
    }

    /// Marginal price of the next unit.
    pub fn current_price(&self) -> Result<U512> {
        let next = self
            .total_sold
            .checked_add(U256::one())
            .ok_or(SaleError::ArithmeticOverflow)?;
        self.curve.price_of(next)
    }
}
