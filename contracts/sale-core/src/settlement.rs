use alloc::vec::Vec;

use casper_types::{U256, U512};

use crate::error::{Result, SaleError};
use crate::state::PaymentAsset;

/// One movement of payment from the buyer to a sale beneficiary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentLeg<A> {
    pub to: A,
    pub amount: U512,
}

/// Everything that has to move for a single purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementPlan<A> {
    pub payer: A,
    pub asset: PaymentAsset<A>,
    /// Payment legs, zero-amount legs already dropped
    pub legs: Vec<PaymentLeg<A>>,
    /// Units handed to the buyer
    pub delivery: U256,
}

impl<A> SettlementPlan<A> {
    /// Sum of all payment legs.
    pub fn total(&self) -> Result<U512> {
        self.legs.iter().try_fold(U512::zero(), |acc, leg| {
            acc.checked_add(leg.amount).ok_or(SaleError::ArithmeticOverflow)
        })
    }
}

/// Moves payment and purchased units for a purchase.
///
/// Implementations must check every leg before moving anything and must
/// either apply the whole plan or return an error having applied none of it.
pub trait Settlement<A> {
    fn settle(&mut self, plan: &SettlementPlan<A>) -> Result<()>;
}

impl<A, S: Settlement<A> + ?Sized> Settlement<A> for &mut S {
    fn settle(&mut self, plan: &SettlementPlan<A>) -> Result<()> {
        (**self).settle(plan)
    }
}
