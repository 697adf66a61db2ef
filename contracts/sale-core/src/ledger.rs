use alloc::collections::BTreeMap;

use casper_types::{U256, U512};

use crate::error::{Result, SaleError};
use crate::settlement::{PaymentLeg, Settlement, SettlementPlan};
use crate::state::PaymentAsset;

/// Balances for hosts that settle purchases in memory.
///
/// Tracks native balances, payment-token balances, the allowance each token
/// holder granted the sale, and the units delivered to each buyer. A plan is
/// staged against a scratch copy of the touched entries and written back only
/// when every leg fits.
#[derive(Clone, Debug)]
pub struct InMemoryLedger<A: Ord> {
    native: BTreeMap<A, U512>,
    tokens: BTreeMap<(A, A), U512>,
    allowances: BTreeMap<(A, A), U512>,
    delivered: BTreeMap<A, U256>,
}

impl<A: Ord + Clone> Default for InMemoryLedger<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Ord + Clone> InMemoryLedger<A> {
    pub fn new() -> Self {
        Self {
            native: BTreeMap::new(),
            tokens: BTreeMap::new(),
            allowances: BTreeMap::new(),
            delivered: BTreeMap::new(),
        }
    }

    /// Fund `owner` with native currency. Fails with `ArithmeticOverflow`
    /// rather than capping the balance.
    pub fn credit_native(&mut self, owner: A, amount: U512) -> Result<()> {
        let balance = self.native.entry(owner).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn credit_token(&mut self, token: A, owner: A, amount: U512) -> Result<()> {
        let balance = self.tokens.entry((token, owner)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Let the sale pull up to `amount` of `token` from `owner`.
    pub fn approve(&mut self, token: A, owner: A, amount: U512) {
        self.allowances.insert((token, owner), amount);
    }

    pub fn native_balance(&self, owner: &A) -> U512 {
        self.native.get(owner).copied().unwrap_or_default()
    }

    pub fn token_balance(&self, token: &A, owner: &A) -> U512 {
        self.tokens
            .get(&(token.clone(), owner.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: &A, owner: &A) -> U512 {
        self.allowances
            .get(&(token.clone(), owner.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn delivered(&self, buyer: &A) -> U256 {
        self.delivered.get(buyer).copied().unwrap_or_default()
    }
}

/// Debit `payer` and credit every leg on a scratch copy of `balances`.
fn stage<K, A>(
    balances: &BTreeMap<K, U512>,
    payer: K,
    legs: &[PaymentLeg<A>],
    key: impl Fn(&A) -> K,
) -> Result<BTreeMap<K, U512>>
where
    K: Ord + Clone,
{
    let mut staged: BTreeMap<K, U512> = BTreeMap::new();
    let read = |staged: &BTreeMap<K, U512>, at: &K| {
        staged
            .get(at)
            .or_else(|| balances.get(at))
            .copied()
            .unwrap_or_default()
    };

    let total = legs.iter().try_fold(U512::zero(), |acc, leg| {
        acc.checked_add(leg.amount).ok_or(SaleError::ArithmeticOverflow)
    })?;
    let debited = read(&staged, &payer)
        .checked_sub(total)
        .ok_or(SaleError::InsufficientBalance)?;
    staged.insert(payer, debited);

    for leg in legs {
        let at = key(&leg.to);
        let credited = read(&staged, &at)
            .checked_add(leg.amount)
            .ok_or(SaleError::ArithmeticOverflow)?;
        staged.insert(at, credited);
    }
    Ok(staged)
}

impl<A: Ord + Clone> Settlement<A> for InMemoryLedger<A> {
    fn settle(&mut self, plan: &SettlementPlan<A>) -> Result<()> {
        let delivered = self
            .delivered(&plan.payer)
            .checked_add(plan.delivery)
            .ok_or(SaleError::ArithmeticOverflow)?;

        match &plan.asset {
            PaymentAsset::Native => {
                let staged = stage(&self.native, plan.payer.clone(), &plan.legs, A::clone)?;
                self.native.extend(staged);
            }
            PaymentAsset::Token(token) => {
                let total = plan.total()?;
                let allowance_key = (token.clone(), plan.payer.clone());
                let remaining = self
                    .allowances
                    .get(&allowance_key)
                    .copied()
                    .unwrap_or_default()
                    .checked_sub(total)
                    .ok_or(SaleError::InsufficientAllowance)?;

                let staged = stage(
                    &self.tokens,
                    (token.clone(), plan.payer.clone()),
                    &plan.legs,
                    |to: &A| (token.clone(), to.clone()),
                )?;
                self.tokens.extend(staged);
                self.allowances.insert(allowance_key, remaining);
            }
        }

        self.delivered.insert(plan.payer.clone(), delivered);
        Ok(())
    }
}
