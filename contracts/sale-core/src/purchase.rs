use alloc::vec::Vec;
use core::fmt::Debug;

use casper_types::{U256, U512};
use tracing::{debug, info, warn};

use crate::error::{Result, SaleError};
use crate::settlement::{PaymentLeg, Settlement, SettlementPlan};
use crate::state::{OverpaymentPolicy, PaymentAsset, SaleState};

/// Price of a prospective purchase against the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    /// Curve cost of the units
    pub cost: U512,
    pub fee: U512,
    /// What the buyer pays
    pub total_due: U512,
    /// What the treasury receives
    pub proceeds: U512,
}

/// Record of a settled purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt<A> {
    pub buyer: A,
    pub amount: U256,
    pub cost: U512,
    pub fee: U512,
    pub total_paid: U512,
    /// Part of the offered payment that was not collected
    pub refund: U512,
    pub total_sold_after: U256,
}

/// Price `amount` units at the current point of the curve, fees included.
pub fn quote<A>(state: &SaleState<A>, amount: U256) -> Result<Quote> {
    let quote = price(state, amount)?;
    debug!(
        sold = %state.total_sold(),
        amount = %amount,
        cost = %quote.cost,
        total_due = %quote.total_due,
        "quoted purchase"
    );
    Ok(quote)
}

fn price<A>(state: &SaleState<A>, amount: U256) -> Result<Quote> {
    let cost = state.curve.cost(state.total_sold(), amount)?;
    let charge = state.fee_policy.charge(cost)?;
    Ok(Quote {
        cost,
        fee: charge.fee,
        total_due: charge.total_due,
        proceeds: charge.proceeds,
    })
}

/// Largest amount a payment of `budget` buys right now, fees included.
///
/// Amounts whose price overflows count as unaffordable.
pub fn quote_max_amount<A>(state: &SaleState<A>, budget: U512) -> Result<U256> {
    let cap = state.supply_cap;
    let sold = state.total_sold;

    let mut lo = U256::zero();
    let mut hi = state.curve.max_affordable(sold, budget, cap)?;
    // the fee only ever raises the bill, so the fee-free answer bounds the search
    while lo < hi {
        let gap = hi - lo;
        let mid = lo + gap / 2 + gap % 2;
        let affordable = match price(state, mid) {
            Ok(quote) => quote.total_due <= budget,
            Err(SaleError::ArithmeticOverflow) => false,
            Err(other) => return Err(other),
        };
        if affordable {
            lo = mid;
        } else {
            hi = mid - U256::one();
        }
    }
    debug!(sold = %sold, budget = %budget, amount = %lo, "quoted max amount");
    Ok(lo)
}

/// Sell `amount` units to `buyer`, who offers `payment`.
///
/// Checks run before anything moves: non-zero amount, sale still open at
/// `now`, supply left, payment covering the amount due. The settlement then
/// moves the payment and the units in one step, and only after it succeeds
/// does `state` advance. On any error `state` is left exactly as it was.
pub fn purchase<A, S>(
    state: &mut SaleState<A>,
    buyer: A,
    amount: U256,
    payment: U512,
    now: u64,
    settlement: &mut S,
) -> Result<Receipt<A>>
where
    A: Clone + Debug,
    S: Settlement<A> + ?Sized,
{
    match try_purchase(state, buyer.clone(), amount, payment, now, settlement) {
        Ok(receipt) => {
            info!(
                buyer = ?receipt.buyer,
                amount = %receipt.amount,
                cost = %receipt.cost,
                fee = %receipt.fee,
                refund = %receipt.refund,
                total_sold = %receipt.total_sold_after,
                "purchase settled"
            );
            Ok(receipt)
        }
        Err(error) => {
            warn!(buyer = ?buyer, amount = %amount, payment = %payment, %error, "purchase rejected");
            Err(error)
        }
    }
}

fn try_purchase<A, S>(
    state: &mut SaleState<A>,
    buyer: A,
    amount: U256,
    payment: U512,
    now: u64,
    settlement: &mut S,
) -> Result<Receipt<A>>
where
    A: Clone,
    S: Settlement<A> + ?Sized,
{
    if amount.is_zero() {
        return Err(SaleError::InvalidAmount);
    }
    if !state.is_open(now) {
        return Err(SaleError::SaleEnded);
    }

    let sold_after = state
        .total_sold
        .checked_add(amount)
        .ok_or(SaleError::ArithmeticOverflow)?;
    if matches!(state.supply_cap, Some(cap) if sold_after > cap) {
        return Err(SaleError::SupplyExhausted);
    }

    let quote = quote(state, amount)?;
    if payment < quote.total_due {
        return Err(SaleError::InsufficientPayment);
    }
    let refund = payment - quote.total_due;
    if !refund.is_zero()
        && matches!(state.payment_asset, PaymentAsset::Native)
        && state.overpayment == OverpaymentPolicy::Reject
    {
        return Err(SaleError::Overpayment);
    }

    let proceeds_after = state
        .proceeds
        .checked_add(quote.proceeds)
        .ok_or(SaleError::ArithmeticOverflow)?;
    let fees_after = state
        .fees_collected
        .checked_add(quote.fee)
        .ok_or(SaleError::ArithmeticOverflow)?;

    let mut legs = Vec::with_capacity(2);
    if !quote.proceeds.is_zero() {
        legs.push(PaymentLeg {
            to: state.treasury.clone(),
            amount: quote.proceeds,
        });
    }
    if !quote.fee.is_zero() {
        let recipient = state.fee_recipient.clone().ok_or(SaleError::InvalidConfig)?;
        legs.push(PaymentLeg {
            to: recipient,
            amount: quote.fee,
        });
    }

    let plan = SettlementPlan {
        payer: buyer.clone(),
        asset: state.payment_asset.clone(),
        legs,
        delivery: amount,
    };
    settlement.settle(&plan)?;

    state.total_sold = sold_after;
    state.proceeds = proceeds_after;
    state.fees_collected = fees_after;

    Ok(Receipt {
        buyer,
        amount,
        cost: quote.cost,
        fee: quote.fee,
        total_paid: quote.total_due,
        refund,
        total_sold_after: sold_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeePolicy;
    use alloc::vec;
    use crate::state::SaleConfig;

    /// Accepts every plan and remembers it.
    #[derive(Default)]
    struct Recorder {
        plans: Vec<SettlementPlan<u32>>,
    }

    impl Settlement<u32> for Recorder {
        fn settle(&mut self, plan: &SettlementPlan<u32>) -> Result<()> {
            self.plans.push(plan.clone());
            Ok(())
        }
    }

    /// Refuses every plan.
    struct Refuser;

    impl Settlement<u32> for Refuser {
        fn settle(&mut self, _plan: &SettlementPlan<u32>) -> Result<()> {
            Err(SaleError::TransferFailed)
        }
    }

    const TREASURY: u32 = 1;
    const FEES: u32 = 2;
    const BUYER: u32 = 10;

    fn sale(fee_policy: FeePolicy) -> SaleState<u32> {
        SaleState::new(config(fee_policy)).unwrap()
    }

    fn config(fee_policy: FeePolicy) -> SaleConfig<u32> {
        SaleConfig {
            slope: U512::from(1u64),
            base_price: U512::from(10u64),
            end_time: Some(5_000),
            fee_policy,
            fee_recipient: Some(FEES),
            treasury: TREASURY,
            payment_asset: PaymentAsset::Native,
            overpayment: OverpaymentPolicy::Refund,
            supply_cap: Some(U256::from(100u64)),
        }
    }

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    fn p(value: u64) -> U512 {
        U512::from(value)
    }

    #[test]
    fn test_purchase_advances_state() {
        let mut state = sale(FeePolicy::None);
        let mut recorder = Recorder::default();

        // 11 + 12 + 13
        let receipt = purchase(&mut state, BUYER, u(3), p(36), 0, &mut recorder).unwrap();
        assert_eq!(receipt.cost, p(36));
        assert_eq!(receipt.refund, p(0));
        assert_eq!(receipt.total_sold_after, u(3));
        assert_eq!(state.total_sold(), u(3));
        assert_eq!(state.proceeds(), p(36));

        let plan = &recorder.plans[0];
        assert_eq!(plan.payer, BUYER);
        assert_eq!(plan.delivery, u(3));
        assert_eq!(plan.legs, vec![PaymentLeg { to: TREASURY, amount: p(36) }]);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut state = sale(FeePolicy::None);
        let before = state.clone();
        let err = purchase(&mut state, BUYER, u(0), p(1_000), 0, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, SaleError::InvalidAmount);
        assert_eq!(state, before);
    }

    #[test]
    fn test_expired_sale_rejected() {
        let mut state = sale(FeePolicy::None);
        let before = state.clone();
        let err = purchase(&mut state, BUYER, u(1), p(1_000), 5_001, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, SaleError::SaleEnded);
        assert_eq!(state, before);

        // the last millisecond still counts
        assert!(purchase(&mut state, BUYER, u(1), p(11), 5_000, &mut Recorder::default()).is_ok());
    }

    #[test]
    fn test_underpayment_rejected() {
        let mut state = sale(FeePolicy::AddOnTop(100));
        let mut recorder = Recorder::default();
        // cost 36, fee ceil(0.36) = 1
        let err = purchase(&mut state, BUYER, u(3), p(36), 0, &mut recorder).unwrap_err();
        assert_eq!(err, SaleError::InsufficientPayment);
        assert!(recorder.plans.is_empty());
        assert!(state.total_sold().is_zero());
    }

    #[test]
    fn test_supply_cap() {
        let mut state = sale(FeePolicy::None);
        let err = purchase(&mut state, BUYER, u(101), U512::MAX, 0, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, SaleError::SupplyExhausted);
    }

    #[test]
    fn test_fee_legs() {
        let mut state = sale(FeePolicy::DeductFromProceeds(1_000));
        let mut recorder = Recorder::default();
        let receipt = purchase(&mut state, BUYER, u(3), p(40), 0, &mut recorder).unwrap();

        // fee ceil(3.6) = 4 out of 36
        assert_eq!(receipt.fee, p(4));
        assert_eq!(receipt.total_paid, p(36));
        assert_eq!(receipt.refund, p(4));
        assert_eq!(
            recorder.plans[0].legs,
            vec![
                PaymentLeg { to: TREASURY, amount: p(32) },
                PaymentLeg { to: FEES, amount: p(4) },
            ]
        );
        assert_eq!(state.proceeds(), p(32));
        assert_eq!(state.fees_collected(), p(4));
    }

    #[test]
    fn test_overpayment_rejected_when_configured() {
        let mut state = SaleState::new(SaleConfig {
            overpayment: OverpaymentPolicy::Reject,
            ..config(FeePolicy::None)
        })
        .unwrap();
        let err = purchase(&mut state, BUYER, u(1), p(12), 0, &mut Recorder::default()).unwrap_err();
        assert_eq!(err, SaleError::Overpayment);
        assert!(purchase(&mut state, BUYER, u(1), p(11), 0, &mut Recorder::default()).is_ok());
    }

    #[test]
    fn test_failed_settlement_leaves_state() {
        let mut state = sale(FeePolicy::AddOnTop(50));
        let before = state.clone();
        let err = purchase(&mut state, BUYER, u(2), p(1_000), 0, &mut Refuser).unwrap_err();
        assert_eq!(err, SaleError::TransferFailed);
        assert_eq!(state, before);
    }

    #[test]
    fn test_quote_max_amount_accounts_for_fee() {
        let plain = sale(FeePolicy::None);
        // 11 + 12 + 13 = 36
        assert_eq!(quote_max_amount(&plain, p(36)).unwrap(), u(3));

        let with_fee = sale(FeePolicy::AddOnTop(100));
        // 36 + 1 fee no longer fits
        assert_eq!(quote_max_amount(&with_fee, p(36)).unwrap(), u(2));
        assert_eq!(quote_max_amount(&with_fee, p(37)).unwrap(), u(3));
    }

    #[test]
    fn test_quote_max_amount_skips_overflowing_fee() {
        // a second unit fits the budget but its fee does not fit in 512 bits
        let state = SaleState::new(SaleConfig {
            slope: U512::zero(),
            base_price: U512::MAX / p(150),
            supply_cap: None,
            ..config(FeePolicy::AddOnTop(100))
        })
        .unwrap();
        assert_eq!(quote(&state, u(2)).unwrap_err(), SaleError::ArithmeticOverflow);
        assert_eq!(quote_max_amount(&state, U512::MAX).unwrap(), u(1));
    }
}
