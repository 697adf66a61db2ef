use casper_types::{Key, U256, U512};
use sale_core::{FeePolicy, OverpaymentPolicy, PaymentAsset, SaleConfig, SaleState};

use crate::data::{
    read_from_uref, write_to_uref, BASE_PRICE, END_TIME, FEES_COLLECTED, FEE_BPS, FEE_MODE,
    FEE_RECIPIENT, OVERPAYMENT, PAYMENT_TOKEN, PROCEEDS, SLOPE, SUPPLY_CAP, TOKENS_SOLD, TREASURY,
};

// Fee mode values
pub const FEE_MODE_NONE: u8 = 0;
pub const FEE_MODE_ADD_ON_TOP: u8 = 1;
pub const FEE_MODE_DEDUCT: u8 = 2;

// Overpayment values
pub const OVERPAYMENT_REFUND: u8 = 0;
pub const OVERPAYMENT_REJECT: u8 = 1;

pub fn fee_policy_from(mode: u8, bps: u64) -> Option<FeePolicy> {
    match mode {
        FEE_MODE_NONE => Some(FeePolicy::None),
        FEE_MODE_ADD_ON_TOP => Some(FeePolicy::AddOnTop(bps)),
        FEE_MODE_DEDUCT => Some(FeePolicy::DeductFromProceeds(bps)),
        _ => None,
    }
}

pub fn overpayment_from(value: u8) -> Option<OverpaymentPolicy> {
    match value {
        OVERPAYMENT_REFUND => Some(OverpaymentPolicy::Refund),
        OVERPAYMENT_REJECT => Some(OverpaymentPolicy::Reject),
        _ => None,
    }
}

/// `0` stores "no end time"
pub fn end_time_from(value: u64) -> Option<u64> {
    (value != 0).then_some(value)
}

/// Rebuild the sale from named keys. `None` if a stored mode or the stored
/// configuration no longer decodes into a valid sale.
pub fn load() -> Option<SaleState<Key>> {
    let fee_mode: u8 = read_from_uref(FEE_MODE);
    let fee_bps: u64 = read_from_uref(FEE_BPS);
    let overpayment: u8 = read_from_uref(OVERPAYMENT);
    let payment_token: Option<Key> = read_from_uref(PAYMENT_TOKEN);
    let end_time: u64 = read_from_uref(END_TIME);

    let config = SaleConfig {
        slope: read_from_uref(SLOPE),
        base_price: read_from_uref(BASE_PRICE),
        end_time: end_time_from(end_time),
        fee_policy: fee_policy_from(fee_mode, fee_bps)?,
        fee_recipient: read_from_uref(FEE_RECIPIENT),
        treasury: read_from_uref(TREASURY),
        payment_asset: payment_token.map_or(PaymentAsset::Native, PaymentAsset::Token),
        overpayment: overpayment_from(overpayment)?,
        supply_cap: read_from_uref(SUPPLY_CAP),
    };

    SaleState::restore(
        config,
        read_from_uref(TOKENS_SOLD),
        read_from_uref(PROCEEDS),
        read_from_uref(FEES_COLLECTED),
    )
    .ok()
}

/// Native payment legs can only be paid out to accounts.
pub fn is_payable(payee: &Key, payment_token: &Option<Key>) -> bool {
    payment_token.is_some() || matches!(payee, Key::Account(_))
}

/// Persist the running totals a purchase advanced.
pub fn store_totals(state: &SaleState<Key>) {
    write_to_uref::<U256>(TOKENS_SOLD, state.total_sold());
    write_to_uref::<U512>(PROCEEDS, state.proceeds());
    write_to_uref::<U512>(FEES_COLLECTED, state.fees_collected());
}

#[cfg(test)]
mod tests {
    use super::*;
    use casper_types::account::AccountHash;

    #[test]
    fn test_native_payees_must_be_accounts() {
        let account = Key::Account(AccountHash::new([7u8; 32]));
        let contract = Key::Hash([9u8; 32]);

        assert!(is_payable(&account, &None));
        assert!(!is_payable(&contract, &None));
    }

    #[test]
    fn test_token_payees_can_be_contracts() {
        let payment_token = Some(Key::Hash([1u8; 32]));
        assert!(is_payable(&Key::Hash([9u8; 32]), &payment_token));
        assert!(is_payable(&Key::Account(AccountHash::new([7u8; 32])), &payment_token));
    }

    #[test]
    fn test_stored_modes_decode() {
        assert_eq!(fee_policy_from(FEE_MODE_NONE, 0), Some(FeePolicy::None));
        assert_eq!(fee_policy_from(FEE_MODE_ADD_ON_TOP, 30), Some(FeePolicy::AddOnTop(30)));
        assert_eq!(
            fee_policy_from(FEE_MODE_DEDUCT, 250),
            Some(FeePolicy::DeductFromProceeds(250))
        );
        assert_eq!(fee_policy_from(3, 0), None);

        assert_eq!(overpayment_from(OVERPAYMENT_REJECT), Some(OverpaymentPolicy::Reject));
        assert_eq!(overpayment_from(2), None);
        assert_eq!(end_time_from(0), None);
        assert_eq!(end_time_from(1_700_000_000_000), Some(1_700_000_000_000));
    }
}
