#![no_std]
#![no_main]

extern crate alloc;

mod data;
mod error;
mod sale;
mod settlement;

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec;
use casper_contract::{
    contract_api::{runtime, storage},
    unwrap_or_revert::UnwrapOrRevert,
};
use casper_types::{
    addressable_entity::{EntityEntryPoint as EntryPoint, EntryPoints},
    contracts::NamedKeys,
    runtime_args, CLType, CLValue, EntryPointAccess, EntryPointPayment, EntryPointType, Key,
    Parameter, RuntimeArgs, URef, U256, U512,
};
use sale_core::{PaymentAsset, SaleConfig, SaleError, SaleState};

use data::*;
use error::BondingCurveError;
use settlement::CasperSettlement;

// ============ Helper Functions ============

fn require_unlocked() {
    let locked: bool = read_from_uref(LOCKED);
    if locked {
        runtime::revert(BondingCurveError::LockedReentrancy);
    }
}

fn lock() {
    write_to_uref(LOCKED, true);
}

fn unlock() {
    write_to_uref(LOCKED, false);
}

fn get_current_time() -> u64 {
    runtime::get_blocktime().into()
}

fn load_sale() -> SaleState<Key> {
    sale::load().unwrap_or_revert_with(BondingCurveError::InvalidFeeMode)
}

fn require_payable(payee: &Key, payment_token: &Option<Key>) {
    if !sale::is_payable(payee, payment_token) {
        runtime::revert(BondingCurveError::NotAnAccount);
    }
}

fn require_creator() {
    let caller = Key::Account(runtime::get_caller());
    let creator: Key = read_from_uref(CREATOR);
    if caller != creator {
        runtime::revert(SaleError::Unauthorized);
    }
}

// ============ Entry Points ============

/// Initialize the sale (called once after install)
#[no_mangle]
pub extern "C" fn init() {
    let initialized: bool = read_from_uref(INITIALIZED);
    if initialized {
        runtime::revert(BondingCurveError::AlreadyInitialized);
    }

    storage::new_dictionary(PURCHASES)
        .unwrap_or_revert_with(BondingCurveError::DictionaryCreationFailed);
    storage::new_dictionary(PURCHASE_LOG)
        .unwrap_or_revert_with(BondingCurveError::DictionaryCreationFailed);

    write_to_uref(INITIALIZED, true);
}

/// Get the hash of the token being sold
#[no_mangle]
pub extern "C" fn token_hash() {
    let hash: Key = read_from_uref(TOKEN_HASH);
    runtime::ret(CLValue::from_t(hash).unwrap_or_revert());
}

/// Get units sold so far
#[no_mangle]
pub extern "C" fn tokens_sold() {
    let sold: U256 = read_from_uref(TOKENS_SOLD);
    runtime::ret(CLValue::from_t(sold).unwrap_or_revert());
}

#[no_mangle]
pub extern "C" fn slope() {
    let slope: U512 = read_from_uref(SLOPE);
    runtime::ret(CLValue::from_t(slope).unwrap_or_revert());
}

#[no_mangle]
pub extern "C" fn base_price() {
    let base_price: U512 = read_from_uref(BASE_PRICE);
    runtime::ret(CLValue::from_t(base_price).unwrap_or_revert());
}

/// Get the sale end time in block-time milliseconds (0 = no end)
#[no_mangle]
pub extern "C" fn end_time() {
    let end: u64 = read_from_uref(END_TIME);
    runtime::ret(CLValue::from_t(end).unwrap_or_revert());
}

/// Get (fee_mode, fee_bps)
#[no_mangle]
pub extern "C" fn fee_policy() {
    let mode: u8 = read_from_uref(FEE_MODE);
    let bps: u64 = read_from_uref(FEE_BPS);
    runtime::ret(CLValue::from_t((mode, bps)).unwrap_or_revert());
}

/// Get payment routed to the treasury so far
#[no_mangle]
pub extern "C" fn proceeds() {
    let proceeds: U512 = read_from_uref(PROCEEDS);
    runtime::ret(CLValue::from_t(proceeds).unwrap_or_revert());
}

/// Get payment routed to the fee recipient so far
#[no_mangle]
pub extern "C" fn fees_collected() {
    let fees: U512 = read_from_uref(FEES_COLLECTED);
    runtime::ret(CLValue::from_t(fees).unwrap_or_revert());
}

#[no_mangle]
pub extern "C" fn purchase_count() {
    let count: u64 = read_from_uref(PURCHASE_COUNT);
    runtime::ret(CLValue::from_t(count).unwrap_or_revert());
}

/// Get the marginal price of the next unit
#[no_mangle]
pub extern "C" fn get_price() {
    let price = load_sale().current_price().unwrap_or_revert();
    runtime::ret(CLValue::from_t(price).unwrap_or_revert());
}

/// Quote (cost, fee, total_due) for buying `amount` units now
#[no_mangle]
pub extern "C" fn get_cost() {
    let amount: U256 = runtime::get_named_arg("amount");

    let quote = sale_core::quote(&load_sale(), amount).unwrap_or_revert();

    runtime::ret(CLValue::from_t((quote.cost, quote.fee, quote.total_due)).unwrap_or_revert());
}

/// Quote how many units a payment of `budget` buys, fees included
#[no_mangle]
pub extern "C" fn get_quote_buy() {
    let budget: U512 = runtime::get_named_arg("budget");

    let amount = sale_core::quote_max_amount(&load_sale(), budget).unwrap_or_revert();

    runtime::ret(CLValue::from_t(amount).unwrap_or_revert());
}

/// Buy `amount` units, offering up to `payment`.
///
/// Native sales pull from `purse`; token sales pull from the caller's
/// allowance on the payment token. Returns the total paid.
#[no_mangle]
pub extern "C" fn buy() {
    require_unlocked();
    lock();

    let amount: U256 = runtime::get_named_arg("amount");
    let payment: U512 = runtime::get_named_arg("payment");
    let purse: Option<URef> = runtime::get_named_arg("purse");

    let buyer = Key::Account(runtime::get_caller());
    let token: Key = read_from_uref(TOKEN_HASH);

    let mut state = load_sale();
    let mut settlement = CasperSettlement::new(token, purse);
    let receipt = match sale_core::purchase(
        &mut state,
        buyer,
        amount,
        payment,
        get_current_time(),
        &mut settlement,
    ) {
        Ok(receipt) => receipt,
        Err(error) => {
            unlock();
            runtime::revert(error);
        }
    };

    sale::store_totals(&state);

    // Cumulative units per buyer
    let purchases_uref = get_dictionary_uref(PURCHASES);
    let buyer_key = key_to_str(&buyer);
    let bought: U256 = storage::dictionary_get(purchases_uref, &buyer_key)
        .unwrap_or_default()
        .unwrap_or_default();
    storage::dictionary_put(purchases_uref, &buyer_key, bought + receipt.amount);

    // Purchase record (nested to stay within CLType tuple arity)
    let index: u64 = read_from_uref(PURCHASE_COUNT);
    let log_uref = get_dictionary_uref(PURCHASE_LOG);
    storage::dictionary_put(
        log_uref,
        &index.to_string(),
        (receipt.buyer, receipt.amount, (receipt.cost, receipt.fee)),
    );
    write_to_uref(PURCHASE_COUNT, index + 1);

    unlock();
    runtime::ret(CLValue::from_t(receipt.total_paid).unwrap_or_revert());
}

/// Creator points fee payments at a new recipient
#[no_mangle]
pub extern "C" fn set_fee_recipient() {
    require_creator();

    let recipient: Key = runtime::get_named_arg("recipient");
    let payment_token: Option<Key> = read_from_uref(PAYMENT_TOKEN);
    require_payable(&recipient, &payment_token);

    write_to_uref(FEE_RECIPIENT, Some(recipient));
}

// ============ Contract Installation ============

fn no_args(name: &str, ret: CLType) -> EntryPoint {
    EntryPoint::new(
        name,
        vec![],
        ret,
        EntryPointAccess::Public,
        EntryPointType::Called,
        EntryPointPayment::Caller,
    )
}

fn get_entry_points() -> EntryPoints {
    let mut entry_points = EntryPoints::new();

    entry_points.add_entry_point(no_args("init", CLType::Unit));

    // Read-only entry points
    entry_points.add_entry_point(no_args("token_hash", CLType::Key));
    entry_points.add_entry_point(no_args("tokens_sold", CLType::U256));
    entry_points.add_entry_point(no_args("slope", CLType::U512));
    entry_points.add_entry_point(no_args("base_price", CLType::U512));
    entry_points.add_entry_point(no_args("end_time", CLType::U64));
    entry_points.add_entry_point(no_args(
        "fee_policy",
        CLType::Tuple2([Box::new(CLType::U8), Box::new(CLType::U64)]),
    ));
    entry_points.add_entry_point(no_args("proceeds", CLType::U512));
    entry_points.add_entry_point(no_args("fees_collected", CLType::U512));
    entry_points.add_entry_point(no_args("purchase_count", CLType::U64));
    entry_points.add_entry_point(no_args("get_price", CLType::U512));

    entry_points.add_entry_point(EntryPoint::new(
        "get_cost",
        vec![Parameter::new("amount", CLType::U256)],
        CLType::Tuple3([
            Box::new(CLType::U512),
            Box::new(CLType::U512),
            Box::new(CLType::U512),
        ]),
        EntryPointAccess::Public,
        EntryPointType::Called,
        EntryPointPayment::Caller,
    ));

    entry_points.add_entry_point(EntryPoint::new(
        "get_quote_buy",
        vec![Parameter::new("budget", CLType::U512)],
        CLType::U256,
        EntryPointAccess::Public,
        EntryPointType::Called,
        EntryPointPayment::Caller,
    ));

    // State-changing entry points
    entry_points.add_entry_point(EntryPoint::new(
        "buy",
        vec![
            Parameter::new("amount", CLType::U256),
            Parameter::new("payment", CLType::U512),
            Parameter::new("purse", CLType::Option(Box::new(CLType::URef))),
        ],
        CLType::U512,
        EntryPointAccess::Public,
        EntryPointType::Called,
        EntryPointPayment::Caller,
    ));

    entry_points.add_entry_point(EntryPoint::new(
        "set_fee_recipient",
        vec![Parameter::new("recipient", CLType::Key)],
        CLType::Unit,
        EntryPointAccess::Public,
        EntryPointType::Called,
        EntryPointPayment::Caller,
    ));

    entry_points
}

/// Contract deployment
#[no_mangle]
pub extern "C" fn call() {
    let token_hash: Key = runtime::get_named_arg("token_hash");
    let creator: Key = runtime::get_named_arg("creator");
    let treasury: Key = runtime::get_named_arg("treasury");
    let slope: U512 = runtime::get_named_arg("slope");
    let base_price: U512 = runtime::get_named_arg("base_price");
    let end_time: u64 = runtime::get_named_arg("end_time");
    let fee_mode: u8 = runtime::get_named_arg("fee_mode");
    let fee_bps: u64 = runtime::get_named_arg("fee_bps");
    let fee_recipient: Option<Key> = runtime::get_named_arg("fee_recipient");
    let payment_token: Option<Key> = runtime::get_named_arg("payment_token");
    let overpayment: u8 = runtime::get_named_arg("overpayment");
    let supply_cap: Option<U256> = runtime::get_named_arg("supply_cap");

    let fee_policy = sale::fee_policy_from(fee_mode, fee_bps)
        .unwrap_or_revert_with(BondingCurveError::InvalidFeeMode);
    let overpayment_policy = sale::overpayment_from(overpayment)
        .unwrap_or_revert_with(BondingCurveError::InvalidOverpaymentMode);

    require_payable(&treasury, &payment_token);
    if let Some(recipient) = &fee_recipient {
        require_payable(recipient, &payment_token);
    }

    let config = SaleConfig {
        slope,
        base_price,
        end_time: sale::end_time_from(end_time),
        fee_policy,
        fee_recipient,
        treasury,
        payment_asset: payment_token.map_or(PaymentAsset::Native, PaymentAsset::Token),
        overpayment: overpayment_policy,
        supply_cap,
    };
    config.validate().unwrap_or_revert();

    let mut named_keys = NamedKeys::new();

    named_keys.insert(TOKEN_HASH.to_string(), storage::new_uref(token_hash).into());
    named_keys.insert(CREATOR.to_string(), storage::new_uref(creator).into());
    named_keys.insert(TREASURY.to_string(), storage::new_uref(treasury).into());
    named_keys.insert(SLOPE.to_string(), storage::new_uref(slope).into());
    named_keys.insert(BASE_PRICE.to_string(), storage::new_uref(base_price).into());
    named_keys.insert(END_TIME.to_string(), storage::new_uref(end_time).into());
    named_keys.insert(FEE_MODE.to_string(), storage::new_uref(fee_mode).into());
    named_keys.insert(FEE_BPS.to_string(), storage::new_uref(fee_bps).into());
    named_keys.insert(FEE_RECIPIENT.to_string(), storage::new_uref(fee_recipient).into());
    named_keys.insert(PAYMENT_TOKEN.to_string(), storage::new_uref(payment_token).into());
    named_keys.insert(OVERPAYMENT.to_string(), storage::new_uref(overpayment).into());
    named_keys.insert(SUPPLY_CAP.to_string(), storage::new_uref(supply_cap).into());
    named_keys.insert(TOKENS_SOLD.to_string(), storage::new_uref(U256::zero()).into());
    named_keys.insert(PROCEEDS.to_string(), storage::new_uref(U512::zero()).into());
    named_keys.insert(FEES_COLLECTED.to_string(), storage::new_uref(U512::zero()).into());
    named_keys.insert(PURCHASE_COUNT.to_string(), storage::new_uref(0u64).into());
    named_keys.insert(LOCKED.to_string(), storage::new_uref(false).into());
    named_keys.insert(INITIALIZED.to_string(), storage::new_uref(false).into());

    let (contract_hash, _) = storage::new_contract(
        get_entry_points(),
        Some(named_keys),
        Some(PACKAGE_NAME.to_string()),
        Some(ACCESS_NAME.to_string()),
        None,
    );

    runtime::put_key(CONTRACT_NAME, contract_hash.into());

    // Creates the purchase dictionaries
    runtime::call_contract::<()>(contract_hash, "init", runtime_args! {});
}
