use alloc::string::String;
use casper_contract::{
    contract_api::{runtime, storage},
    unwrap_or_revert::UnwrapOrRevert,
};
use casper_types::{
    bytesrepr::{FromBytes, ToBytes},
    CLTyped, Key, URef,
};

// ============ Storage Keys ============

pub const TOKEN_HASH: &str = "token_hash";
pub const CREATOR: &str = "creator";
pub const TREASURY: &str = "treasury";
pub const SLOPE: &str = "slope";
pub const BASE_PRICE: &str = "base_price";
pub const END_TIME: &str = "end_time";
pub const FEE_MODE: &str = "fee_mode";
pub const FEE_BPS: &str = "fee_bps";
pub const FEE_RECIPIENT: &str = "fee_recipient";
pub const PAYMENT_TOKEN: &str = "payment_token";
pub const OVERPAYMENT: &str = "overpayment";
pub const SUPPLY_CAP: &str = "supply_cap";
pub const TOKENS_SOLD: &str = "tokens_sold";
pub const PROCEEDS: &str = "proceeds";
pub const FEES_COLLECTED: &str = "fees_collected";
pub const PURCHASES: &str = "purchases";
pub const PURCHASE_LOG: &str = "purchase_log";
pub const PURCHASE_COUNT: &str = "purchase_count";
pub const LOCKED: &str = "locked";
pub const INITIALIZED: &str = "initialized";

pub const CONTRACT_NAME: &str = "linear_sale";
pub const PACKAGE_NAME: &str = "linear_sale_package";
pub const ACCESS_NAME: &str = "linear_sale_access";

/// Read a value from a named key
pub fn read_from_uref<T: CLTyped + FromBytes>(name: &str) -> T {
    let key = runtime::get_key(name).unwrap_or_revert();
    let uref = key.into_uref().unwrap_or_revert();
    storage::read(uref).unwrap_or_revert().unwrap_or_revert()
}

/// Write a value to a named key
pub fn write_to_uref<T: CLTyped + ToBytes>(name: &str, value: T) {
    let key = runtime::get_key(name).unwrap_or_revert();
    let uref = key.into_uref().unwrap_or_revert();
    storage::write(uref, value);
}

pub fn get_dictionary_uref(name: &str) -> URef {
    runtime::get_key(name)
        .unwrap_or_revert()
        .into_uref()
        .unwrap_or_revert()
}

/// Dictionary item key for an account or contract, queryable as hex via RPC
pub fn key_to_str(key: &Key) -> String {
    match key {
        Key::Account(account_hash) => hex_encode(account_hash.as_bytes()),
        Key::Hash(hash) => hex_encode(hash),
        _ => hex_encode(&key.to_bytes().unwrap_or_revert()),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        result.push(hex_char(byte >> 4));
        result.push(hex_char(byte & 0x0f));
    }
    result
}

fn hex_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'a' + nibble - 10) as char,
        _ => '0',
    }
}
