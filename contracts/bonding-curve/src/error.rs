use casper_types::ApiError;

/// Contract lifecycle errors. Pricing and purchase failures revert with
/// `sale_core::SaleError` codes, which stay below 100.
#[repr(u16)]
pub enum BondingCurveError {
    AlreadyInitialized = 101,
    LockedReentrancy = 102,
    InvalidFeeMode = 103,
    InvalidOverpaymentMode = 104,
    DictionaryCreationFailed = 105,
    NotAnAccount = 106,
}

impl From<BondingCurveError> for ApiError {
    fn from(error: BondingCurveError) -> Self {
        ApiError::User(error as u16)
    }
}
