use casper_types::ApiError;
use thiserror::Error;

/// Errors raised by the pricing and purchase core.
///
/// Codes are stable: the contract reverts with `ApiError::User(code)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SaleError {
    #[error("purchase amount is zero or out of range")]
    InvalidAmount = 1,
    #[error("sale has ended")]
    SaleEnded = 2,
    #[error("payment does not cover the amount due")]
    InsufficientPayment = 3,
    #[error("arithmetic overflow in curve computation")]
    ArithmeticOverflow = 4,
    #[error("caller is not authorized")]
    Unauthorized = 5,
    #[error("fee rate exceeds 10000 basis points")]
    InvalidFee = 6,
    #[error("invalid sale configuration")]
    InvalidConfig = 7,
    #[error("purchase exceeds the remaining supply")]
    SupplyExhausted = 8,
    #[error("payment exceeds the amount due")]
    Overpayment = 9,
    #[error("payer balance too low")]
    InsufficientBalance = 10,
    #[error("payment token allowance too low")]
    InsufficientAllowance = 11,
    #[error("settlement transfer failed")]
    TransferFailed = 12,
}

impl SaleError {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

impl From<SaleError> for ApiError {
    fn from(error: SaleError) -> Self {
        ApiError::User(error as u16)
    }
}

pub type Result<T, E = SaleError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_map_to_user_errors() {
        assert_eq!(ApiError::from(SaleError::InvalidAmount), ApiError::User(1));
        assert_eq!(ApiError::from(SaleError::ArithmeticOverflow), ApiError::User(4));
        assert_eq!(SaleError::TransferFailed.code(), 12);
    }
}
