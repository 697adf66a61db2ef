use casper_types::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SaleError};

/// Upper bound on units priced one by one in [`cost_by_summation`].
pub const MAX_SUMMATION_UNITS: u64 = 10_000;

/// Linear price curve `price(x) = slope * x + base_price`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearCurve {
    /// Price increase per unit sold, in the smallest payment unit
    pub slope: U512,
    /// Price of the first unit, in the smallest payment unit
    pub base_price: U512,
}

impl LinearCurve {
    pub const fn new(slope: U512, base_price: U512) -> Self {
        Self { slope, base_price }
    }

    pub fn cost(&self, sold: U256, amount: U256) -> Result<U512> {
        get_cost(sold, amount, self.slope, self.base_price)
    }

    pub fn price_of(&self, index: U256) -> Result<U512> {
        get_token_price(index, self.slope, self.base_price)
    }

    pub fn max_affordable(&self, sold: U256, budget: U512, cap: Option<U256>) -> Result<U256> {
        max_affordable(sold, budget, self.slope, self.base_price, cap)
    }
}

/// Lift a token amount into the 512-bit payment domain.
pub fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(&value.0);
    U512(limbs)
}

/// Narrow a 512-bit value back into token units, failing if it does not fit.
pub fn narrow(value: U512) -> Result<U256> {
    if value.0[4..].iter().any(|limb| *limb != 0) {
        return Err(SaleError::ArithmeticOverflow);
    }
    let mut limbs = [0u64; 4];
    limbs.copy_from_slice(&value.0[..4]);
    Ok(U256(limbs))
}

fn mul(lhs: U512, rhs: U512) -> Result<U512> {
    lhs.checked_mul(rhs).ok_or(SaleError::ArithmeticOverflow)
}

fn add(lhs: U512, rhs: U512) -> Result<U512> {
    lhs.checked_add(rhs).ok_or(SaleError::ArithmeticOverflow)
}

/// Cost of buying `amount` units when `sold` units are already gone.
///
/// The x-th unit of this purchase (1-indexed) is priced
/// `slope * (sold + x) + base_price`, so the total is the closed form
///
/// `slope*sold*amount + slope*amount*(amount+1)/2 + base_price*amount`
///
/// evaluated exactly in 512-bit integers. `amount*(amount+1)` is always even
/// and is halved before the slope is applied.
///
/// # Arguments
/// * `sold` - Units already sold
/// * `amount` - Units to buy
/// * `slope` - Price increase per unit
/// * `base_price` - Price of the first unit
///
/// # Returns
/// Total cost in the smallest payment unit, or `ArithmeticOverflow`
pub fn get_cost(sold: U256, amount: U256, slope: U512, base_price: U512) -> Result<U512> {
    if amount.is_zero() {
        return Ok(U512::zero());
    }

    let s = widen(sold);
    let m = widen(amount);

    let triangular = mul(m, add(m, U512::one())?)? / U512::from(2u64);

    let ramp = mul(mul(s, m)?, slope)?;
    let climb = mul(triangular, slope)?;
    let flat = mul(base_price, m)?;

    add(add(ramp, climb)?, flat)
}

/// Marginal price of the `index`-th unit (1-indexed): `slope * index + base_price`.
///
/// Display only; settlement always goes through [`get_cost`].
pub fn get_token_price(index: U256, slope: U512, base_price: U512) -> Result<U512> {
    add(mul(slope, widen(index))?, base_price)
}

/// Sum the marginal prices of each unit one at a time.
///
/// Cross-check for [`get_cost`] on small purchases. Refuses more than
/// [`MAX_SUMMATION_UNITS`] units.
pub fn cost_by_summation(sold: U256, amount: U256, slope: U512, base_price: U512) -> Result<U512> {
    if amount > U256::from(MAX_SUMMATION_UNITS) {
        return Err(SaleError::InvalidAmount);
    }

    let mut total = U512::zero();
    let mut index = sold;
    for _ in 0..amount.as_u64() {
        index = index.checked_add(U256::one()).ok_or(SaleError::ArithmeticOverflow)?;
        total = add(total, get_token_price(index, slope, base_price)?)?;
    }
    Ok(total)
}

/// Largest amount whose cost fits in `budget`.
///
/// Binary search over the closed form, which is monotone in the amount.
/// Amounts whose cost overflows are treated as unaffordable.
///
/// # Arguments
/// * `sold` - Units already sold
/// * `budget` - Payment available for the curve, after fees
/// * `slope` - Price increase per unit
/// * `base_price` - Price of the first unit
/// * `cap` - Total units the sale may ever sell, if limited
///
/// # Returns
/// Number of units that can be purchased
pub fn max_affordable(
    sold: U256,
    budget: U512,
    slope: U512,
    base_price: U512,
    cap: Option<U256>,
) -> Result<U256> {
    let limit = match cap {
        Some(cap) if cap <= sold => return Ok(U256::zero()),
        Some(cap) => cap - sold,
        None => U256::MAX - sold,
    };

    let mut lo = U256::zero();
    let mut hi = limit;
    while lo < hi {
        let gap = hi - lo;
        let mid = lo + gap / 2 + gap % 2;
        let affordable = match get_cost(sold, mid, slope, base_price) {
            Ok(cost) => cost <= budget,
            Err(SaleError::ArithmeticOverflow) => false,
            Err(other) => return Err(other),
        };
        if affordable {
            lo = mid;
        } else {
            hi = mid - U256::one();
        }
    }
    Ok(lo)
}
