//! Golden vectors for curve pricing and fees.
//!
//! Exact expected values for fixed inputs. A failure here means buyers would
//! be charged differently than before; update the vectors only together with
//! an intentional pricing change.

#[cfg(test)]
mod tests {
    use casper_types::{U256, U512};

    use crate::curves::get_cost;
    use crate::fees::{apply_fee, FeePolicy};

    const WHOLE_TOKEN: u128 = 1_000_000_000_000_000_000;

    fn dec(value: &str) -> U512 {
        U512::from_dec_str(value).unwrap()
    }

    /// First whole 18-decimal token on `price(x) = x + 10^18`.
    ///
    /// - a*s*m: 0
    /// - a*m*(m+1)/2: 10^18 * (10^18 + 1) / 2 = 5*10^35 + 5*10^17
    /// - b*m: 10^36
    #[test]
    fn golden_first_whole_token() {
        let cost = get_cost(
            U256::zero(),
            U256::from(WHOLE_TOKEN),
            U512::from(1u64),
            U512::from(WHOLE_TOKEN),
        )
        .unwrap();

        assert_eq!(cost, dec("1500000000000000000500000000000000000"));
    }

    /// Ten units after a thousand sold, slope and base both 1 CSPR in motes.
    ///
    /// - a*s*m: 10^9 * 1000 * 10 = 10^13
    /// - a*m*(m+1)/2: 10^9 * 55
    /// - b*m: 10^10
    #[test]
    fn golden_mid_sale_motes() {
        let cost = get_cost(
            U256::from(1_000u64),
            U256::from(10u64),
            U512::from(1_000_000_000u64),
            U512::from(1_000_000_000u64),
        )
        .unwrap();

        assert_eq!(cost, U512::from(10_065_000_000_000u64));
    }

    /// 100 whole tokens after 500 sold; the a*s*m term alone exceeds 128 bits.
    #[test]
    fn golden_wide_intermediate() {
        let cost = get_cost(
            U256::from(500 * WHOLE_TOKEN),
            U256::from(100 * WHOLE_TOKEN),
            U512::from(1_000u64),
            U512::from(1_000_000_000_000u64),
        )
        .unwrap();

        assert_eq!(cost, dec("55000000000100000000050000000000000000000000"));
    }

    /// 2.5% deducted from the first whole token's cost; divides exactly.
    #[test]
    fn golden_deducted_fee() {
        let split = apply_fee(dec("1500000000000000000500000000000000000"), 250).unwrap();

        assert_eq!(split.fee, dec("37500000000000000012500000000000000"));
        assert_eq!(split.net, dec("1462500000000000000487500000000000000"));
    }

    /// 0.3% added on top of the mid-sale cost.
    #[test]
    fn golden_add_on_fee() {
        let charge = FeePolicy::AddOnTop(30)
            .charge(U512::from(10_065_000_000_000u64))
            .unwrap();

        assert_eq!(charge.fee, U512::from(30_195_000_000u64));
        assert_eq!(charge.total_due, U512::from(10_095_195_000_000u64));
        assert_eq!(charge.proceeds, U512::from(10_065_000_000_000u64));
    }
}
