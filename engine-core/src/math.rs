use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::AmountError;

pub const CURRENCY_DECIMALS: u32 = 18;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

// fractional digits beyond `scale` are rejected, never truncated
pub fn to_base_units(amount: Decimal, scale: u32) -> Result<U256, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount.to_string()));
    }
    let normalized = amount.normalize();
    let frac_digits = normalized.scale();
    if frac_digits > scale {
        return Err(AmountError::TooPrecise {
            value: amount.to_string(),
            scale,
        });
    }
    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    mantissa
        .checked_mul(pow10(scale - frac_digits))
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))
}

// 2 * 10^18 -> "2.0", 15 * 10^17 -> "1.5"
pub fn from_base_units(value: U256, scale: u32) -> String {
    let divisor = pow10(scale);
    let (whole, frac) = value.div_rem(divisor);
    if scale == 0 || frac.is_zero() {
        return format!("{}.0", whole);
    }
    let digits = format!("{:0>width$}", frac.to_string(), width = scale as usize);
    let trimmed = digits.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

pub fn amount_to_wei(amount: Decimal) -> Result<U256, AmountError> {
    to_base_units(amount, CURRENCY_DECIMALS)
}

pub fn wei_to_amount(value: U256) -> String {
    from_base_units(value, CURRENCY_DECIMALS)
}

pub fn asset_id_to_u256(asset_id: u64) -> U256 {
    U256::from(asset_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn whole_amount_scales_by_eighteen_digits() {
        let wei = amount_to_wei(dec("2")).unwrap();
        assert_eq!(wei, U256::from(2_000_000_000_000_000_000u128));
    }

    #[test]
    fn fractional_amount_keeps_precision() {
        let wei = amount_to_wei(dec("0.015")).unwrap();
        assert_eq!(wei, U256::from(15_000_000_000_000_000u128));
        assert_eq!(wei_to_amount(wei), "0.015");
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let wei = to_base_units(dec("1.500"), 1).unwrap();
        assert_eq!(wei, U256::from(15u64));
    }

    #[test]
    fn too_many_fractional_digits_are_rejected() {
        let err = to_base_units(dec("1.25"), 1).unwrap_err();
        assert!(matches!(err, AmountError::TooPrecise { scale: 1, .. }));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(matches!(
            amount_to_wei(dec("-1")),
            Err(AmountError::Negative(_))
        ));
    }

    #[test]
    fn formatting_matches_display_convention() {
        assert_eq!(wei_to_amount(U256::ZERO), "0.0");
        assert_eq!(wei_to_amount(U256::from(50u64) * pow10(18)), "50.0");
        assert_eq!(wei_to_amount(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(from_base_units(U256::from(7u64), 0), "7.0");
    }

    #[test]
    fn asset_ids_are_not_scaled() {
        assert_eq!(asset_id_to_u256(42), U256::from(42u64));
    }
}
