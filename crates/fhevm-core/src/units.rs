//! Display helpers for decrypted amounts

use alloy_primitives::U256;

/// Render `value` scaled down by `decimals`, trimming trailing zeros
pub fn format_units(value: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let frac = value % divisor;

    if frac.is_zero() {
        whole.to_string()
    } else {
        let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Render a wei amount in ether
pub fn format_ether(wei: U256) -> String {
    format_units(wei, 18)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(12345u64), 0), "12345");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(42u64), 6), "0.000042");
    }

    #[test]
    fn test_format_ether() {
        let one_milli = U256::from(1_000_000_000_000_000u64);
        assert_eq!(format_ether(one_milli), "0.001");
        assert_eq!(format_ether(U256::ZERO), "0");
    }
}
