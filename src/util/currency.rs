//! Supported currency codes.

pub const USD: &str = "USD";
pub const EUR: &str = "EUR";
pub const CAD: &str = "CAD";
pub const INR: &str = "INR";

pub fn is_supported(currency: &str) -> bool {
    matches!(currency, USD | EUR | CAD | INR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_are_supported() {
        for code in [USD, EUR, CAD, INR] {
            assert!(is_supported(code));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(!is_supported("BTC"));
        assert!(!is_supported("usd"));
        assert!(!is_supported(""));
    }
}
