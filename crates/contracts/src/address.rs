//! Syntactic checks for 0x-prefixed ledger addresses.

/// Accepts `0x` followed by exactly 40 hex digits. Checksum casing is not
/// verified; the ledger performs its own authorization either way.
pub fn is_address(value: &str) -> bool {
    let Some(hex) = value.strip_prefix("0x") else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Ledger addresses compare case-insensitively.
pub fn addresses_match(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        assert!(is_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(is_address(&format!("0x{}", "a".repeat(40))));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_address(""));
        assert!(!is_address("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(!is_address("0x123"));
        assert!(!is_address(&format!("0x{}", "g".repeat(40))));
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(addresses_match(
            "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        ));
        assert!(!addresses_match("0xabc", "0xdef"));
    }
}
