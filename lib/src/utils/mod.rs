use crate::error::WhitelistError;
use alloy_primitives::{keccak256, utils::format_ether, Address, B256, U256};


/// Parses an Ethereum address from a hex string, ignoring its casing.
///
/// # Arguments
///
/// * `address` - The address string, with or without the `0x` prefix.
///
/// # Returns
///
/// The parsed `Address`, or `WhitelistError::InvalidAddressFormat` if the input is not exactly
/// 40 hex characters.
pub fn parse_address(address: &str) -> Result<Address, WhitelistError> {
    let trimmed: &str = address.trim();
    let digits: &str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 40 || !digits.bytes().all(|b: u8| b.is_ascii_hexdigit()) {
        return Err(WhitelistError::InvalidAddressFormat(address.to_string()));
    }

    // Lower-casing skips EIP-55 checksum validation so every casing maps to the same address
    digits
        .to_ascii_lowercase()
        .parse::<Address>()
        .map_err(|_| WhitelistError::InvalidAddressFormat(address.to_string()))
}

/// Computes the whitelist leaf of an address.
///
/// Matches `keccak256(abi.encodePacked(user))` as recomputed by the on-chain verifier: the 20
/// address bytes are hashed exactly once.
pub fn hash_address(address: &Address) -> B256 {
    keccak256(address.as_slice())
}

/// Parses `user` and computes its whitelist leaf.
pub fn hash_user(user: &str) -> Result<B256, WhitelistError> {
    parse_address(user).map(|address: Address| hash_address(&address))
}

/// Formats a wei amount as a WETH amount rounded to two decimals, for log lines.
pub fn format_weth(amount: &U256) -> String {
    // One cent is 10^16 wei, half of it rounds up
    let cent: U256 = U256::from(10_000_000_000_000_000u64);
    let cents: U256 = amount.saturating_add(cent / U256::from(2u64)) / cent;
    let (whole, fraction) = cents.div_rem(U256::from(100u64));
    format!("{whole}.{:02}", fraction.to::<u64>())
}

/// Formats a wei amount in ether without trailing zeros, e.g. `"90"` or `"12.5"`.
pub fn format_ether_trimmed(amount: &U256) -> String {
    let ether: String = format_ether(*amount);
    match ether.split_once('.') {
        Some((whole, fraction)) => match fraction.trim_end_matches('0') {
            "" => whole.to_string(),
            fraction => format!("{whole}.{fraction}"),
        },
        None => ether,
    }
}

/// Serializes a `U256` as a decimal string, the way amounts are written in the bids and mints
/// files. Deserialization accepts decimal and `0x` strings alike.
pub mod decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        U256::deserialize(deserializer)
    }
}

/// Token amounts in ether units, as JSON numbers (`12.5`) or strings (`"12.5"`), stored in wei.
pub mod ether_amount {
    use super::format_ether_trimmed;
    use alloy_primitives::{utils::parse_ether, U256};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Integer(u64),
        Float(f64),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_ether_trimmed(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text: String = match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(text) => text,
            RawAmount::Integer(integer) => integer.to_string(),
            RawAmount::Float(float) => float.to_string(),
        };
        parse_ether(text.trim())
            .map_err(|_| D::Error::custom(format!("invalid ether amount {text:?}")))
    }
}
