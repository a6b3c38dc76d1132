// Account and contract addresses
//
// Addresses are the 20 bytes identities used by the remote ledger.
// The all-zero address is used by the protocol as "nobody" (unclaimed request,
// unset recipient...), so it is never accepted as the identity of a handle.

use primitive_types::H160;
use thiserror::Error;

pub type Address = H160;

/// Sentinel used by the contracts for "no address"
pub const NULL_ADDRESS: Address = H160([0u8; 20]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address '{}': expected 20 bytes hex encoded", _0)]
    InvalidFormat(String),
}

/// Check that an address is not the null sentinel
#[inline]
pub fn is_not_null_address(address: &Address) -> bool {
    *address != NULL_ADDRESS
}

/// Parse an address from its hex representation, with or without `0x` prefix.
/// Case is ignored, no checksum is verified.
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes =
        hex::decode(hex_part).map_err(|_| AddressError::InvalidFormat(value.to_owned()))?;
    if bytes.len() != 20 {
        return Err(AddressError::InvalidFormat(value.to_owned()));
    }

    Ok(H160::from_slice(&bytes))
}

/// Lowercase `0x` prefixed representation, as returned by the request getters
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Extract the address stored in the last 20 bytes of a 32 bytes ABI word
pub fn address_from_word(word: &[u8]) -> Option<Address> {
    if word.len() < 20 {
        return None;
    }
    Some(H160::from_slice(&word[word.len() - 20..]))
}
