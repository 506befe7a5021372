//-----------------------------------------------------------------------------
// Address Derivation
//-----------------------------------------------------------------------------
//
// Turns a signer's compressed secp256k1 public key into the chain's bech32
// address (RIPEMD160(SHA256(pubkey)), bech32-encoded with the chain's
// declared HRP), and checks a decoded address against that HRP. `cosmrs`
// already implements the hash-then-bech32 pipeline on `PublicKey`/`AccountId`
// so this module is a thin, chain-prefix-aware wrapper around it rather than
// a reimplementation.

use cosmrs::crypto::PublicKey;
use cosmrs::AccountId;

use super::error::ClientError;

/// Derives the bech32 account address for `pubkey` under the chain's
/// account-address prefix (`AppDescriptor.Configuration.Bech32AccountAddressPrefix`).
pub fn account_id_from_pubkey(pubkey: &PublicKey, hrp: &str) -> Result<AccountId, ClientError> {
    pubkey
        .account_id(hrp)
        .map_err(|e| ClientError::ClientError(format!("failed to derive account id: {e}")))
}

/// Parses a bech32 address string, verifying it was encoded under `hrp`.
/// Returns `AddressPrefixMismatch` if the address's own HRP disagrees.
pub fn parse_and_check_prefix(address: &str, hrp: &str) -> Result<AccountId, ClientError> {
    let account_id: AccountId = address
        .parse()
        .map_err(|e| ClientError::ParseError(format!("invalid bech32 address {address}: {e}")))?;

    if account_id.prefix() != hrp {
        return Err(ClientError::AddressPrefixMismatch {
            expected: hrp.to_string(),
            actual: account_id.prefix().to_string(),
        });
    }

    Ok(account_id)
}
