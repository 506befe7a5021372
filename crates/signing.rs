//-----------------------------------------------------------------------------
// External Signer Contract
//-----------------------------------------------------------------------------

use async_trait::async_trait;
use bip32::{Language, Mnemonic, Seed};
use cosmos_sdk_proto::Any as ProtoAny;
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use cosmrs::AccountId;

use crate::core::address::account_id_from_pubkey;
use crate::core::error::ClientError;

const DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

/// `{sign(addr, bytes) -> signature, pub_key_for_addr(addr) -> Any(public_key)}`.
/// Implementations own key custody; this client never stores private keys.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, addr: &str, bytes: &[u8]) -> Result<Vec<u8>, ClientError>;
    async fn pub_key_for_addr(&self, addr: &str) -> Result<ProtoAny, ClientError>;
}

/// Null-object signer installed when the client is constructed for
/// read-only use. Fails every call verbatim rather than panicking.
pub struct ErroringSigner;

#[async_trait]
impl Signer for ErroringSigner {
    async fn sign(&self, _addr: &str, _bytes: &[u8]) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::SignerRefused(
            "transactions not supported by this setup".to_string(),
        ))
    }

    async fn pub_key_for_addr(&self, _addr: &str) -> Result<ProtoAny, ClientError> {
        Err(ClientError::SignerRefused(
            "transactions not supported by this setup".to_string(),
        ))
    }
}

/// Convenience signer holding a single BIP-39 mnemonic-derived secp256k1 key,
/// for local development and tests. Production callers are expected to
/// supply their own `Signer` backed by a proper key-management system.
pub struct MnemonicSigner {
    signing_key: SigningKey,
    address: AccountId,
}

impl MnemonicSigner {
    pub fn from_mnemonic(mnemonic: &str, hrp: &str) -> Result<Self, ClientError> {
        let mnemonic = Mnemonic::new(mnemonic, Language::English)
            .map_err(|e| ClientError::ClientError(format!("invalid mnemonic: {e}")))?;
        let seed: Seed = mnemonic.to_seed("");
        let signing_key = derive_signing_key(seed.as_ref(), DERIVATION_PATH)?;
        let address = account_id_from_pubkey(&signing_key.public_key(), hrp)?;

        Ok(Self { signing_key, address })
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }
}

fn derive_signing_key(seed_bytes: &[u8], path: &str) -> Result<SigningKey, ClientError> {
    let derivation_path = path
        .parse::<bip32::DerivationPath>()
        .map_err(|e| ClientError::ClientError(format!("invalid derivation path {path}: {e}")))?;
    let xprv = bip32::XPrv::new(seed_bytes)
        .map_err(|e| ClientError::ClientError(format!("failed to derive root key: {e}")))?;

    let child_xprv = derivation_path
        .into_iter()
        .try_fold(xprv, |key, index| key.derive_child(index))
        .map_err(|e| ClientError::ClientError(format!("failed to derive child key: {e}")))?;

    let secret_key = child_xprv.private_key();
    SigningKey::from_slice(secret_key.to_bytes().as_slice())
        .map_err(|e| ClientError::ClientError(format!("invalid derived signing key: {e}")))
}

#[async_trait]
impl Signer for MnemonicSigner {
    async fn sign(&self, addr: &str, bytes: &[u8]) -> Result<Vec<u8>, ClientError> {
        if addr != self.address.to_string() {
            return Err(ClientError::SignerRefused(format!(
                "this signer only signs for {}, not {addr}",
                self.address
            )));
        }

        let signature = self
            .signing_key
            .sign(bytes)
            .map_err(|e| ClientError::SignerRefused(e.to_string()))?;
        Ok(signature.to_vec())
    }

    async fn pub_key_for_addr(&self, addr: &str) -> Result<ProtoAny, ClientError> {
        if addr != self.address.to_string() {
            return Err(ClientError::SignerRefused(format!(
                "this signer only signs for {}, not {addr}",
                self.address
            )));
        }

        public_key_to_any(&self.signing_key.public_key())
    }
}

fn public_key_to_any(public_key: &PublicKey) -> Result<ProtoAny, ClientError> {
    let cosmrs_any = public_key
        .to_any()
        .map_err(|e| ClientError::ClientError(format!("failed to encode public key: {e}")))?;
    Ok(ProtoAny {
        type_url: cosmrs_any.type_url,
        value: cosmrs_any.value,
    })
}
