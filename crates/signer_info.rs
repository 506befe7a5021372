//-----------------------------------------------------------------------------
// Signer Info Provider
//-----------------------------------------------------------------------------
//
// Supplies the public key, sequence and account number a `TxBuilder` needs
// for each signer, by querying `cosmos.auth.v1beta1.Query/Account` and
// extracting those fields from the known `BaseAccount` shape. Other account
// types surface as `UnsupportedAccountType` rather than being silently
// skipped.

use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::auth::v1beta1::query_client::QueryClient as AuthQueryClient;
use cosmos_sdk_proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest};
use cosmos_sdk_proto::cosmos::tx::v1beta1::mode_info::{self, Sum};
use cosmos_sdk_proto::cosmos::tx::v1beta1::{ModeInfo, SignerInfo};
use cosmos_sdk_proto::Any as ProtoAny;
use cosmrs::tx::SignMode;
use prost::Message;
use tokio::sync::Mutex;
use tonic::transport::Channel;

use crate::core::error::ClientError;
use crate::core::protoutil::full_name_from_url;

/// `SignerInfo` plus the account number, everything `TxBuilder::sign` needs
/// to build a `SignDoc` for one signer.
#[derive(Clone, Debug)]
pub struct SignerInfoExtended {
    pub signer_info: SignerInfo,
    pub account_number: u64,
}

/// Resolves authentication info for a bech32 address.
#[async_trait]
pub trait SignerInfoProvider: Send + Sync {
    async fn signer_info(&self, addr: &str) -> Result<SignerInfoExtended, ClientError>;
}

/// Default provider: queries `cosmos.auth.v1beta1.Query/Account` and
/// extracts pubkey/sequence/account_number from a `BaseAccount`.
pub struct AuthModuleSignerInfoProvider {
    auth: Mutex<AuthQueryClient<Channel>>,
}

impl AuthModuleSignerInfoProvider {
    pub fn new(channel: Channel) -> Self {
        Self {
            auth: Mutex::new(AuthQueryClient::new(channel)),
        }
    }
}

#[async_trait]
impl SignerInfoProvider for AuthModuleSignerInfoProvider {
    async fn signer_info(&self, addr: &str) -> Result<SignerInfoExtended, ClientError> {
        let response = {
            let mut auth = self.auth.lock().await;
            auth.account(QueryAccountRequest {
                address: addr.to_string(),
            })
            .await?
            .into_inner()
        };

        let account_any = response
            .account
            .ok_or_else(|| ClientError::NotFoundError(format!("account {addr}")))?;

        match full_name_from_url(&account_any.type_url).as_str() {
            "cosmos.auth.v1beta1.BaseAccount" => signer_info_from_base_account(&account_any),
            other => Err(ClientError::UnsupportedAccountType(other.to_string())),
        }
    }
}

fn signer_info_from_base_account(account_any: &ProtoAny) -> Result<SignerInfoExtended, ClientError> {
    let account = BaseAccount::decode(account_any.value.as_slice())?;

    let signer_info = SignerInfo {
        public_key: account.pub_key,
        mode_info: Some(ModeInfo {
            sum: Some(Sum::Single(mode_info::Single {
                mode: SignMode::Direct.into(),
            })),
        }),
        sequence: account.sequence,
    };

    Ok(SignerInfoExtended {
        signer_info,
        account_number: account.account_number,
    })
}
