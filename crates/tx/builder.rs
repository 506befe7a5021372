//-----------------------------------------------------------------------------
// TxBuilder
//-----------------------------------------------------------------------------
//
// Single-owner transaction builder: accumulates messages (gated against the
// chain's declared supported set), fee and signer configuration, then signs
// with SIGN_MODE_DIRECT. Not `Clone`/`Sync` by design - a builder belongs to
// one caller for its whole lifetime.

use std::collections::HashSet;
use std::sync::Arc;

use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{AuthInfo, Fee, SignDoc, SignerInfo, TxBody, TxRaw};
use cosmos_sdk_proto::Any as ProtoAny;
use prost::Message;
use prost_reflect::DynamicMessage;

use crate::codec::Codec;
use crate::core::error::ClientError;
use crate::signer_info::SignerInfoProvider;
use crate::signing::Signer;

pub struct TxBuilder {
    codec: Arc<Codec>,
    supported: HashSet<String>,
    chain_id: String,
    signer_info_provider: Arc<dyn SignerInfoProvider>,
    signer: Arc<dyn Signer>,

    messages: Vec<ProtoAny>,
    memo: String,
    timeout_height: u64,
    fee_payer: String,
    fee_amount: Vec<Coin>,
    gas_limit: u64,
    signers_addr: HashSet<String>,
}

impl TxBuilder {
    pub fn new(
        codec: Arc<Codec>,
        supported: HashSet<String>,
        chain_id: String,
        signer_info_provider: Arc<dyn SignerInfoProvider>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            codec,
            supported,
            chain_id,
            signer_info_provider,
            signer,
            messages: Vec::new(),
            memo: String::new(),
            timeout_height: 0,
            fee_payer: String::new(),
            fee_amount: Vec::new(),
            gas_limit: 0,
            signers_addr: HashSet::new(),
        }
    }

    /// Rejects `msg` at add-time if its full name isn't in the chain's
    /// declared tx message set.
    pub fn add_msg(&mut self, msg: &DynamicMessage) -> Result<(), ClientError> {
        let full_name = msg.descriptor().full_name().to_string();
        if !self.supported.contains(&full_name) {
            return Err(ClientError::UnsupportedMessage(full_name));
        }

        let any = self.codec.new_any(msg)?;
        self.messages.push(any);
        Ok(())
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.memo = memo.into();
    }

    pub fn set_timeout_height(&mut self, height: u64) {
        self.timeout_height = height;
    }

    /// Adds an additional signer beyond the fee payer. A no-op if `addr`
    /// is already the fee payer.
    pub fn add_signer_by_addr(&mut self, addr: &str) {
        if self.fee_payer == addr {
            return;
        }
        self.signers_addr.insert(addr.to_string());
    }

    /// Sets the fee payer, which is also always a signer of the transaction.
    pub fn set_fee_payer(&mut self, addr: impl Into<String>) {
        self.fee_payer = addr.into();
    }

    pub fn set_fee(&mut self, coins: Vec<Coin>) {
        self.fee_amount = coins;
    }

    pub fn set_gas_limit(&mut self, limit: u64) {
        self.gas_limit = limit;
    }

    /// Validates, fetches signer info for every signer, builds the sign doc
    /// and collects one signature per signer via the external `Signer`.
    pub async fn sign(&mut self) -> Result<TxRaw, ClientError> {
        self.validate()?;

        self.signers_addr.remove(&self.fee_payer);

        let mut signers = Vec::with_capacity(self.signers_addr.len() + 1);
        signers.push(self.fee_payer.clone());
        signers.extend(self.signers_addr.iter().cloned());

        let mut extended = Vec::with_capacity(signers.len());
        for addr in &signers {
            let mut info = self.signer_info_provider.signer_info(addr).await.map_err(|e| {
                ClientError::TransactionError(format!("unable to get auth info for {addr}: {e}"))
            })?;

            // An absent public key means this account has never signed on
            // chain - the auth module has nothing to report yet. The signer
            // itself is the only other source for it.
            if info.signer_info.public_key.is_none() {
                info.signer_info.public_key = Some(self.signer.pub_key_for_addr(addr).await?);
            }

            extended.push(info);
        }

        let signer_infos: Vec<SignerInfo> = extended.iter().map(|i| i.signer_info.clone()).collect();

        let body = TxBody {
            messages: self.messages.clone(),
            memo: self.memo.clone(),
            timeout_height: self.timeout_height,
            ..Default::default()
        };

        let auth_info = AuthInfo {
            signer_infos,
            fee: Some(Fee {
                amount: self.fee_amount.clone(),
                gas_limit: self.gas_limit,
                payer: self.fee_payer.clone(),
                granter: String::new(),
            }),
            tip: None,
        };

        let body_bytes = body.encode_to_vec();
        let auth_info_bytes = auth_info.encode_to_vec();

        let mut signatures = Vec::with_capacity(signers.len());
        for (addr, info) in signers.iter().zip(extended.iter()) {
            let sign_doc = SignDoc {
                body_bytes: body_bytes.clone(),
                auth_info_bytes: auth_info_bytes.clone(),
                chain_id: self.chain_id.clone(),
                account_number: info.account_number,
            };
            let doc_bytes = sign_doc.encode_to_vec();
            let signature = self.signer.sign(addr, &doc_bytes).await?;
            signatures.push(signature);
        }

        Ok(TxRaw {
            body_bytes,
            auth_info_bytes,
            signatures,
        })
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.fee_payer.is_empty() {
            return Err(ClientError::Validation("no fee payer specified".to_string()));
        }
        if self.gas_limit == 0 {
            return Err(ClientError::Validation("no gas limit specified".to_string()));
        }
        if self.messages.is_empty() {
            return Err(ClientError::Validation("no messages in transaction".to_string()));
        }
        if self.fee_amount.is_empty() {
            return Err(ClientError::Validation("no fee amounts specified".to_string()));
        }
        for (i, coin) in self.fee_amount.iter().enumerate() {
            if coin.amount.is_empty() {
                return Err(ClientError::Validation(format!(
                    "no amount specified for fee coin at index {i}"
                )));
            }
            if coin.denom.is_empty() {
                return Err(ClientError::Validation(format!(
                    "no denom specified for fee coin at index {i}"
                )));
            }
        }
        Ok(())
    }
}
