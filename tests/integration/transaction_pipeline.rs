//-----------------------------------------------------------------------------
// Transaction Pipeline
//-----------------------------------------------------------------------------
//
// Builds, gates and signs a transaction purely against dynamically resolved
// descriptors - no generated `MsgSend` type ever enters this test - the way
// an application using this client would. Covers P4 (deterministic sign
// bytes), P5 (signer binding) and P8 (supported-message gating) from the
// design spec's testable properties.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use cosmos_sdk_proto::cosmos::tx::v1beta1::mode_info::{self, Sum};
use cosmos_sdk_proto::cosmos::tx::v1beta1::ModeInfo;
use cosmos_sdk_proto::Any as ProtoAny;
use prost::Message;
use prost_reflect::{DynamicMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use dynamic_cosmos::codec::Codec;
use dynamic_cosmos::signer_info::SignerInfoExtended;
use dynamic_cosmos::{ClientError, Registry, Signer, SignerInfoProvider, TxBuilder};

fn msg_send_file_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("cosmos/bank/v1beta1/tx.proto".to_string()),
            package: Some("cosmos.bank.v1beta1".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("MsgSend".to_string()),
                field: vec![
                    FieldDescriptorProto {
                        name: Some("from_address".to_string()),
                        number: Some(1),
                        r#type: Some(Type::String as i32),
                        label: Some(Label::Optional as i32),
                        ..Default::default()
                    },
                    FieldDescriptorProto {
                        name: Some("to_address".to_string()),
                        number: Some(2),
                        r#type: Some(Type::String as i32),
                        label: Some(Label::Optional as i32),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

/// A signer that echoes the sign-doc bytes back as the "signature", so the
/// test can assert exactly what the builder handed it rather than verifying
/// a real secp256k1 signature (that's `cosmrs`' concern, not this client's).
struct EchoSigner {
    pre_baked_pubkey: ProtoAny,
}

#[async_trait]
impl Signer for EchoSigner {
    async fn sign(&self, _addr: &str, bytes: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(bytes.to_vec())
    }

    async fn pub_key_for_addr(&self, _addr: &str) -> Result<ProtoAny, ClientError> {
        Ok(self.pre_baked_pubkey.clone())
    }
}

/// A chain whose auth module already knows this signer's pubkey and
/// sequence - the steady-state case, as opposed to the first-tx case
/// covered by `crates/tx/builder.rs`'s own unit tests.
struct OnChainSignerInfoProvider {
    sequence: u64,
    account_number: u64,
    pubkey: ProtoAny,
}

#[async_trait]
impl SignerInfoProvider for OnChainSignerInfoProvider {
    async fn signer_info(&self, _addr: &str) -> Result<SignerInfoExtended, ClientError> {
        Ok(SignerInfoExtended {
            signer_info: cosmos_sdk_proto::cosmos::tx::v1beta1::SignerInfo {
                public_key: Some(self.pubkey.clone()),
                mode_info: Some(ModeInfo {
                    sum: Some(Sum::Single(mode_info::Single { mode: 1 })),
                }),
                sequence: self.sequence,
            },
            account_number: self.account_number,
        })
    }
}

async fn registry_and_codec() -> (Arc<Registry>, Arc<Codec>) {
    let source = Arc::new(dynamic_cosmos::registry::CacheSource::new(msg_send_file_set()));
    let registry = Arc::new(Registry::new(source));
    let codec = Arc::new(Codec::new(registry.clone()));
    (registry, codec)
}

fn supported_set() -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert("cosmos.bank.v1beta1.MsgSend".to_string());
    set
}

#[tokio::test]
async fn builds_and_signs_a_msg_send_transaction() {
    let (registry, codec) = registry_and_codec().await;
    let descriptor = registry.find_message_by_name("cosmos.bank.v1beta1.MsgSend").await.unwrap();

    let mut msg = DynamicMessage::new(descriptor);
    msg.set_field_by_name("from_address", Value::String("cosmos1payer".to_string()));
    msg.set_field_by_name("to_address", Value::String("cosmos1recipient".to_string()));

    let signer = Arc::new(EchoSigner {
        pre_baked_pubkey: ProtoAny {
            type_url: "/cosmos.crypto.secp256k1.PubKey".to_string(),
            value: vec![9, 9, 9],
        },
    });
    let signer_info_provider = Arc::new(OnChainSignerInfoProvider {
        sequence: 3,
        account_number: 17,
        pubkey: signer.pre_baked_pubkey.clone(),
    });

    let mut builder = TxBuilder::new(
        codec,
        supported_set(),
        "test-chain-1".to_string(),
        signer_info_provider,
        signer,
    );
    builder.add_msg(&msg).unwrap();
    builder.set_fee_payer("cosmos1payer");
    builder.set_gas_limit(200_000);
    builder.set_fee(vec![Coin {
        denom: "uatom".to_string(),
        amount: "1000".to_string(),
    }]);

    let tx_raw = builder.sign().await.unwrap();

    assert_eq!(tx_raw.signatures.len(), 1, "exactly one signer (the fee payer)");
    assert!(!tx_raw.body_bytes.is_empty());
    assert!(!tx_raw.auth_info_bytes.is_empty());

    let auth_info =
        cosmos_sdk_proto::cosmos::tx::v1beta1::AuthInfo::decode(tx_raw.auth_info_bytes.as_slice()).unwrap();
    assert_eq!(auth_info.signer_infos[0].sequence, 3, "signer_info[0] binds to signer[0]'s sequence");

    // P5: the one signature present is the signer's output over the
    // concatenation that the sign doc reduces to under the echo signer.
    let sign_doc = cosmos_sdk_proto::cosmos::tx::v1beta1::SignDoc {
        body_bytes: tx_raw.body_bytes.clone(),
        auth_info_bytes: tx_raw.auth_info_bytes.clone(),
        chain_id: "test-chain-1".to_string(),
        account_number: 17,
    };
    assert_eq!(tx_raw.signatures[0], sign_doc.encode_to_vec());
}

#[tokio::test]
async fn sign_bytes_are_deterministic_across_independent_runs() {
    // P4: two independently built transactions with identical inputs must
    // produce byte-identical body_bytes/auth_info_bytes.
    async fn build_once() -> cosmos_sdk_proto::cosmos::tx::v1beta1::TxRaw {
        let (registry, codec) = registry_and_codec().await;
        let descriptor = registry.find_message_by_name("cosmos.bank.v1beta1.MsgSend").await.unwrap();
        let mut msg = DynamicMessage::new(descriptor);
        msg.set_field_by_name("from_address", Value::String("cosmos1payer".to_string()));
        msg.set_field_by_name("to_address", Value::String("cosmos1recipient".to_string()));

        let signer = Arc::new(EchoSigner {
            pre_baked_pubkey: ProtoAny {
                type_url: "/cosmos.crypto.secp256k1.PubKey".to_string(),
                value: vec![9, 9, 9],
            },
        });
        let signer_info_provider = Arc::new(OnChainSignerInfoProvider {
            sequence: 3,
            account_number: 17,
            pubkey: signer.pre_baked_pubkey.clone(),
        });

        let mut builder =
            TxBuilder::new(codec, supported_set(), "test-chain-1".to_string(), signer_info_provider, signer);
        builder.add_msg(&msg).unwrap();
        builder.set_fee_payer("cosmos1payer");
        builder.set_gas_limit(200_000);
        builder.set_fee(vec![Coin {
            denom: "uatom".to_string(),
            amount: "1000".to_string(),
        }]);
        builder.sign().await.unwrap()
    }

    let first = build_once().await;
    let second = build_once().await;
    assert_eq!(first.body_bytes, second.body_bytes);
    assert_eq!(first.auth_info_bytes, second.auth_info_bytes);
}

#[tokio::test]
async fn add_msg_rejects_a_message_absent_from_the_chains_supported_set() {
    let (registry, codec) = registry_and_codec().await;
    let descriptor = registry.find_message_by_name("cosmos.bank.v1beta1.MsgSend").await.unwrap();
    let msg = DynamicMessage::new(descriptor);

    let signer = Arc::new(EchoSigner {
        pre_baked_pubkey: ProtoAny {
            type_url: "/cosmos.crypto.secp256k1.PubKey".to_string(),
            value: vec![],
        },
    });
    let signer_info_provider = Arc::new(OnChainSignerInfoProvider {
        sequence: 0,
        account_number: 0,
        pubkey: signer.pre_baked_pubkey.clone(),
    });

    // Empty supported set: nothing this chain declares accepts MsgSend.
    let mut builder =
        TxBuilder::new(codec, HashSet::new(), "test-chain-1".to_string(), signer_info_provider, signer);

    let err = builder.add_msg(&msg).unwrap_err();
    assert!(matches!(err, ClientError::UnsupportedMessage(name) if name == "cosmos.bank.v1beta1.MsgSend"));
}
