//-----------------------------------------------------------------------------
// Application Descriptor
//-----------------------------------------------------------------------------
//
// One-shot fetch of the cosmos-sdk `ReflectionService`'s six descriptors,
// flattened into the fields this client actually consumes: the chain id, the
// bech32 account-address prefix, the declared query services, the accepted
// tx message types, and the supported signing modes.

use tonic::transport::Channel;

use crate::core::error::ClientError;
use crate::pb::app_descriptor_v2alpha1::reflection_service_client::ReflectionServiceClient;
use crate::pb::app_descriptor_v2alpha1::{
    GetAuthnDescriptorRequest, GetChainDescriptorRequest, GetCodecDescriptorRequest,
    GetConfigurationDescriptorRequest, GetQueryServicesDescriptorRequest, GetTxDescriptorRequest,
};

#[derive(Clone, Debug)]
pub struct QueryServiceDescriptor {
    pub fullname: String,
    pub methods: Vec<String>,
    pub is_module: bool,
}

#[derive(Clone, Debug)]
pub struct SigningModeDescriptor {
    pub name: String,
    pub number: i32,
}

/// A registered interface and the concrete message types implementing it
/// (e.g. `cosmos.crypto.PubKey` implemented by `secp256k1.PubKey`, `ed25519.PubKey`, ...).
#[derive(Clone, Debug)]
pub struct CodecInterfaceDescriptor {
    pub fullname: String,
    pub implementer_type_urls: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AppDescriptor {
    pub chain_id: String,
    pub bech32_account_address_prefix: String,
    pub query_services: Vec<QueryServiceDescriptor>,
    pub tx_fullname: String,
    pub tx_msg_type_urls: Vec<String>,
    pub sign_modes: Vec<SigningModeDescriptor>,
    pub codec_interfaces: Vec<CodecInterfaceDescriptor>,
}

impl AppDescriptor {
    /// Issues the six unary RPCs and assembles the descriptor. Called once
    /// at dial time unless the caller supplies a cached `AppDescriptor`.
    pub async fn fetch(channel: Channel) -> Result<Self, ClientError> {
        let mut client = ReflectionServiceClient::new(channel);

        let authn = client
            .get_authn_descriptor(GetAuthnDescriptorRequest {})
            .await?
            .into_inner()
            .authn;
        let chain = client
            .get_chain_descriptor(GetChainDescriptorRequest {})
            .await?
            .into_inner()
            .chain;
        let codec = client
            .get_codec_descriptor(GetCodecDescriptorRequest {})
            .await?
            .into_inner()
            .codec;
        let config = client
            .get_configuration_descriptor(GetConfigurationDescriptorRequest {})
            .await?
            .into_inner()
            .config;
        let query = client
            .get_query_services_descriptor(GetQueryServicesDescriptorRequest {})
            .await?
            .into_inner()
            .queries;
        let tx = client
            .get_tx_descriptor(GetTxDescriptorRequest {})
            .await?
            .into_inner()
            .tx;

        let chain_id = chain
            .ok_or_else(|| ClientError::MalformedDescriptor {
                name: "cosmos.base.reflection.v2alpha1.ChainDescriptor".to_string(),
                reason: "missing chain descriptor".to_string(),
            })?
            .id;

        let bech32_account_address_prefix = config
            .ok_or_else(|| ClientError::MalformedDescriptor {
                name: "cosmos.base.reflection.v2alpha1.ConfigurationDescriptor".to_string(),
                reason: "missing configuration descriptor".to_string(),
            })?
            .bech32_account_address_prefix;

        let query_services = query
            .map(|q| {
                q.query_services
                    .into_iter()
                    .map(|svc| QueryServiceDescriptor {
                        fullname: svc.fullname,
                        methods: svc.methods.into_iter().map(|m| m.name).collect(),
                        is_module: svc.is_module,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tx = tx.ok_or_else(|| ClientError::MalformedDescriptor {
            name: "cosmos.base.reflection.v2alpha1.TxDescriptor".to_string(),
            reason: "missing tx descriptor".to_string(),
        })?;

        let tx_msg_type_urls = tx.msgs.into_iter().map(|m| m.msg_type_url).collect();

        let sign_modes = authn
            .map(|a| {
                a.sign_modes
                    .into_iter()
                    .map(|sm| SigningModeDescriptor {
                        name: sm.name,
                        number: sm.number,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let codec_interfaces = codec
            .map(|c| {
                c.interfaces
                    .into_iter()
                    .map(|i| CodecInterfaceDescriptor {
                        fullname: i.fullname,
                        implementer_type_urls: i
                            .interface_implementers
                            .into_iter()
                            .map(|impl_| impl_.type_url)
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(AppDescriptor {
            chain_id,
            bech32_account_address_prefix,
            query_services,
            tx_fullname: tx.fullname,
            tx_msg_type_urls,
            sign_modes,
            codec_interfaces,
        })
    }
}
