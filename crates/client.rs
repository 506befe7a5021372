//-----------------------------------------------------------------------------
// Client
//-----------------------------------------------------------------------------
//
// Top-level handle assembled by `Client::dial`. Owns the shared gRPC
// channel (cloned cheaply into every component that needs one), the
// descriptor Registry, the Codec, the AppDescriptor, and - unless dialed
// read-only - a Signer and a tx Watcher.

use std::sync::Arc;

use prost_reflect::DynamicMessage;
use tonic::transport::Channel;

use crate::app_descriptor::AppDescriptor;
use crate::codec::grpc::DynamicCodec;
use crate::codec::Codec;
use crate::core::address::account_id_from_pubkey;
use crate::core::config::ClientConfig;
use crate::core::error::ClientError;
use crate::registry::sources::{CompositeSource, ProtoFileRegistry as RegistrySource, ReflectionSource};
use crate::registry::Registry;
use crate::signer_info::{AuthModuleSignerInfoProvider, SignerInfoProvider};
use crate::signing::{ErroringSigner, Signer};
use crate::tx::{BroadcastMode, Broadcaster, TxBuilder};
use crate::watcher::Watcher;

pub struct Client {
    app: AppDescriptor,
    channel: Channel,
    codec: Arc<Codec>,
    registry: Arc<Registry>,
    signer_info_provider: Arc<dyn SignerInfoProvider>,
    signer: Arc<dyn Signer>,
    broadcaster: Broadcaster,
    watcher: Option<Arc<Watcher>>,
}

impl Client {
    /// Performs the full dial sequence: open the channel, resolve the
    /// AppDescriptor, warm up the Registry, construct auth components, and
    /// (unless `read_only`) start the tx Watcher.
    pub async fn dial(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let channel = Channel::from_shared(config.grpc_endpoint.clone())
            .map_err(|e| ClientError::ConfigError(format!("invalid grpc endpoint: {e}")))?
            .connect()
            .await?;

        let remote: Arc<dyn crate::registry::sources::ProtoFileRegistry> = match config.remote_registry {
            Some(remote) => remote,
            None => {
                let reflection = ReflectionSource::connect(channel.clone()).await?;
                Arc::new(CompositeSource::new(vec![Arc::new(reflection)]))
            }
        };
        let registry = Arc::new(Registry::new(remote));
        let codec = Arc::new(Codec::new(registry.clone()));

        let app = match config.app_descriptor {
            Some(app) => app,
            None => AppDescriptor::fetch(channel.clone()).await?,
        };

        // Warm-up pass: pre-resolve the chain's declared query services and
        // tx message types. Not a correctness requirement - the Registry
        // resolves on demand regardless - just avoids a resolve-on-first-use
        // stall for the common case.
        for service in &app.query_services {
            let _ = registry.find_service_by_name(&service.fullname).await;
        }
        for type_url in &app.tx_msg_type_urls {
            let _ = registry.find_message_by_url(type_url).await;
        }

        let signer_info_provider: Arc<dyn SignerInfoProvider> = match config.signer_info_provider {
            Some(provider) => provider,
            None => Arc::new(AuthModuleSignerInfoProvider::new(channel.clone())),
        };

        let signer: Arc<dyn Signer> = match config.signer {
            Some(signer) => signer,
            None => Arc::new(ErroringSigner),
        };

        let watcher = if config.read_only {
            None
        } else {
            Some(Arc::new(Watcher::connect(&config.tendermint_endpoint).await?))
        };

        let broadcaster = Broadcaster::new(channel.clone(), watcher.clone());

        Ok(Self {
            app,
            channel,
            codec,
            registry,
            signer_info_provider,
            signer,
            broadcaster,
            watcher,
        })
    }

    pub fn app_descriptor(&self) -> &AppDescriptor {
        &self.app
    }

    pub fn codec(&self) -> &Arc<Codec> {
        &self.codec
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Derives the bech32 address a public key would have on this chain.
    pub fn address_for(&self, pubkey: &cosmrs::crypto::PublicKey) -> Result<cosmrs::AccountId, ClientError> {
        account_id_from_pubkey(pubkey, &self.app.bech32_account_address_prefix)
    }

    /// A fresh builder pre-loaded with this chain's declared tx message set,
    /// chain id, signer info provider and signer.
    pub fn new_tx(&self) -> TxBuilder {
        let supported = self.app.tx_msg_type_urls.iter().map(|url| crate::core::protoutil::full_name_from_url(url)).collect();

        TxBuilder::new(
            self.codec.clone(),
            supported,
            self.app.chain_id.clone(),
            self.signer_info_provider.clone(),
            self.signer.clone(),
        )
    }

    pub async fn broadcast(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<tokio::sync::oneshot::Receiver<crate::tx::BroadcastResponse>, ClientError> {
        self.broadcaster.broadcast(tx_bytes, mode).await
    }

    /// Invokes an arbitrary `/pkg.Service/Method` call, resolving both the
    /// method's input/output shape and the call path purely from the
    /// Registry - the dynamic equivalent of a generated unary RPC stub.
    pub async fn dynamic_query(
        &self,
        service_fullname: &str,
        method_name: &str,
        request: DynamicMessage,
    ) -> Result<DynamicMessage, ClientError> {
        let service = self.registry.find_service_by_name(service_fullname).await?;
        let method = service
            .methods()
            .find(|m| m.name() == method_name)
            .ok_or_else(|| ClientError::NotFoundError(format!("method {service_fullname}/{method_name}")))?;

        let path = format!("/{service_fullname}/{method_name}");
        let path = tonic::codegen::http::uri::PathAndQuery::try_from(path.as_str())
            .map_err(|e| ClientError::ClientError(format!("invalid gRPC method path: {e}")))?;

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| ClientError::ClientError(format!("gRPC channel not ready: {e}")))?;

        let codec = DynamicCodec::new(method.output());
        let response = grpc
            .unary(tonic::Request::new(request), path, codec)
            .await?;

        Ok(response.into_inner())
    }

    /// Closes the tx Watcher, if one was opened. A no-op for read-only
    /// clients.
    pub fn stop(&self) {
        if let Some(watcher) = &self.watcher {
            watcher.stop();
        }
    }
}
