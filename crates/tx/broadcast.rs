//-----------------------------------------------------------------------------
// Broadcaster
//-----------------------------------------------------------------------------
//
// Submits a signed `TxRaw` via `cosmos.tx.v1beta1.Service/BroadcastTx`. In
// BLOCK mode the node's own response is the terminal result. In SYNC/ASYNC
// mode the watch is registered on the tx hash *before* the RPC call, so a
// tx included between submission and registration can never be missed.

use std::sync::Arc;

use cosmos_sdk_proto::cosmos::tx::v1beta1::service_client::ServiceClient as TxServiceClient;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{BroadcastMode as ProtoBroadcastMode, BroadcastTxRequest};
use sha2::{Digest, Sha256};
use tokio::sync::{oneshot, Mutex};
use tonic::transport::Channel;

use crate::core::error::ClientError;
use crate::watcher::{Response as WatcherResponse, Watcher};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastMode {
    Block,
    Sync,
    Async,
}

impl From<BroadcastMode> for ProtoBroadcastMode {
    fn from(mode: BroadcastMode) -> Self {
        match mode {
            BroadcastMode::Block => ProtoBroadcastMode::Block,
            BroadcastMode::Sync => ProtoBroadcastMode::Sync,
            BroadcastMode::Async => ProtoBroadcastMode::Async,
        }
    }
}

/// The eventual inclusion result of a broadcast tx, regardless of which
/// mode produced it.
#[derive(Clone, Debug)]
pub struct Response {
    pub bytes: Vec<u8>,
    pub code: u32,
    pub raw_log: String,
    pub block_height: i64,
    pub index: u32,
}

impl From<WatcherResponse> for Response {
    fn from(r: WatcherResponse) -> Self {
        Self {
            bytes: r.bytes,
            code: r.code,
            raw_log: r.raw_log,
            block_height: r.block_height,
            index: r.index,
        }
    }
}

pub struct Broadcaster {
    tx_client: Mutex<TxServiceClient<Channel>>,
    watcher: Option<Arc<Watcher>>,
}

impl Broadcaster {
    pub fn new(channel: Channel, watcher: Option<Arc<Watcher>>) -> Self {
        Self {
            tx_client: Mutex::new(TxServiceClient::new(channel)),
            watcher,
        }
    }

    /// `tx_bytes` is the protobuf encoding of a `TxRaw` (`TxBuilder::sign`'s
    /// output, re-encoded).
    pub async fn broadcast(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<oneshot::Receiver<Response>, ClientError> {
        match mode {
            BroadcastMode::Block => self.broadcast_block(tx_bytes).await,
            BroadcastMode::Sync | BroadcastMode::Async => {
                self.broadcast_watched(tx_bytes, mode).await
            }
        }
    }

    async fn broadcast_block(&self, tx_bytes: Vec<u8>) -> Result<oneshot::Receiver<Response>, ClientError> {
        let tx_response = self.submit(tx_bytes.clone(), BroadcastMode::Block).await?;

        let response = Response {
            bytes: tx_bytes,
            code: tx_response.code,
            raw_log: tx_response.raw_log,
            block_height: tx_response.height,
            index: 0,
        };

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(response);
        Ok(rx)
    }

    async fn broadcast_watched(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<oneshot::Receiver<Response>, ClientError> {
        let watcher = self
            .watcher
            .as_ref()
            .ok_or_else(|| ClientError::ConfigError("no watcher available for this client".to_string()))?;

        let hash = hex::encode_upper(Sha256::digest(&tx_bytes));
        let watched = watcher.watch(hash).await?;

        let tx_response = self.submit(tx_bytes, mode).await?;

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok(response) = watched.await {
                let _ = tx.send(response.into());
            }
        });

        let _ = tx_response;
        Ok(rx)
    }

    async fn submit(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse, ClientError> {
        let mut client = self.tx_client.lock().await;
        let response = client
            .broadcast_tx(BroadcastTxRequest {
                tx_bytes,
                mode: ProtoBroadcastMode::from(mode).into(),
            })
            .await?
            .into_inner();

        let tx_response = response
            .tx_response
            .ok_or_else(|| ClientError::TransactionError("broadcast response had no tx_response".to_string()))?;

        if tx_response.code != 0 {
            return Err(ClientError::BroadcastTx {
                code: tx_response.code,
                tx_hash: tx_response.txhash.clone(),
                raw_log: tx_response.raw_log.clone(),
            });
        }

        Ok(tx_response)
    }
}
