//-----------------------------------------------------------------------------
// Watcher - demultiplexes the chain's tx-event stream
//-----------------------------------------------------------------------------
//
// One WebSocket subscription to `tm.event='Tx'`, owned exclusively by a
// single event-loop task. Callers register a one-shot waiter per tx hash
// before broadcasting; the loop fires and drops the waiter the moment a
// matching event arrives, preserving the order events arrive in.

use std::collections::HashMap;
use std::time::Duration;

use cosmrs::rpc::event::{Event, EventData};
use cosmrs::rpc::query::{EventType, Query};
use cosmrs::rpc::{SubscriptionClient, WebSocketClient};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::core::error::ClientError;

const UNSUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivered to a watcher exactly once: the raw tx bytes, its inclusion
/// result and position, as observed on the chain's event stream.
#[derive(Clone, Debug)]
pub struct Response {
    pub bytes: Vec<u8>,
    pub code: u32,
    pub raw_log: String,
    pub block_height: i64,
    pub index: u32,
}

struct AddSubscription {
    hash: String,
    channel: oneshot::Sender<Response>,
}

/// Handle to the running watcher task. Dropping the handle does not stop
/// the task; call `stop()` explicitly.
pub struct Watcher {
    add_sub: mpsc::Sender<AddSubscription>,
    stop: watch::Sender<bool>,
    loop_handle: JoinHandle<()>,
}

impl Watcher {
    /// Opens the websocket, subscribes to `tm.event='Tx'`, and spawns the
    /// event loop that owns both the subscription and the waiter map.
    pub async fn connect(endpoint: &str) -> Result<Self, ClientError> {
        let (client, driver) = WebSocketClient::new(endpoint)
            .await
            .map_err(|e| ClientError::ClientError(format!("failed to open tendermint websocket: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = driver.run().await {
                log::warn!("tendermint websocket driver exited: {e}");
            }
        });

        let subscription = client
            .subscribe(Query::from(EventType::Tx))
            .await
            .map_err(|e| ClientError::ClientError(format!("failed to subscribe to tx events: {e}")))?;

        let (add_tx, add_rx) = mpsc::channel(32);
        let (stop_tx, stop_rx) = watch::channel(false);

        let loop_handle = tokio::spawn(run_loop(client, subscription, add_rx, stop_rx));

        Ok(Self {
            add_sub: add_tx,
            stop: stop_tx,
            loop_handle,
        })
    }

    /// Registers a one-shot waiter for `hash`. Returns `WatcherClosed` if
    /// the loop has already stopped.
    pub async fn watch(&self, hash: String) -> Result<oneshot::Receiver<Response>, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.add_sub
            .send(AddSubscription { hash, channel: tx })
            .await
            .map_err(|_| ClientError::WatcherClosed)?;
        Ok(rx)
    }

    /// Idempotent. Signals the loop to unsubscribe and exit; does not wait
    /// for it to finish (use `join` for that).
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub async fn join(self) {
        let _ = self.loop_handle.await;
    }
}

async fn run_loop(
    client: WebSocketClient,
    mut subscription: cosmrs::rpc::Subscription,
    mut add_rx: mpsc::Receiver<AddSubscription>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut subs: HashMap<String, Vec<oneshot::Sender<Response>>> = HashMap::new();

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            added = add_rx.recv() => {
                match added {
                    Some(AddSubscription { hash, channel }) => {
                        subs.entry(hash).or_default().push(channel);
                    }
                    None => break,
                }
            }
            event = subscription.next() => {
                match event {
                    Some(Ok(event)) => dispatch(&mut subs, event),
                    Some(Err(e)) => log::warn!("tendermint event stream error: {e}"),
                    None => break,
                }
            }
        }
    }

    match tokio::time::timeout(UNSUBSCRIBE_TIMEOUT, client.close()).await {
        Ok(Err(e)) => log::warn!("unable to close tendermint websocket correctly: {e}"),
        Err(_) => log::warn!("timed out closing tendermint websocket"),
        Ok(Ok(())) => {}
    }
}

fn dispatch(subs: &mut HashMap<String, Vec<oneshot::Sender<Response>>>, event: Event) {
    let EventData::Tx { tx_result } = event.data else {
        return;
    };

    let hash = match event.events.as_ref().and_then(|e| e.get("tx.hash")).and_then(|v| v.first()) {
        Some(hash) => hash.clone(),
        None => return,
    };

    let Some(waiters) = subs.remove(&hash) else {
        return;
    };

    let response = Response {
        bytes: tx_result.tx,
        code: tx_result.result.code.value(),
        raw_log: tx_result.result.log,
        block_height: tx_result.height.value() as i64,
        index: tx_result.index,
    };

    for waiter in waiters {
        let _ = waiter.send(response.clone());
    }
}
