//! Process-wide push-delivery registry.
//!
//! A storefront front-end keeps one long-lived delivery stream per signed-in user (SSE, a
//! websocket, whatever the transport offers). This registry is the engine-side half of that
//! contract: a concurrency-safe map from user id to an open delivery channel, with an explicit
//! lifecycle. Channels are registered on connect, deregistered on disconnect or on the first
//! failed send, and a keepalive task pings every channel on a fixed period so dead connections
//! get pruned instead of lingering.
//!
//! Delivery is best-effort throughout: a user without an active channel simply misses the
//! message, and nothing here can fail an order.
use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
};

use crate::events::{Handler, StockDepletedEvent};

/// A message on a user's delivery channel, ready to be serialized onto the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Periodic liveness signal. Transports forward it as a comment/ping frame.
    KeepAlive,
    StockDepleted(StockDepletedEvent),
}

#[derive(Clone)]
pub struct PushRegistry {
    channels: Arc<RwLock<HashMap<i64, mpsc::Sender<PushMessage>>>>,
    buffer_size: usize,
}

impl PushRegistry {
    pub fn new(buffer_size: usize) -> Self {
        Self { channels: Arc::new(RwLock::new(HashMap::new())), buffer_size }
    }

    /// Opens a delivery channel for the user and returns the receiving half. A user has at most
    /// one channel: registering again replaces the old one, which closes the previous receiver.
    pub async fn register(&self, user_id: i64) -> mpsc::Receiver<PushMessage> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let previous = self.channels.write().await.insert(user_id, sender);
        if previous.is_some() {
            debug!("📬️ Replaced the existing push channel for user #{user_id}");
        } else {
            debug!("📬️ Registered a push channel for user #{user_id}");
        }
        receiver
    }

    pub async fn unregister(&self, user_id: i64) {
        if self.channels.write().await.remove(&user_id).is_some() {
            debug!("📬️ Deregistered the push channel for user #{user_id}");
        }
    }

    /// Delivers the message if the user currently has an open channel. A send to a closed channel
    /// deregisters it. Returns whether the message was handed to a live channel.
    pub async fn send_if_present(&self, user_id: i64, message: PushMessage) -> bool {
        let sender = self.channels.read().await.get(&user_id).cloned();
        let Some(sender) = sender else {
            return false;
        };
        match sender.send(message).await {
            Ok(()) => true,
            Err(_) => {
                trace!("📬️ Push channel for user #{user_id} is closed");
                self.unregister(user_id).await;
                false
            },
        }
    }

    pub async fn connected_users(&self) -> Vec<i64> {
        self.channels.read().await.keys().copied().collect()
    }

    /// Spawns the liveness loop: every `period`, each registered channel gets a
    /// [`PushMessage::KeepAlive`], and channels whose receiver has gone away are pruned.
    pub fn start_keepalive(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                for user_id in registry.connected_users().await {
                    if !registry.send_if_present(user_id, PushMessage::KeepAlive).await {
                        debug!("📬️ Pruned the dead push channel for user #{user_id}");
                    }
                }
            }
        })
    }
}

/// Builds a stock-depletion hook that fans the event out through the registry: the owning seller
/// first, then every buyer who held the product/size in a cart.
pub fn stock_depleted_push_hook(registry: PushRegistry) -> Handler<StockDepletedEvent> {
    Arc::new(move |event: StockDepletedEvent| {
        let registry = registry.clone();
        Box::pin(async move {
            let mut targets = Vec::with_capacity(event.cart_user_ids.len() + 1);
            targets.push(event.seller_id);
            targets.extend(event.cart_user_ids.iter().copied().filter(|id| *id != event.seller_id));
            for user_id in targets {
                let delivered = registry.send_if_present(user_id, PushMessage::StockDepleted(event.clone())).await;
                if !delivered {
                    trace!("📬️ User #{user_id} has no active push channel; dropping stock notification");
                }
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}
