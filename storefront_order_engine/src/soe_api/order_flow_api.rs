use std::fmt::Debug;

use chrono::Utc;
use log::*;
use soe_common::Money;

use crate::{
    db_types::{NewOrder, NewOrderItem, OrderId, OrderStatusType, ProductListing, Role, StockLevel},
    events::{EventProducers, StockDepletedEvent},
    helpers::effective_unit_price,
    order_objects::{OrderList, OrderQueryFilter, OrderRequest, Pagination},
    traits::{OrderFlowDatabase, OrderFlowError, OrderWithItems},
};

/// `OrderFlowApi` is the primary API for placing and cancelling orders and paging through a
/// buyer's order history.
///
/// The flow for a placement is: validate the request, resolve effective prices from the catalog,
/// check the point limits, then hand the fully priced order to the backend for the atomic
/// transaction. Stock-depletion notifications fire after the transaction commits and are
/// best-effort by design.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Places a new order for `buyer_id`.
    ///
    /// Every line item is priced from the catalog at call time: the discounted price when the
    /// product's discount window covers "now", the base price otherwise. That price is frozen
    /// into the line item and never recomputed. `use_points` may not exceed the buyer's balance
    /// or the order subtotal.
    ///
    /// The stock decrements, the point debit and the order insertion happen in one transaction on
    /// the backend; if any line is short on stock at commit time the whole placement fails and
    /// nothing changes.
    ///
    /// Returns the persisted order with its line items.
    pub async fn place_order(&self, buyer_id: i64, request: OrderRequest) -> Result<OrderWithItems, OrderFlowError> {
        validate_request(&request)?;
        let buyer = self.db.fetch_user(buyer_id).await?.ok_or(OrderFlowError::UserNotFound(buyer_id))?;
        if !buyer.enabled {
            return Err(OrderFlowError::AccountDisabled(buyer_id));
        }
        if buyer.role != Role::Buyer {
            return Err(OrderFlowError::NotABuyer(buyer_id));
        }

        let now = Utc::now();
        let mut order = NewOrder::new(buyer_id, request.recipient, request.phone, request.address);
        let mut listings = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let listing = match self.db.fetch_product_listing(item.product_id, item.size_id).await? {
                Some(listing) => listing,
                None => {
                    if self.db.product_exists(item.product_id).await? {
                        return Err(OrderFlowError::StockRecordNotFound {
                            product_id: item.product_id,
                            size_id: item.size_id,
                        });
                    }
                    return Err(OrderFlowError::ProductNotFound(item.product_id));
                },
            };
            // Advisory fail-fast. The conditional decrement in the transaction is authoritative.
            if listing.quantity < item.quantity {
                return Err(OrderFlowError::InsufficientStock {
                    product_id: item.product_id,
                    size_id: item.size_id,
                    requested: item.quantity,
                });
            }
            let unit_price = effective_unit_price(&listing, now);
            order.items.push(NewOrderItem {
                product_id: item.product_id,
                size_id: item.size_id,
                unit_price,
                quantity: item.quantity,
            });
            listings.push(listing);
        }

        order.subtotal = order.items.iter().map(|i| i.unit_price * i.quantity).sum();
        let redeemable = buyer.points.min(order.subtotal);
        if request.use_points > redeemable {
            return Err(OrderFlowError::InsufficientPoints { requested: request.use_points, limit: redeemable });
        }
        order.points_used = request.use_points;
        order.total_price = order.subtotal - request.use_points;

        let placed = self.db.place_order(order).await?;
        debug!(
            "🔄️📦️ Order [{}] placed by buyer #{buyer_id}: {} item(s), {} charged, {} in points",
            placed.order.order_id,
            placed.items.len(),
            placed.order.total_price,
            placed.order.points_used
        );
        self.notify_depleted_stock(&placed.depleted, &listings).await;
        Ok(placed.into_order_with_items())
    }

    /// Cancels an order on behalf of the buyer who placed it.
    ///
    /// Only orders still in `AwaitingPayment` can be cancelled. Each line item's quantity is
    /// added back to its stock record and the redeemed points are credited back, all inside one
    /// transaction with the status flip.
    pub async fn cancel_order(&self, buyer_id: i64, order_id: &OrderId) -> Result<OrderWithItems, OrderFlowError> {
        let OrderWithItems { order, items } =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.buyer_id != buyer_id {
            warn!("🔄️❌️ Buyer #{buyer_id} tried to cancel order [{order_id}] owned by buyer #{}", order.buyer_id);
            return Err(OrderFlowError::NotOrderOwner(order_id.clone()));
        }
        if order.status != OrderStatusType::AwaitingPayment {
            return Err(OrderFlowError::IllegalStateTransition {
                order_id: order_id.clone(),
                from: order.status,
                to: OrderStatusType::Cancelled,
            });
        }
        let cancelled = self.db.cancel_order(&order, &items).await?;
        debug!(
            "🔄️❌️ Order [{order_id}] cancelled. {} item(s) restocked, {} in points refunded",
            items.len(),
            cancelled.points_used
        );
        Ok(OrderWithItems { order: cancelled, items })
    }

    /// Pages through the buyer's orders, newest first, optionally filtered by status.
    pub async fn order_list(
        &self,
        buyer_id: i64,
        filter: OrderQueryFilter,
        page: Pagination,
    ) -> Result<OrderList, OrderFlowError> {
        if page.page < 1 {
            return Err(OrderFlowError::InvalidRequest("page must be at least 1".to_string()));
        }
        if page.limit < 1 {
            return Err(OrderFlowError::InvalidRequest("limit must be at least 1".to_string()));
        }
        let filter = filter.with_buyer_id(buyer_id);
        trace!("🔄️📄️ Order search for buyer #{buyer_id}: {filter}");
        self.db.search_orders(filter, &page).await
    }

    /// Publishes a `StockDepletedEvent` for every stock record the placement drained to zero.
    ///
    /// This runs after the order transaction has committed. Failures here are logged and
    /// swallowed; a notification problem must never unwind a placed order.
    async fn notify_depleted_stock(&self, depleted: &[StockLevel], listings: &[ProductListing]) {
        if depleted.is_empty() || self.producers.stock_depleted_producer.is_empty() {
            return;
        }
        for stock in depleted {
            let Some(listing) =
                listings.iter().find(|l| l.product_id == stock.product_id && l.size_id == stock.size_id)
            else {
                continue;
            };
            let cart_user_ids = match self.db.fetch_cart_holders(stock.product_id, stock.size_id).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(
                        "🔄️📦️ Could not look up cart holders for product #{} (size #{}): {e}. Notifying the seller \
                         only.",
                        stock.product_id, stock.size_id
                    );
                    Vec::new()
                },
            };
            let event = StockDepletedEvent {
                product_id: stock.product_id,
                size_id: stock.size_id,
                product_name: listing.product_name.clone(),
                size_label: listing.size_label.clone(),
                store_name: listing.store_name.clone(),
                seller_id: listing.seller_id,
                cart_user_ids,
            };
            debug!(
                "🔄️📦️ Stock of {} ({}) at {} is depleted. Notifying hook subscribers",
                event.product_name, event.size_label, event.store_name
            );
            for emitter in &self.producers.stock_depleted_producer {
                emitter.publish_event(event.clone()).await;
            }
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

fn validate_request(request: &OrderRequest) -> Result<(), OrderFlowError> {
    if request.items.is_empty() {
        return Err(OrderFlowError::InvalidRequest("an order must contain at least one line item".to_string()));
    }
    if let Some(item) = request.items.iter().find(|i| i.quantity < 1) {
        return Err(OrderFlowError::InvalidRequest(format!(
            "quantity for product {} must be at least 1",
            item.product_id
        )));
    }
    if request.use_points < Money::zero() {
        return Err(OrderFlowError::InvalidRequest("use_points cannot be negative".to_string()));
    }
    Ok(())
}
