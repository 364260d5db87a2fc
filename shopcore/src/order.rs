//! Orders: immutable snapshots of a cart, an identifier, and a status
//! machine.
//!
//! The factory reserves inventory *before* persisting the order and rolls the
//! reservations back if anything later fails, so a stored order always has
//! its stock accounted for. Cancellation is the only backward transition and
//! restores stock line by line.

use crate::address::DeliveryAddress;
use crate::cart::{mutate_cart, CartItem, CartStore};
use crate::errors::{CoreError, CoreResult, StorageResult};
use crate::inventory::{InventoryLedger, LedgerError};
use crate::types::{Money, OrderId, ProductId, ProductName, Quantity, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Days between order creation and the default delivery estimate.
const DELIVERY_ESTIMATE_DAYS: i64 = 7;

/// Order status. Forward-only through the fulfillment states; `Cancelled` is
/// reachable from `Confirmed` and `Processing` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed and acknowledged.
    Confirmed,
    /// Being prepared for shipment.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// On its way.
    #[serde(rename = "In Transit")]
    InTransit,
    /// Delivered; terminal.
    Delivered,
    /// Cancelled by the customer; terminal.
    Cancelled,
}

impl OrderStatus {
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Confirmed => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::InTransit => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether a customer cancellation is still allowed from this status.
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing)
    }

    /// Whether the order has been handed to the carrier, so tracking
    /// information can exist.
    pub const fn is_shipped(self) -> bool {
        matches!(self, Self::Shipped | Self::InTransit | Self::Delivered)
    }

    /// Whether fulfillment may move the order from this status to `next`.
    /// Only strictly forward moves are allowed; `Cancelled` takes part in no
    /// forward progression.
    pub fn can_advance_to(self, next: Self) -> bool {
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(Self::Confirmed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "In Transit" => Ok(Self::InTransit),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::ValidationFailed(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// How the customer pays. Recorded, not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[serde(rename = "COD")]
    Cod,
    /// UPI transfer.
    #[serde(rename = "UPI")]
    Upi,
    /// Card payment.
    Card,
    /// Net banking.
    #[serde(rename = "Net Banking")]
    NetBanking,
}

impl PaymentMethod {
    /// Initial payment status at order creation: COD stays pending until
    /// delivery, everything else is treated as settled up front (no gateway
    /// call is made).
    pub const fn initial_payment_status(self) -> PaymentStatus {
        match self {
            Self::Cod => PaymentStatus::Pending,
            Self::Upi | Self::Card | Self::NetBanking => PaymentStatus::Paid,
        }
    }
}

/// Settlement state of the recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Not yet collected.
    Pending,
    /// Collected.
    Paid,
    /// Collection failed.
    Failed,
    /// Returned after cancellation.
    Refunded,
}

/// Immutable line snapshot copied from the cart at order creation. Later
/// catalog price changes never affect historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// The ordered product.
    pub product_id: ProductId,
    /// Name as it was in the cart.
    pub name: ProductName,
    /// Unit price as it was in the cart.
    pub price: Money,
    /// Image URL as it was in the cart.
    pub image: String,
    /// Units ordered.
    pub quantity: Quantity,
    /// Selected size, if any.
    pub selected_size: Option<String>,
    /// Selected color, if any.
    pub selected_color: Option<String>,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: item.quantity,
            selected_size: item.selected_size.clone(),
            selected_color: item.selected_color.clone(),
        }
    }
}

/// A placed order. Created atomically by the factory, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Human-readable unique order identifier.
    pub order_id: OrderId,
    /// The owning user.
    pub user: UserId,
    /// Line snapshots in cart order.
    pub items: Vec<OrderItem>,
    /// Total copied from the cart at creation.
    pub total_amount: Money,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Address snapshot; later address-book edits don't affect it.
    pub delivery_address: DeliveryAddress,
    /// Recorded payment method.
    pub payment_method: PaymentMethod,
    /// Settlement state.
    pub payment_status: PaymentStatus,
    /// Carrier tracking id, set by fulfillment.
    #[serde(default)]
    pub tracking_id: Option<String>,
    /// Estimated delivery date, defaulted to creation + 7 days.
    pub estimated_delivery: DateTime<Utc>,
    /// When the order was delivered, if it has been.
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// Pagination envelope for order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub current_page: u64,
    /// Number of pages at the requested limit.
    pub total_pages: u64,
    /// Total matching orders.
    pub total_count: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

/// One page of a user's orders, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersPage {
    /// The orders on this page.
    pub orders: Vec<Order>,
    /// Page bookkeeping.
    pub pagination: Pagination,
}

/// Persistence seam for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. Fails with
    /// [`crate::errors::StorageError::DuplicateOrderId`] if the id exists.
    async fn insert(&self, order: &Order) -> StorageResult<()>;

    /// Finds an order owned by `user`.
    async fn find(&self, user: UserId, id: &OrderId) -> StorageResult<Option<Order>>;

    /// Replaces a stored order (status, tracking, delivery timestamps).
    async fn update(&self, order: &Order) -> StorageResult<()>;

    /// Lists the user's orders newest-first, optionally filtered by status,
    /// with `offset`/`limit` windowing. Returns the page and the total match
    /// count.
    async fn list(
        &self,
        user: UserId,
        status: Option<OrderStatus>,
        offset: u64,
        limit: u64,
    ) -> StorageResult<(Vec<Order>, u64)>;
}

/// Order factory and lifecycle: placement, cancellation, lookup, and the
/// fulfillment-side forward progression.
#[derive(Clone)]
pub struct OrderService {
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    ledger: InventoryLedger,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    /// Creates the service over its seams.
    pub fn new(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        ledger: InventoryLedger,
    ) -> Self {
        Self {
            carts,
            orders,
            ledger,
        }
    }

    /// Converts the user's cart into an order.
    ///
    /// Reservations come first: every line is reserved through the inventory
    /// ledger, and a failure on any line releases the lines already reserved
    /// and aborts the whole placement. The ledger call is the authoritative
    /// stock guard, all-or-nothing. Only with every reservation held is the
    /// order persisted and the cart emptied.
    #[instrument(skip(self, delivery))]
    pub async fn place_order(
        &self,
        user: UserId,
        delivery: DeliveryAddress,
        payment_method: PaymentMethod,
    ) -> CoreResult<Order> {
        delivery.validated()?;

        let cart = self
            .carts
            .load(user)
            .await?
            .filter(|cart| !cart.items.is_empty())
            .ok_or(CoreError::EmptyCart)?;

        let mut reserved: Vec<(ProductId, Quantity)> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            match self.ledger.reserve(item.product_id, item.quantity).await {
                Ok(_) => reserved.push((item.product_id, item.quantity)),
                Err(err) => {
                    self.release_all(&reserved).await;
                    return Err(match err {
                        LedgerError::OutOfStock {
                            requested,
                            available,
                            ..
                        } => CoreError::InsufficientInventory {
                            name: item.name.to_string(),
                            requested,
                            available,
                        },
                        // An item whose product has left the catalog cannot
                        // be fulfilled; report it the same way.
                        LedgerError::UnknownProduct(_) => CoreError::InsufficientInventory {
                            name: item.name.to_string(),
                            requested: item.quantity.value(),
                            available: 0,
                        },
                        LedgerError::Storage(err) => err.into(),
                    });
                }
            }
        }

        let now = Utc::now();
        let order = Order {
            order_id: OrderId::generate(),
            user,
            items: cart.items.iter().map(OrderItem::from).collect(),
            total_amount: cart.total_amount()?,
            status: OrderStatus::Confirmed,
            delivery_address: delivery,
            payment_method,
            payment_status: payment_method.initial_payment_status(),
            tracking_id: None,
            estimated_delivery: now + Duration::days(DELIVERY_ESTIMATE_DAYS),
            delivered_at: None,
            created_at: now,
        };

        if let Err(err) = self.orders.insert(&order).await {
            self.release_all(&reserved).await;
            return Err(err.into());
        }

        // Cart failures past this point are logged, not fatal: the order and
        // its reservations are already durable.
        if let Err(err) = mutate_cart(&self.carts, user, |cart| {
            cart.items.clear();
            Ok(())
        })
        .await
        {
            warn!(user = %user, order = %order.order_id, error = %err, "failed to clear cart after order placement");
        }

        info!(user = %user, order = %order.order_id, total = %order.total_amount, "order placed");
        Ok(order)
    }

    /// Cancels an order the user owns.
    ///
    /// Allowed from `Confirmed` and `Processing` only; a second cancellation
    /// is rejected, not idempotent. On success the status is stored first,
    /// then every line's stock is released back to the catalog.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user: UserId, id: &OrderId) -> CoreResult<Order> {
        let mut order = self
            .orders
            .find(user, id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", id))?;

        if !order.status.can_cancel() {
            return Err(CoreError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        order.status = OrderStatus::Cancelled;
        self.orders.update(&order).await?;

        for item in &order.items {
            if let Err(err) = self.ledger.release(item.product_id, item.quantity).await {
                // The order is already cancelled; a line that cannot be
                // restored (product gone) is logged and skipped.
                warn!(order = %order.order_id, product = %item.product_id, error = %err, "failed to restore stock on cancellation");
            }
        }

        info!(user = %user, order = %order.order_id, "order cancelled");
        Ok(order)
    }

    /// Returns a single order owned by the user.
    #[instrument(skip(self))]
    pub async fn get_order(&self, user: UserId, id: &OrderId) -> CoreResult<Order> {
        self.orders
            .find(user, id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", id))
    }

    /// Lists the user's orders newest-first with pagination and an optional
    /// status filter. `page` is 1-based; `limit` is clamped to 1..=100.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user: UserId,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
    ) -> CoreResult<OrdersPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        // Saturates rather than overflowing on absurd page numbers; the
        // window past the last order is simply empty.
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let (orders, total_count) = self.orders.list(user, status, offset, limit).await?;
        let total_pages = total_count.div_ceil(limit);

        Ok(OrdersPage {
            orders,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_count,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        })
    }

    /// Moves an order strictly forward through the fulfillment states. Used
    /// by the fulfillment process, not exposed to customers. Reaching
    /// `Delivered` stamps `delivered_at`.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        user: UserId,
        id: &OrderId,
        to: OrderStatus,
    ) -> CoreResult<Order> {
        let mut order = self
            .orders
            .find(user, id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", id))?;

        if !order.status.can_advance_to(to) {
            return Err(CoreError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        order.status = to;
        if to == OrderStatus::Delivered {
            order.delivered_at = Some(Utc::now());
        }
        self.orders.update(&order).await?;
        info!(order = %order.order_id, status = %order.status, "order status advanced");
        Ok(order)
    }

    /// Records the carrier tracking id on an order. A fulfillment write,
    /// only meaningful once the order has shipped.
    #[instrument(skip(self))]
    pub async fn set_tracking(
        &self,
        user: UserId,
        id: &OrderId,
        tracking_id: String,
    ) -> CoreResult<Order> {
        if tracking_id.trim().is_empty() {
            return Err(CoreError::ValidationFailed(
                "tracking id cannot be empty".to_string(),
            ));
        }
        let mut order = self
            .orders
            .find(user, id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", id))?;
        if !order.status.is_shipped() {
            return Err(CoreError::ValidationFailed(format!(
                "cannot assign tracking to a {} order",
                order.status
            )));
        }
        order.tracking_id = Some(tracking_id);
        self.orders.update(&order).await?;
        Ok(order)
    }

    async fn release_all(&self, reserved: &[(ProductId, Quantity)]) {
        for (product, qty) in reserved {
            if let Err(err) = self.ledger.release(*product, *qty).await {
                warn!(product = %product, error = %err, "failed to roll back reservation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CartItemId;

    #[test]
    fn cancellation_allowed_only_before_shipment() {
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::InTransit.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn status_advances_strictly_forward() {
        assert!(OrderStatus::Confirmed.can_advance_to(OrderStatus::Processing));
        assert!(OrderStatus::Confirmed.can_advance_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_advance_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_advance_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_advance_to(OrderStatus::Processing));
    }

    #[test]
    fn status_display_matches_wire_strings() {
        assert_eq!(OrderStatus::InTransit.to_string(), "In Transit");
        assert_eq!(
            serde_json::to_value(OrderStatus::InTransit).unwrap(),
            serde_json::json!("In Transit")
        );
        assert_eq!("In Transit".parse::<OrderStatus>().unwrap(), OrderStatus::InTransit);
        assert!("in transit".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn payment_method_wire_names() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::NetBanking).unwrap(),
            serde_json::json!("Net Banking")
        );
        assert_eq!(
            serde_json::from_value::<PaymentMethod>(serde_json::json!("COD")).unwrap(),
            PaymentMethod::Cod
        );
    }

    #[test]
    fn cod_starts_pending_everything_else_paid() {
        assert_eq!(
            PaymentMethod::Cod.initial_payment_status(),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentMethod::Upi.initial_payment_status(),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentMethod::Card.initial_payment_status(),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentMethod::NetBanking.initial_payment_status(),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn order_item_snapshots_cart_line() {
        let cart_item = CartItem {
            id: CartItemId::new(),
            product_id: ProductId::new(),
            name: ProductName::try_new("Canvas Sneakers".to_string()).unwrap(),
            price: Money::from_cents(4_999).unwrap(),
            image: "https://img.example/sneakers.jpg".to_string(),
            quantity: Quantity::new(2).unwrap(),
            selected_size: Some("42".to_string()),
            selected_color: None,
        };
        let order_item = OrderItem::from(&cart_item);
        assert_eq!(order_item.product_id, cart_item.product_id);
        assert_eq!(order_item.price, cart_item.price);
        assert_eq!(order_item.quantity, cart_item.quantity);
        assert_eq!(order_item.selected_size.as_deref(), Some("42"));
    }
}
