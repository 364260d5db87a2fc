//! Cart aggregate: one active cart per user.
//!
//! Lines are keyed by (product, size, color) for merging. Name, price, and
//! image are frozen onto the line when it is first added; later catalog
//! changes do not refresh them. Totals are always derived from the lines,
//! never stored.

use crate::catalog::CatalogStore;
use crate::errors::{CoreError, CoreResult, StorageError, StorageResult};
use crate::types::{CartItemId, Money, ProductId, ProductName, Quantity, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Bounded retries for the optimistic read-modify-write cycle on a cart.
const SAVE_RETRIES: u32 = 3;

/// A single line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line identifier, stable across quantity updates.
    pub id: CartItemId,
    /// The product this line refers to.
    pub product_id: ProductId,
    /// Name frozen at add-time.
    pub name: ProductName,
    /// Unit price frozen at add-time.
    pub price: Money,
    /// Image URL frozen at add-time.
    pub image: String,
    /// Units on this line, at least 1.
    pub quantity: Quantity,
    /// Selected size, if the product has sizes.
    pub selected_size: Option<String>,
    /// Selected color, if the product has colors.
    pub selected_color: Option<String>,
}

impl CartItem {
    /// The identity key used when merging an added item into existing lines.
    pub fn merge_key(&self) -> (ProductId, Option<&str>, Option<&str>) {
        (
            self.product_id,
            self.selected_size.as_deref(),
            self.selected_color.as_deref(),
        )
    }
}

/// A user's cart with its storage version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// The owning user.
    pub user: UserId,
    /// Lines in insertion order.
    pub items: Vec<CartItem>,
    /// Version read from storage; saves check it to serialize writers.
    pub version: u64,
}

impl Cart {
    /// An empty, never-persisted cart for `user`.
    pub fn empty(user: UserId) -> Self {
        Self {
            user,
            items: Vec::new(),
            version: 0,
        }
    }

    /// Sum of `price x quantity` over all lines.
    pub fn total_amount(&self) -> CoreResult<Money> {
        self.items.iter().try_fold(Money::zero(), |acc, item| {
            acc.checked_add(item.price.times(item.quantity)?)
        })
    }

    /// Sum of quantities over all lines.
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity.value()))
    }

    fn position_of(
        &self,
        product: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.merge_key() == (product, size, color))
    }
}

/// Snapshot of a cart returned from every read and mutation, shaped for
/// optimistic client rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    /// Lines in display order.
    pub items: Vec<CartItem>,
    /// Derived total amount.
    pub total_amount: Money,
    /// Derived total unit count.
    pub total_items: u32,
}

impl CartView {
    /// Builds a view from a cart, recomputing both totals.
    pub fn from_cart(cart: &Cart) -> CoreResult<Self> {
        Ok(Self {
            items: cart.items.clone(),
            total_amount: cart.total_amount()?,
            total_items: cart.total_items(),
        })
    }
}

/// Persistence seam for carts.
///
/// `save` must atomically compare the stored version against `cart.version`
/// and fail with [`StorageError::VersionConflict`] on mismatch, so that two
/// concurrent read-modify-write cycles on the same cart cannot lose updates.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the user's cart, if one has been persisted.
    async fn load(&self, user: UserId) -> StorageResult<Option<Cart>>;

    /// Persists the cart, returning the new version.
    async fn save(&self, cart: &Cart) -> StorageResult<u64>;
}

/// Runs a read-modify-write cycle on a user's cart with bounded retries on
/// version conflict. Creates an empty cart when none exists yet.
pub(crate) async fn mutate_cart<F>(
    store: &Arc<dyn CartStore>,
    user: UserId,
    mut mutate: F,
) -> CoreResult<Cart>
where
    F: FnMut(&mut Cart) -> CoreResult<()>,
{
    let mut attempts = 0;
    loop {
        let mut cart = store
            .load(user)
            .await?
            .unwrap_or_else(|| Cart::empty(user));
        mutate(&mut cart)?;
        match store.save(&cart).await {
            Ok(version) => {
                cart.version = version;
                return Ok(cart);
            }
            Err(err @ StorageError::VersionConflict { .. }) => {
                attempts += 1;
                if attempts >= SAVE_RETRIES {
                    return Err(err.into());
                }
                debug!(user = %user, attempts, "cart version conflict, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Cart operations: get, add, update, remove, clear.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService").finish_non_exhaustive()
    }
}

impl CartService {
    /// Creates the service over its two store seams.
    pub fn new(catalog: Arc<dyn CatalogStore>, carts: Arc<dyn CartStore>) -> Self {
        Self { catalog, carts }
    }

    /// Returns the user's cart, creating and persisting an empty one on first
    /// access.
    #[instrument(skip(self))]
    pub async fn get(&self, user: UserId) -> CoreResult<CartView> {
        if let Some(cart) = self.carts.load(user).await? {
            return CartView::from_cart(&cart);
        }
        let cart = mutate_cart(&self.carts, user, |_| Ok(())).await?;
        CartView::from_cart(&cart)
    }

    /// Adds `qty` units of a product to the cart, merging into an existing
    /// line with the same (product, size, color) key.
    ///
    /// The stock check here is advisory; order placement re-validates through
    /// the inventory ledger.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        qty: Quantity,
        selected_size: Option<String>,
        selected_color: Option<String>,
    ) -> CoreResult<CartView> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| CoreError::not_found("product", product_id))?;

        if product.stock < qty.value() {
            return Err(CoreError::InsufficientInventory {
                name: product.name.to_string(),
                requested: qty.value(),
                available: product.stock,
            });
        }

        let cart = mutate_cart(&self.carts, user, |cart| {
            let existing =
                cart.position_of(product_id, selected_size.as_deref(), selected_color.as_deref());
            match existing {
                Some(i) => {
                    let line = cart
                        .items
                        .get_mut(i)
                        .ok_or_else(|| CoreError::Internal("cart line vanished".to_string()))?;
                    let merged = line.quantity.checked_add(qty)?;
                    if product.stock < merged.value() {
                        return Err(CoreError::InsufficientInventory {
                            name: product.name.to_string(),
                            requested: merged.value(),
                            available: product.stock,
                        });
                    }
                    line.quantity = merged;
                }
                None => {
                    cart.items.push(CartItem {
                        id: CartItemId::new(),
                        product_id,
                        name: product.name.clone(),
                        price: product.price,
                        image: product.image.clone(),
                        quantity: qty,
                        selected_size: selected_size.clone(),
                        selected_color: selected_color.clone(),
                    });
                }
            }
            Ok(())
        })
        .await?;

        debug!(user = %user, product = %product_id, "item added to cart");
        CartView::from_cart(&cart)
    }

    /// Sets the quantity of an existing line.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user: UserId,
        item_id: CartItemId,
        qty: Quantity,
    ) -> CoreResult<CartView> {
        let current = self
            .carts
            .load(user)
            .await?
            .ok_or_else(|| CoreError::not_found("cart", user))?;
        let product_id = current
            .items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.product_id)
            .ok_or_else(|| CoreError::not_found("cart item", item_id))?;

        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("product", product_id))?;
        if product.stock < qty.value() {
            return Err(CoreError::InsufficientInventory {
                name: product.name.to_string(),
                requested: qty.value(),
                available: product.stock,
            });
        }

        let cart = mutate_cart(&self.carts, user, |cart| {
            let line = cart
                .items
                .iter_mut()
                .find(|item| item.id == item_id)
                .ok_or_else(|| CoreError::not_found("cart item", item_id))?;
            line.quantity = qty;
            Ok(())
        })
        .await?;
        CartView::from_cart(&cart)
    }

    /// Removes a line if present. Removing an unknown line is not an error.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user: UserId, item_id: CartItemId) -> CoreResult<CartView> {
        let cart = mutate_cart(&self.carts, user, |cart| {
            cart.items.retain(|item| item.id != item_id);
            Ok(())
        })
        .await?;
        CartView::from_cart(&cart)
    }

    /// Empties the cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, user: UserId) -> CoreResult<CartView> {
        let cart = mutate_cart(&self.carts, user, |cart| {
            cart.items.clear();
            Ok(())
        })
        .await?;
        CartView::from_cart(&cart)
    }
}
