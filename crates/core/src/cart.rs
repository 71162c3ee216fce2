//! The client-resident cart aggregate.
//!
//! A [`Cart`] lives on the client and is only synchronized with the server
//! at checkout, when its items are sent as an immutable snapshot. The
//! aggregate keeps two denormalized totals - `total_quantity` and
//! `total_amount` - that are updated inside the same call as every item
//! mutation. The fields are private so no caller can observe or produce a
//! cart whose totals disagree with its items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// The product fields a cart needs when an item is first added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub thumbnail: Option<String>,
}

/// One product line within a cart (and, after checkout, within an order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    /// Price of a single unit at the time the item entered the cart.
    pub unit_price: Decimal,
    pub quantity: u32,
    /// `unit_price * quantity`, maintained alongside `quantity`.
    pub line_total: Decimal,
    pub thumbnail: Option<String>,
}

/// An incrementally-maintained mapping of product to quantity and price,
/// with running totals.
///
/// Deliberately not `Deserialize`: a cart can only be built through its
/// operations, so the totals always match the items.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
    total_quantity: u32,
    total_amount: Decimal,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of all item quantities.
    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// True if the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product` to the cart.
    ///
    /// A product not yet in the cart gets a fresh line with quantity 1;
    /// a product already present has its quantity and line total bumped.
    pub fn add_item(&mut self, product: &ProductRef) {
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => {
                item.quantity += 1;
                item.line_total += product.price;
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.id,
                    title: product.title.clone(),
                    unit_price: product.price,
                    quantity: 1,
                    line_total: product.price,
                    thumbnail: product.thumbnail.clone(),
                });
            }
        }
        self.total_quantity += 1;
        self.total_amount += product.price;
    }

    /// Bump the quantity of an existing line by one.
    ///
    /// A `product_id` not in the cart is a no-op.
    pub fn increase(&mut self, product_id: ProductId) {
        let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) else {
            return;
        };
        item.quantity += 1;
        item.line_total += item.unit_price;
        self.total_quantity += 1;
        self.total_amount += item.unit_price;
    }

    /// Drop the quantity of an existing line by one; a line at quantity 1
    /// is removed entirely (no zero-quantity lines persist).
    ///
    /// A `product_id` not in the cart is a no-op.
    pub fn decrease(&mut self, product_id: ProductId) {
        let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) else {
            return;
        };
        let Some(item) = self.items.get_mut(pos) else {
            return;
        };
        let unit_price = item.unit_price;
        if item.quantity == 1 {
            self.items.remove(pos);
        } else {
            item.quantity -= 1;
            item.line_total -= unit_price;
        }
        self.total_quantity -= 1;
        self.total_amount -= unit_price;
    }

    /// Remove an entire line regardless of its quantity; totals are reduced
    /// by the line's full quantity and line total.
    ///
    /// A `product_id` not in the cart is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) {
        let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) else {
            return;
        };
        let item = self.items.remove(pos);
        self.total_quantity -= item.quantity;
        self.total_amount -= item.line_total;
    }

    /// Clear all items and zero both totals.
    pub fn reset(&mut self) {
        self.items.clear();
        self.total_quantity = 0;
        self.total_amount = Decimal::ZERO;
    }

    /// Snapshot the current items for checkout.
    ///
    /// The snapshot is an owned copy; clearing or mutating the cart after a
    /// checkout submission never changes an order already placed.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }
}
