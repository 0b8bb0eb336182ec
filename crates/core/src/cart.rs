//! Shopping cart and favorites.
//!
//! The cart is a small ordered list of `(product, quantity)` lines kept in
//! the shopper's session. Adding a product that is already in the cart
//! merges quantities; every quantity is clamped to what is in stock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Money, ProductId};

/// Upper bound for a single line, regardless of stock.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Cart operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

fn clamp_quantity(quantity: u32, available: u32) -> u32 {
    quantity.min(available).min(MAX_LINE_QUANTITY)
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity of a product currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Add `quantity` units, merging with an existing line.
    ///
    /// The resulting line quantity is clamped to `available` and
    /// [`MAX_LINE_QUANTITY`]. Returns the new line quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when nothing is available.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        available: u32,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return Ok(self.quantity_of(&product_id));
        }
        if available == 0 {
            return Err(CartError::OutOfStock(product_id));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = clamp_quantity(line.quantity.saturating_add(quantity), available);
            return Ok(line.quantity);
        }

        let quantity = clamp_quantity(quantity, available);
        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        Ok(quantity)
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the product is not in the cart.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        available: u32,
    ) -> Result<u32, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| &l.product_id == product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;

        let quantity = clamp_quantity(quantity, available);
        if quantity == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = quantity;
        }
        Ok(quantity)
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A cart line joined with current product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    /// Units currently in stock.
    pub available: u32,
}

/// A cart priced against the current catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub item_count: u32,
    /// Products in the cart that no longer exist in the catalog.
    pub missing: Vec<ProductId>,
}

impl PricedCart {
    /// Lines asking for more units than are in stock.
    #[must_use]
    pub fn over_stock(&self) -> Vec<&PricedLine> {
        self.lines
            .iter()
            .filter(|l| l.quantity > l.available)
            .collect()
    }
}

/// Price a cart using `lookup` to resolve products.
pub fn price<'a, F>(cart: &Cart, mut lookup: F) -> PricedCart
where
    F: FnMut(&ProductId) -> Option<&'a Product>,
{
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut missing = Vec::new();

    for line in &cart.lines {
        let Some(product) = lookup(&line.product_id) else {
            missing.push(line.product_id.clone());
            continue;
        };
        let unit_price = product.effective_price();
        lines.push(PricedLine {
            product_id: line.product_id.clone(),
            name: product.name.clone(),
            image: product.images.first().cloned(),
            unit_price,
            quantity: line.quantity,
            line_total: unit_price.times(line.quantity),
            available: product.stock,
        });
    }

    PricedCart {
        subtotal: lines.iter().map(|l| l.line_total).sum(),
        item_count: lines.iter().map(|l| l.quantity).sum(),
        lines,
        missing,
    }
}

/// A shopper's favorite products, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    ids: Vec<ProductId>,
}

impl Favorites {
    /// Favorite product ids.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Whether the product is a favorite.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.ids.contains(product_id)
    }

    /// Add a favorite. Returns `false` if it was already present.
    pub fn insert(&mut self, product_id: ProductId) -> bool {
        if self.contains(&product_id) {
            return false;
        }
        self.ids.push(product_id);
        true
    }

    /// Remove a favorite. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != product_id);
        self.ids.len() != before
    }

    /// Flip membership. Returns the new membership.
    pub fn toggle(&mut self, product_id: ProductId) -> bool {
        if self.remove(&product_id) {
            false
        } else {
            self.ids.push(product_id);
            true
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn id(s: &str) -> ProductId {
        ProductId::new(s)
    }

    #[test]
    fn test_add_merges_quantities() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(id("rose"), 2, 10), Ok(2));
        assert_eq!(cart.add(id("tulip"), 1, 10), Ok(1));
        assert_eq!(cart.add(id("rose"), 3, 10), Ok(5));
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_add_clamps_to_stock_and_line_cap() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(id("rose"), 8, 5), Ok(5));
        assert_eq!(cart.add(id("rose"), 8, 5), Ok(5));
        assert_eq!(cart.add(id("fern"), 500, 1000), Ok(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_add_out_of_stock_and_zero() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(id("rose"), 1, 0),
            Err(CartError::OutOfStock(id("rose")))
        );
        assert_eq!(cart.add(id("rose"), 0, 10), Ok(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(id("rose"), 2, 10).unwrap();
        assert_eq!(cart.set_quantity(&id("rose"), 7, 10), Ok(7));
        assert_eq!(cart.set_quantity(&id("rose"), 0, 10), Ok(0));
        assert!(cart.is_empty());
        assert_eq!(
            cart.set_quantity(&id("rose"), 1, 10),
            Err(CartError::LineNotFound(id("rose")))
        );
    }

    #[test]
    fn test_price_uses_effective_price_and_reports_missing() {
        let mut roses = product("Roses", "bouquets", 4000, 10);
        roses.sale_price = Some(Money::from_cents(3500));
        let catalog = [roses];

        let mut cart = Cart::new();
        cart.add(catalog[0].id.clone(), 2, 10).unwrap();
        cart.add(id("discontinued"), 1, 10).unwrap();

        let priced = price(&cart, |pid| catalog.iter().find(|p| &p.id == pid));
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.subtotal, Money::from_cents(7000));
        assert_eq!(priced.item_count, 2);
        assert_eq!(priced.missing, vec![id("discontinued")]);
        assert!(priced.over_stock().is_empty());
    }

    #[test]
    fn test_favorites_toggle() {
        let mut favs = Favorites::default();
        assert!(favs.toggle(id("rose")));
        assert!(favs.contains(&id("rose")));
        assert!(!favs.insert(id("rose")));
        assert!(!favs.toggle(id("rose")));
        assert!(favs.ids().is_empty());
    }
}
