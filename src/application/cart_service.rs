use crate::domain::cart::{AddedLine, CartLine, CartUpdate, CheckoutSnapshot, PricedCartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, OfferRepository, ProductRepository};

use super::pricing::PricingEngine;

pub struct CartService<C, P, F> {
    carts: C,
    products: P,
    pricing: PricingEngine<C, F>,
}

impl<C, P, F> CartService<C, P, F>
where
    C: CartRepository + Clone,
    P: ProductRepository,
    F: OfferRepository,
{
    pub fn new(carts: C, products: P, offers: F) -> Self {
        Self {
            pricing: PricingEngine::new(carts.clone(), offers),
            carts,
            products,
        }
    }

    pub fn add_to_cart(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<AddedLine, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::invalid("quantity must be positive"));
        }
        if self.products.find_by_id(product_id)?.is_none() {
            return Err(DomainError::NotFound("Product"));
        }

        // Only decides created-vs-merged for the response; the write itself
        // is a single upsert.
        let existing = self.carts.check_if_item_is_already_added(user_id, product_id)?;
        let line = self.carts.add_to_cart(user_id, product_id, quantity)?;

        let priced = self
            .pricing
            .get_cart(user_id, Some(&[line.id][..]))?
            .into_iter()
            .next()
            .ok_or(DomainError::NotFound("Cart line"))?;

        log::info!(
            "cart line {} for user {}: product {} now x{}",
            line.id,
            user_id,
            product_id,
            line.quantity
        );

        Ok(AddedLine {
            line: priced,
            created: existing.is_none(),
        })
    }

    pub fn increase_quantity(
        &self,
        user_id: i64,
        cart_id: i64,
        delta: i32,
    ) -> Result<CartLine, DomainError> {
        if delta <= 0 {
            return Err(DomainError::invalid("quantity must be positive"));
        }
        self.carts.update_quantity_add(user_id, cart_id, delta)
    }

    pub fn decrease_quantity(
        &self,
        user_id: i64,
        cart_id: i64,
        delta: i32,
    ) -> Result<CartUpdate, DomainError> {
        if delta <= 0 {
            return Err(DomainError::invalid("quantity must be positive"));
        }
        let update = self.carts.update_quantity_less(user_id, cart_id, delta)?;
        Ok(Self::log_removal(user_id, update))
    }

    /// Absolute set; zero or below removes the line.
    pub fn set_quantity(
        &self,
        user_id: i64,
        cart_id: i64,
        quantity: i32,
    ) -> Result<CartUpdate, DomainError> {
        let update = self.carts.update_quantity(user_id, cart_id, quantity)?;
        Ok(Self::log_removal(user_id, update))
    }

    pub fn remove(&self, user_id: i64, cart_id: i64) -> Result<(), DomainError> {
        self.carts.remove_from_cart(user_id, cart_id)
    }

    pub fn get_cart(&self, user_id: i64) -> Result<Vec<PricedCartLine>, DomainError> {
        self.pricing.get_cart(user_id, None)
    }

    pub fn cart_summary(&self, user_id: i64) -> Result<CheckoutSnapshot, DomainError> {
        CheckoutSnapshot::from_lines(self.get_cart(user_id)?)
    }

    pub fn checkout(&self, user_id: i64, cart_ids: &[i64]) -> Result<CheckoutSnapshot, DomainError> {
        self.pricing.checkout(user_id, cart_ids)
    }

    fn log_removal(user_id: i64, update: CartUpdate) -> CartUpdate {
        if let CartUpdate::Removed(cart_id) = &update {
            log::info!("cart line {} for user {} removed", cart_id, user_id);
        }
        update
    }
}
