use std::collections::BTreeSet;

use chrono::Utc;

use crate::domain::cart::{price_line, CheckoutSnapshot, PricedCartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, OfferRepository};

/// Prices cart lines against the offers active at call time. Nothing is
/// cached: every call re-reads prices and offers.
#[derive(Clone)]
pub struct PricingEngine<C, F> {
    carts: C,
    offers: F,
}

impl<C: CartRepository, F: OfferRepository> PricingEngine<C, F> {
    pub fn new(carts: C, offers: F) -> Self {
        Self { carts, offers }
    }

    pub fn get_cart(
        &self,
        user_id: i64,
        cart_ids: Option<&[i64]>,
    ) -> Result<Vec<PricedCartLine>, DomainError> {
        let now = Utc::now();
        self.carts
            .get_cart(user_id, cart_ids)?
            .into_iter()
            .map(|line| {
                let rate = self.offers.find_offer_rate(line.product_id, now)?;
                price_line(line, rate)
            })
            .collect()
    }

    /// Prices exactly the requested lines. Any missing line or failed offer
    /// lookup fails the whole snapshot.
    pub fn checkout(&self, user_id: i64, cart_ids: &[i64]) -> Result<CheckoutSnapshot, DomainError> {
        let wanted: BTreeSet<i64> = cart_ids.iter().copied().collect();
        if wanted.is_empty() {
            return Err(DomainError::invalid("cart_ids must not be empty"));
        }
        let ids: Vec<i64> = wanted.into_iter().collect();

        let lines = self.get_cart(user_id, Some(ids.as_slice()))?;
        if lines.len() != ids.len() {
            return Err(DomainError::NotFound("Cart line"));
        }

        CheckoutSnapshot::from_lines(lines)
    }
}
