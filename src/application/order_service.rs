use crate::config::OrderPolicy;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, OrderItemInput, OrderStatus, OrderView, PlaceOrder};
use crate::domain::ports::{CartRepository, OfferRepository, OrderRepository};

use super::pricing::PricingEngine;

pub struct OrderService<C, F, R> {
    pricing: PricingEngine<C, F>,
    repo: R,
    policy: OrderPolicy,
}

impl<C, F, R> OrderService<C, F, R>
where
    C: CartRepository,
    F: OfferRepository,
    R: OrderRepository,
{
    pub fn new(carts: C, offers: F, repo: R, policy: OrderPolicy) -> Self {
        Self {
            pricing: PricingEngine::new(carts, offers),
            repo,
            policy,
        }
    }

    /// Freezes the current prices of the selected cart lines into an order.
    /// Header and items are written in one transaction.
    pub fn place_order(&self, user_id: i64, request: PlaceOrder) -> Result<OrderView, DomainError> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(DomainError::invalid("address is required"));
        }
        let payment_method = request.payment_method.trim();
        if payment_method.is_empty() {
            return Err(DomainError::invalid("payment_method is required"));
        }
        let coupon = request
            .coupon
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let snapshot = self.pricing.checkout(user_id, &request.cart_ids)?;

        let items: Vec<OrderItemInput> = snapshot
            .lines
            .iter()
            .map(|l| OrderItemInput {
                product_id: l.line.product_id,
                quantity: l.line.quantity,
                item_price: l.item_price,
                item_discounted_price: l.item_discounted_price,
            })
            .collect();

        let clear: Vec<i64> = if self.policy.clear_cart_after_order {
            snapshot.lines.iter().map(|l| l.line.id).collect()
        } else {
            Vec::new()
        };

        let order = self.repo.create(
            NewOrder {
                user_id,
                address: address.to_string(),
                payment_method: payment_method.to_string(),
                final_price: snapshot.total_discounted_price,
                coupon,
            },
            items,
            &clear,
        )?;

        log::info!(
            "order {} placed by user {}: {} items, final price {} (list {})",
            order.id,
            user_id,
            order.items.len(),
            order.final_price,
            snapshot.total_price
        );

        Ok(order)
    }

    /// Orders of other users are reported as not found.
    pub fn get_order(&self, user_id: i64, id: i64) -> Result<OrderView, DomainError> {
        self.repo
            .find_by_id(id)?
            .filter(|o| o.user_id == user_id)
            .ok_or(DomainError::NotFound("Order"))
    }

    pub fn list_orders(&self, user_id: i64, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.repo
            .list_for_user(user_id, page.max(1), limit.clamp(1, 100))
    }

    /// Records a fulfillment transition. Payment status is left alone.
    pub fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<OrderView, DomainError> {
        self.repo.update_order_status(id, status)?;
        log::info!("order {} moved to {}", id, status);
        self.repo
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Order"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::application::cart_service::CartService;
    use crate::application::test_support::FakeStore;
    use crate::domain::order::PaymentStatus;

    fn service(store: &FakeStore, policy: OrderPolicy) -> OrderService<FakeStore, FakeStore, FakeStore> {
        OrderService::new(store.clone(), store.clone(), store.clone(), policy)
    }

    fn carts(store: &FakeStore) -> CartService<FakeStore, FakeStore, FakeStore> {
        CartService::new(store.clone(), store.clone(), store.clone())
    }

    fn request(cart_ids: Vec<i64>) -> PlaceOrder {
        PlaceOrder {
            address: "A".to_string(),
            payment_method: "CASH".to_string(),
            coupon: None,
            cart_ids,
        }
    }

    #[test]
    fn order_freezes_discounted_total_and_items() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        store.add_offer(p1, 10, Utc::now() + Duration::days(1));
        let line = carts(&store).add_to_cart(7, p1, 2).expect("add").line.line;

        let order = service(&store, OrderPolicy::default())
            .place_order(7, request(vec![line.id]))
            .expect("place");

        assert_eq!(order.final_price, 180);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].item_price, 200);
        assert_eq!(order.items[0].item_discounted_price, 180);
    }

    #[test]
    fn items_sum_to_final_price() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 333);
        let p2 = store.add_product("P2", 70);
        store.add_offer(p1, 15, Utc::now() + Duration::days(1));
        let carts = carts(&store);
        let l1 = carts.add_to_cart(7, p1, 3).expect("add").line.line;
        let l2 = carts.add_to_cart(7, p2, 2).expect("add").line.line;

        let order = service(&store, OrderPolicy::default())
            .place_order(7, request(vec![l1.id, l2.id]))
            .expect("place");

        let sum: i64 = order.items.iter().map(|i| i.item_discounted_price).sum();
        assert_eq!(sum, order.final_price);
    }

    #[test]
    fn later_price_changes_do_not_touch_placed_orders() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let line = carts(&store).add_to_cart(7, p1, 1).expect("add").line.line;
        let orders = service(&store, OrderPolicy::default());
        let placed = orders.place_order(7, request(vec![line.id])).expect("place");

        store.set_price(p1, 500);
        store.add_offer(p1, 50, Utc::now() + Duration::days(1));

        let reloaded = orders.get_order(7, placed.id).expect("get");
        assert_eq!(reloaded.final_price, 100);
        assert_eq!(reloaded.items, placed.items);
    }

    #[test]
    fn cart_survives_by_default_and_clears_when_configured() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let carts = carts(&store);
        let line = carts.add_to_cart(7, p1, 1).expect("add").line.line;

        service(&store, OrderPolicy::default())
            .place_order(7, request(vec![line.id]))
            .expect("place");
        assert_eq!(carts.get_cart(7).expect("get").len(), 1);

        service(
            &store,
            OrderPolicy {
                clear_cart_after_order: true,
            },
        )
        .place_order(7, request(vec![line.id]))
        .expect("place");
        assert!(carts.get_cart(7).expect("get").is_empty());
    }

    #[test]
    fn failed_write_leaves_no_order() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let line = carts(&store).add_to_cart(7, p1, 1).expect("add").line.line;
        store.fail_next_order_create();

        let result = service(&store, OrderPolicy::default()).place_order(7, request(vec![line.id]));

        assert!(matches!(result, Err(DomainError::Internal(_))));
        assert_eq!(store.order_count(), 0);
    }

    #[test]
    fn placement_validates_input() {
        let store = FakeStore::new();
        let orders = service(&store, OrderPolicy::default());

        let mut no_address = request(vec![1]);
        no_address.address = "  ".to_string();
        assert!(matches!(
            orders.place_order(7, no_address),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            orders.place_order(7, request(vec![])),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            orders.place_order(7, request(vec![42])),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn blank_coupon_is_stored_as_none() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let line = carts(&store).add_to_cart(7, p1, 1).expect("add").line.line;
        let mut req = request(vec![line.id]);
        req.coupon = Some(" ".to_string());

        let order = service(&store, OrderPolicy::default())
            .place_order(7, req)
            .expect("place");
        assert!(order.coupon.is_none());
    }

    #[test]
    fn orders_are_private_to_their_user() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let line = carts(&store).add_to_cart(7, p1, 1).expect("add").line.line;
        let orders = service(&store, OrderPolicy::default());
        let placed = orders.place_order(7, request(vec![line.id])).expect("place");

        assert!(matches!(
            orders.get_order(8, placed.id),
            Err(DomainError::NotFound(_))
        ));
        assert_eq!(orders.list_orders(7, 0, 500).expect("list").total, 1);
        assert_eq!(orders.list_orders(8, 1, 20).expect("list").total, 0);
    }

    #[test]
    fn status_update_keeps_payment_status() {
        let store = FakeStore::new();
        let p1 = store.add_product("P1", 100);
        let line = carts(&store).add_to_cart(7, p1, 1).expect("add").line.line;
        let orders = service(&store, OrderPolicy::default());
        let placed = orders.place_order(7, request(vec![line.id])).expect("place");

        let shipped = orders
            .update_order_status(placed.id, OrderStatus::Shipped)
            .expect("update");
        assert_eq!(shipped.order_status, OrderStatus::Shipped);
        assert_eq!(shipped.payment_status, PaymentStatus::Unpaid);
        assert!(matches!(
            orders.update_order_status(placed.id + 1000, OrderStatus::Shipped),
            Err(DomainError::NotFound(_))
        ));
    }
}
