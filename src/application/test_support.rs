//! In-memory repositories for service tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::cart::{CartLine, CartLineView, CartUpdate};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderItemInput, OrderItemView, OrderStatus, OrderView, PaymentSettlement,
    PaymentStatus,
};
use crate::domain::payment::{BankReport, NewTransaction, Transaction};
use crate::domain::ports::{
    CartRepository, OfferRepository, OrderRepository, ProductRepository, TransactionRepository,
};

#[derive(Default)]
struct State {
    next_id: i64,
    products: HashMap<i64, Product>,
    offers: Vec<(i64, i32, DateTime<Utc>)>,
    cart: BTreeMap<i64, CartLine>,
    orders: BTreeMap<i64, OrderView>,
    transactions: HashMap<String, Transaction>,
    fail_order_create: bool,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake store poisoned")
    }

    pub fn add_product(&self, name: &str, price: i64) -> i64 {
        let mut s = self.lock();
        let id = s.id();
        s.products.insert(
            id,
            Product {
                id,
                name: name.to_string(),
                image: None,
                price,
            },
        );
        id
    }

    pub fn set_price(&self, product_id: i64, price: i64) {
        if let Some(p) = self.lock().products.get_mut(&product_id) {
            p.price = price;
        }
    }

    pub fn add_offer(&self, product_id: i64, rate: i32, expires_at: DateTime<Utc>) {
        self.lock().offers.push((product_id, rate, expires_at));
    }

    pub fn fail_next_order_create(&self) {
        self.lock().fail_order_create = true;
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn transaction(&self, code: &str) -> Option<Transaction> {
        self.lock().transactions.get(code).cloned()
    }

    /// Writes a raw quantity, bypassing the collapse rule.
    pub fn force_quantity(&self, cart_id: i64, quantity: i32) {
        if let Some(line) = self.lock().cart.get_mut(&cart_id) {
            line.quantity = quantity;
        }
    }

    fn collapse(s: &mut State, line: CartLine) -> CartUpdate {
        if line.quantity > 0 {
            return CartUpdate::Updated(line);
        }
        s.cart.remove(&line.id);
        CartUpdate::Removed(line.id)
    }

    fn line_mut<'a>(s: &'a mut State, user_id: i64, cart_id: i64) -> Result<&'a mut CartLine, DomainError> {
        s.cart
            .get_mut(&cart_id)
            .filter(|l| l.user_id == user_id)
            .ok_or(DomainError::NotFound("Cart line"))
    }
}

impl ProductRepository for FakeStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.get(&id).cloned())
    }
}

impl OfferRepository for FakeStore {
    fn find_offer_rate(&self, product_id: i64, at: DateTime<Utc>) -> Result<i32, DomainError> {
        Ok(self
            .lock()
            .offers
            .iter()
            .rev()
            .find(|(p, _, expires)| *p == product_id && *expires > at)
            .map(|(_, rate, _)| *rate)
            .unwrap_or(0))
    }
}

impl CartRepository for FakeStore {
    fn check_if_item_is_already_added(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<i64>, DomainError> {
        Ok(self
            .lock()
            .cart
            .values()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .map(|l| l.id))
    }

    fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CartLine, DomainError> {
        let mut s = self.lock();
        if let Some(line) = s
            .cart
            .values_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            line.quantity += quantity;
            return Ok(line.clone());
        }
        let id = s.id();
        let line = CartLine {
            id,
            user_id,
            product_id,
            quantity,
        };
        s.cart.insert(id, line.clone());
        Ok(line)
    }

    fn update_quantity_add(&self, user_id: i64, cart_id: i64, delta: i32) -> Result<CartLine, DomainError> {
        let mut s = self.lock();
        let line = Self::line_mut(&mut s, user_id, cart_id)?;
        line.quantity += delta;
        Ok(line.clone())
    }

    fn update_quantity_less(&self, user_id: i64, cart_id: i64, delta: i32) -> Result<CartUpdate, DomainError> {
        let mut s = self.lock();
        let line = Self::line_mut(&mut s, user_id, cart_id)?;
        line.quantity -= delta;
        let line = line.clone();
        Ok(Self::collapse(&mut s, line))
    }

    fn update_quantity(&self, user_id: i64, cart_id: i64, quantity: i32) -> Result<CartUpdate, DomainError> {
        let mut s = self.lock();
        let line = Self::line_mut(&mut s, user_id, cart_id)?;
        line.quantity = quantity;
        let line = line.clone();
        Ok(Self::collapse(&mut s, line))
    }

    fn remove_from_cart(&self, user_id: i64, cart_id: i64) -> Result<(), DomainError> {
        let mut s = self.lock();
        if s.cart.get(&cart_id).is_some_and(|l| l.user_id == user_id) {
            s.cart.remove(&cart_id);
        }
        Ok(())
    }

    fn get_cart(&self, user_id: i64, cart_ids: Option<&[i64]>) -> Result<Vec<CartLineView>, DomainError> {
        let s = self.lock();
        Ok(s.cart
            .values()
            .filter(|l| l.user_id == user_id && l.quantity > 0)
            .filter(|l| cart_ids.map_or(true, |ids| ids.contains(&l.id)))
            .filter_map(|l| {
                s.products.get(&l.product_id).map(|p| CartLineView {
                    id: l.id,
                    user_id: l.user_id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    product_name: p.name.clone(),
                    product_image: p.image.clone(),
                    unit_price: p.price,
                })
            })
            .collect())
    }
}

impl OrderRepository for FakeStore {
    fn create(
        &self,
        order: NewOrder,
        items: Vec<OrderItemInput>,
        clear_cart_ids: &[i64],
    ) -> Result<OrderView, DomainError> {
        let mut s = self.lock();
        if std::mem::take(&mut s.fail_order_create) {
            return Err(DomainError::Internal("connection reset".to_string()));
        }
        let id = s.id();
        let items = items
            .into_iter()
            .map(|i| OrderItemView {
                id: s.id(),
                product_id: i.product_id,
                quantity: i.quantity,
                item_price: i.item_price,
                item_discounted_price: i.item_discounted_price,
            })
            .collect();
        let view = OrderView {
            id,
            user_id: order.user_id,
            address: order.address,
            payment_method: order.payment_method,
            final_price: order.final_price,
            coupon: order.coupon,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
            items,
        };
        for cart_id in clear_cart_ids {
            if s.cart.get(cart_id).is_some_and(|l| l.user_id == order.user_id) {
                s.cart.remove(cart_id);
            }
        }
        s.orders.insert(id, view.clone());
        Ok(view)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    fn list_for_user(&self, user_id: i64, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let s = self.lock();
        let mine: Vec<OrderView> = s
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), DomainError> {
        let mut s = self.lock();
        let order = s.orders.get_mut(&id).ok_or(DomainError::NotFound("Order"))?;
        order.order_status = status;
        Ok(())
    }

    fn reconcile_payment(&self, id: i64, transferred: i64) -> Result<PaymentSettlement, DomainError> {
        let mut s = self.lock();
        let order = s.orders.get_mut(&id).ok_or(DomainError::NotFound("Order"))?;
        let previous = order.payment_status;
        order.payment_status = previous.reconcile(order.final_price, transferred);
        Ok(PaymentSettlement {
            final_price: order.final_price,
            previous,
            current: order.payment_status,
        })
    }
}

impl TransactionRepository for FakeStore {
    fn create(&self, tx: NewTransaction) -> Result<Transaction, DomainError> {
        let mut s = self.lock();
        if s.transactions.contains_key(&tx.code) {
            return Err(DomainError::Conflict(format!("code {} taken", tx.code)));
        }
        let created = Transaction {
            id: tx.id,
            code: tx.code.clone(),
            order_id: tx.order_id,
            user_id: tx.user_id,
            account_number: tx.account_number,
            bank_name: tx.bank_name,
            amount: tx.amount,
            report: None,
            created_at: Utc::now(),
        };
        s.transactions.insert(tx.code, created.clone());
        Ok(created)
    }

    fn record_report(&self, code: &str, report: &BankReport) -> Result<Transaction, DomainError> {
        let mut s = self.lock();
        let tx = s
            .transactions
            .get_mut(code)
            .ok_or(DomainError::NotFound("Transaction"))?;
        tx.report = Some(report.clone());
        Ok(tx.clone())
    }
}
