pub mod auth;
pub mod cart;
pub mod orders;
pub mod payments;

use crate::application::cart_service::CartService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::catalog_repo::{DieselOfferRepository, DieselProductRepository};
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::transaction_repo::DieselTransactionRepository;

pub type Carts = CartService<DieselCartRepository, DieselProductRepository, DieselOfferRepository>;
pub type Orders = OrderService<DieselCartRepository, DieselOfferRepository, DieselOrderRepository>;
pub type Payments = PaymentService<DieselOrderRepository, DieselTransactionRepository>;
