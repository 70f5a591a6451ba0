pub mod cart;
pub mod catalog;
pub mod errors;
pub mod order;
pub mod payment;
pub mod ports;
