//! Sales Domain
//!
//! Quotations and sales orders (`sale.order`): search by customer, state
//! and date, fetch one order, create a quotation with its lines and
//! confirm it.

pub mod model;
pub mod service;

pub use model::{NewOrder, NewOrderLine, OrderFilter, OrderState, SalesOrder};
pub use service::SalesService;
