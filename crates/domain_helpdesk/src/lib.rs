//! Helpdesk Domain
//!
//! Customer support tickets (`helpdesk.ticket`), looked up by the tax id
//! of the customer that opened them.

pub mod model;
pub mod service;

pub use model::{Ticket, TicketFilter};
pub use service::HelpdeskService;
