pub mod lifecycle;
pub mod worker;

pub use lifecycle::{Advance, LifecycleSettings, TicketLifecycle};
pub use worker::{TickReport, TicketScheduler};
