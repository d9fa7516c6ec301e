pub mod calculator;
pub mod eta;
pub mod notification;
pub mod rate;

pub use calculator::{EtaCalculator, EtaEstimate};
pub use eta::EtaService;
pub use notification::{create_dispatcher, EmailNotifier, NoopNotifier, NotificationDispatcher};
pub use rate::ServiceRateEstimator;
