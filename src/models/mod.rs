pub mod notification;
pub mod stats;
pub mod ticket;

pub use notification::{
    NotificationChannel, NotificationOutcome, NotificationRequest, NotificationStatus,
};
pub use stats::{current_time_window, time_window_for, EtaStats, PercentileSeed};
pub use ticket::{EtaResponse, TicketEta, TicketStatus};
