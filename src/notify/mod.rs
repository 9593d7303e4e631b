//! SMS notification: result messages to parents and announcements.
//!
//! Messages are built from ranked reports by the SMS renderer, addressed with
//! normalized numbers and sent through an [`SmsGateway`]. Each message carries
//! an idempotency token; [`DispatchLog`] remembers delivered tokens so a
//! repeated run does not message anyone twice.

mod dispatch;
mod gateway;
mod log;
mod messages;
mod phone;

pub use dispatch::{DispatchSummary, Outgoing, dispatch};
pub use gateway::{
    AFRICASTALKING_URL, AfricasTalkingGateway, DeliveryReceipt, GatewayConfig, SmsGateway,
};
pub use log::{DispatchEntry, DispatchLog};
pub use messages::{Announcement, Audience, announcement_messages, result_messages, result_token};
pub use phone::normalize_number;
