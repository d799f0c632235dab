pub mod group_service;
pub mod notifier;

pub use group_service::{
    ApplyOutcome, FormOutcome, GroupDetail, GroupService, LeaveOutcome, RedeemOutcome,
};
pub use notifier::{LogNotifier, NoopNotifier, Notification, Notifier, WebhookNotifier};
