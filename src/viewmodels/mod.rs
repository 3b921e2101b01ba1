pub mod notification_center_viewmodel;

pub use notification_center_viewmodel::{FilterMode, NotificationCenter};
