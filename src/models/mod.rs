pub mod notification;
pub mod toast;

pub use notification::{
    generate_local_id, sort_newest_first, KindPresentation, NewNotification, Notification,
    NotificationKind, LOCAL_ID_PREFIX,
};
pub use toast::{Toast, ToastKind};
