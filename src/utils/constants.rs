/// Endpoints del servicio remoto de notificaciones (relativos a `CONFIG.backend_url()`)
pub const NOTIFICATIONS_PATH: &str = "/api/notifications";
pub const NOTIFICATIONS_READ_ALL_PATH: &str = "/api/notifications/read-all";

/// Tope del badge de no leídas
pub const UNREAD_BADGE_CAP: usize = 9;

/// Ids de los contenedores del DOM
pub const NOTIFICATION_ROOT_ID: &str = "notification-center";
pub const TOAST_ROOT_ID: &str = "toast-root";
