pub mod notification_panel;
pub mod toast_stack;

pub use notification_panel::{render_notification_panel, PanelHandlers, PanelModel};
pub use toast_stack::render_toast_stack;
