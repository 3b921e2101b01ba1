// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod notification_state;
pub mod reactivity;
pub mod session_state;
pub mod toast_state;

pub use notification_state::*;
pub use reactivity::*;
pub use session_state::*;
pub use toast_state::*;
