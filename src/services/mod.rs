pub mod api_client;
pub mod change_bus;
pub mod notification_dispatcher;
pub mod notification_sync;
pub mod offline_service;
pub mod poll_scheduler;
pub mod timers;

#[cfg(test)]
pub mod testing;

pub use api_client::*;
pub use change_bus::*;
pub use notification_dispatcher::*;
pub use notification_sync::*;
pub use offline_service::*;
pub use poll_scheduler::*;
pub use timers::*;
