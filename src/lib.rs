// ============================================================================
// HELPDESK NOTIFICATIONS - NOTIFICATION CENTER + TOASTS (RUST PURO + WASM)
// ============================================================================
// Arquitectura MVVM:
// - Views: Funciones que renderizan DOM (sin lógica)
// - ViewModels: Estado de la vista + comandos
// - Services: Comunicación remota, persistencia degradada, bus, polling
// - State: State Management con Rc<RefCell>
// - Models: Estructuras compartidas con backend
// Todo lo que toca el navegador compila solo para wasm32; el resto se prueba
// en nativo.
// ============================================================================

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod views;

#[cfg(target_arch = "wasm32")]
pub use browser_entry::*;

#[cfg(target_arch = "wasm32")]
mod browser_entry {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;

    use crate::app::App;
    use crate::config::{PollInterval, CONFIG};
    use crate::models::{NewNotification, NotificationKind, ToastKind};

    // Variable estática global para mantener la instancia de App
    thread_local! {
        static APP: RefCell<Option<App>> = RefCell::new(None);
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        // Inicializar panic hook para mejor debugging
        console_error_panic_hook::set_once();

        let level = if CONFIG.is_logging_enabled() {
            log::Level::Debug
        } else {
            log::Level::Warn
        };
        wasm_logger::init(wasm_logger::Config::new(level));
        log::info!("🚀 Helpdesk Notifications - Rust Puro + MVVM ({})", CONFIG.environment);

        let app = App::new()?;
        app.render()?;

        APP.with(|app_cell| {
            *app_cell.borrow_mut() = Some(app);
        });
        Ok(())
    }

    fn with_app<R>(f: impl FnOnce(&App) -> R) -> Option<R> {
        APP.with(|app_cell| match app_cell.borrow().as_ref() {
            Some(app) => Some(f(app)),
            None => {
                log::warn!("⚠️ [APP] App no está inicializada");
                None
            }
        })
    }

    /// Re-render completo de panel y toasts
    pub fn rerender_app() {
        with_app(|app| {
            if let Err(e) = app.render() {
                log::error!("❌ [RERENDER] Error re-renderizando: {:?}", e);
            }
        });
    }

    /// Login / refresco de token desde el colaborador de autenticación.
    /// `null` o vacío = logout (el polling se detiene y el panel se vacía).
    /// `user_id` acota la lista local de modo degradado a ese usuario.
    #[wasm_bindgen]
    pub fn set_session_token(token: Option<String>, user_id: Option<String>) {
        with_app(|app| app.session().set_session(token, user_id));
    }

    #[wasm_bindgen]
    pub fn set_poll_interval(millis: u32) -> Result<(), JsValue> {
        let interval = PollInterval::from_millis(millis).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_app(|app| app.set_poll_interval(interval));
        Ok(())
    }

    #[wasm_bindgen]
    pub fn refresh_notifications() {
        with_app(App::refresh);
    }

    /// Creación genérica: `kind` en cualquier notación ("sla_alert", "slaAlert"...)
    #[wasm_bindgen]
    pub fn notify(title: String, message: String, kind: String, ticket_id: Option<String>, link: Option<String>) {
        let kind = NotificationKind::parse(&kind).unwrap_or(NotificationKind::Info);
        let new = NewNotification {
            title,
            message,
            kind,
            ticket_id,
            link,
        };
        with_app(|app| app.notify(new));
    }

    #[wasm_bindgen]
    pub fn notify_ticket_assigned(ticket_id: String, ticket_title: String, assignee: String) {
        with_app(|app| {
            let dispatcher = app.dispatcher();
            wasm_bindgen_futures::spawn_local(async move {
                dispatcher.ticket_assigned(&ticket_id, &ticket_title, &assignee).await;
            });
        });
    }

    #[wasm_bindgen]
    pub fn notify_ticket_resolved(ticket_id: String, ticket_title: String) {
        with_app(|app| {
            let dispatcher = app.dispatcher();
            wasm_bindgen_futures::spawn_local(async move {
                dispatcher.ticket_resolved(&ticket_id, &ticket_title).await;
            });
        });
    }

    #[wasm_bindgen]
    pub fn notify_approval_requested(ticket_id: String, requester: String) {
        with_app(|app| {
            let dispatcher = app.dispatcher();
            wasm_bindgen_futures::spawn_local(async move {
                dispatcher.approval_requested(&ticket_id, &requester).await;
            });
        });
    }

    #[wasm_bindgen]
    pub fn notify_sla_alert(ticket_id: String, remaining: String) {
        with_app(|app| {
            let dispatcher = app.dispatcher();
            wasm_bindgen_futures::spawn_local(async move {
                dispatcher.sla_alert(&ticket_id, &remaining).await;
            });
        });
    }

    #[wasm_bindgen]
    pub fn toast_success(message: String) {
        with_app(|app| app.toasts().success(message));
    }

    #[wasm_bindgen]
    pub fn toast_error(message: String) {
        with_app(|app| app.toasts().error(message));
    }

    #[wasm_bindgen]
    pub fn toast_warning(message: String) {
        with_app(|app| app.toasts().warning(message));
    }

    #[wasm_bindgen]
    pub fn toast_info(message: String) {
        with_app(|app| app.toasts().info(message));
    }

    /// `duration_ms = 0` → el toast queda fijo hasta que el usuario lo cierre
    #[wasm_bindgen]
    pub fn toast_sticky(message: String, kind: String) {
        let kind = ToastKind::parse(&kind).unwrap_or(ToastKind::Info);
        with_app(|app| app.toasts().show(message, kind, Some(0)));
    }
}
