// ============================================================================
// TOAST STATE - Canal de mensajes efímeros
// ============================================================================
// Cola FIFO de toasts independiente de la lista de notificaciones.
// Cada toast con duración > 0 tiene su propio temporizador; dismiss manual
// cancela el temporizador al soltar su guard.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::ToastConfig;
use crate::models::{Toast, ToastKind};
use crate::services::timers::{TimerGuard, Timers};
use crate::state::reactivity::{ReactiveState, Subscription};

struct ToastInner {
    toasts: ReactiveState<Vec<Toast>>,
    timers: Rc<dyn Timers>,
    guards: RefCell<HashMap<u64, TimerGuard>>,
    next_id: Cell<u64>,
    config: ToastConfig,
}

impl ToastInner {
    fn remove(&self, id: u64) -> bool {
        // El guard se suelta fuera del borrow del mapa
        let guard = self.guards.borrow_mut().remove(&id);
        drop(guard);

        let exists = self.toasts.with(|list| list.iter().any(|t| t.id == id));
        if exists {
            self.toasts.update(|list| list.retain(|t| t.id != id));
        }
        exists
    }
}

#[derive(Clone)]
pub struct ToastChannel {
    inner: Rc<ToastInner>,
}

impl ToastChannel {
    pub fn new(timers: Rc<dyn Timers>, config: ToastConfig) -> Self {
        Self {
            inner: Rc::new(ToastInner {
                toasts: ReactiveState::new(Vec::new()),
                timers,
                guards: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
                config,
            }),
        }
    }

    /// Publica un toast. `duration_ms`: `None` → duración por defecto del
    /// tipo; `Some(0)` → fijo hasta dismiss.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind, duration_ms: Option<u32>) -> u64 {
        let inner = &self.inner;
        let id = inner.next_id.get();
        inner.next_id.set(id + 1);

        let duration_ms = duration_ms.unwrap_or_else(|| kind.default_duration_ms(&inner.config));
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration_ms,
        };
        log::debug!("🍞 [TOAST] #{} {:?} ({} ms)", id, kind, duration_ms);

        if !toast.is_sticky() {
            let weak: Weak<ToastInner> = Rc::downgrade(inner);
            let guard = inner.timers.timeout(
                duration_ms,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.remove(id);
                    }
                }),
            );
            inner.guards.borrow_mut().insert(id, guard);
        }

        inner.toasts.update(|list| list.push(toast));
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Error, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Warning, None)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Info, None)
    }

    /// Id desconocido (o ya expirado) → no hace nada
    pub fn dismiss(&self, id: u64) {
        if self.inner.remove(id) {
            log::debug!("🍞 [TOAST] #{} cerrado", id);
        }
    }

    /// Toasts visibles en orden de llegada
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.snapshot()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.inner.toasts.subscribe(callback)
    }
}
