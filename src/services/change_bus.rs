// ============================================================================
// CHANGE BUS - Propagación de cambios entre vistas y pestañas
// ============================================================================
// Puerto genérico `ChangeSignal` con tres implementaciones:
// - LocalBus: broadcast en proceso (misma pestaña)
// - StorageEventBus: evento `storage` del navegador (otras pestañas)
// - MemoryStorage (utils::storage): pestañas simuladas en memoria
// Todos los disparadores acaban en la cola de recargas (`ReloadReason`).
// ============================================================================

use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::Notification;
use crate::state::reactivity::{ListenerSet, Subscription};

#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// Una ruta de creación local acaba de crear esta notificación
    Created(Notification),
    /// Cambió el valor persistido (`None` = storage vaciado por completo)
    StorageChanged { key: Option<String> },
}

pub trait ChangeSignal {
    fn subscribe(&self, listener: Rc<dyn Fn(&ChangeEvent)>) -> Subscription;
}

/// Broadcast en proceso. Clonar comparte los mismos listeners.
#[derive(Clone, Default)]
pub struct LocalBus {
    listeners: ListenerSet<ChangeEvent>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announce(&self, event: ChangeEvent) {
        log::debug!("📣 [BUS] {:?} → {} listeners", event_name(&event), self.listeners.len());
        self.listeners.emit(&event);
    }
}

impl ChangeSignal for LocalBus {
    fn subscribe(&self, listener: Rc<dyn Fn(&ChangeEvent)>) -> Subscription {
        self.listeners.add(move |event: &ChangeEvent| listener(event))
    }
}

fn event_name(event: &ChangeEvent) -> &'static str {
    match event {
        ChangeEvent::Created(_) => "Created",
        ChangeEvent::StorageChanged { .. } => "StorageChanged",
    }
}

/// Motivo por el que una vista debe recargar su store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadReason {
    Created,
    StorageChanged,
    Poll,
    Manual,
}

impl From<&ChangeEvent> for ReloadReason {
    fn from(event: &ChangeEvent) -> Self {
        match event {
            ChangeEvent::Created(_) => ReloadReason::Created,
            ChangeEvent::StorageChanged { .. } => ReloadReason::StorageChanged,
        }
    }
}

pub type ReloadSender = UnboundedSender<ReloadReason>;
pub type ReloadReceiver = UnboundedReceiver<ReloadReason>;

pub fn reload_channel() -> (ReloadSender, ReloadReceiver) {
    mpsc::unbounded()
}

/// Encola una recarga; si el receptor ya no existe la vista fue destruida
pub fn request_reload(sender: &ReloadSender, reason: ReloadReason) {
    if sender.unbounded_send(reason).is_err() {
        log::debug!("🔌 [BUS] Recarga {:?} descartada: vista cerrada", reason);
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::StorageEventBus;

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{window, StorageEvent};

    use super::{ChangeEvent, ChangeSignal};
    use crate::state::reactivity::Subscription;
    use crate::utils::storage::ScopedKey;

    /// Escucha el evento `storage` de `window` filtrado por la clave actual
    /// del store degradado. El navegador solo lo dispara en las *otras* pestañas.
    pub struct StorageEventBus {
        key: ScopedKey,
    }

    impl StorageEventBus {
        pub fn new(key: ScopedKey) -> Self {
            Self { key }
        }
    }

    impl ChangeSignal for StorageEventBus {
        fn subscribe(&self, listener: Rc<dyn Fn(&ChangeEvent)>) -> Subscription {
            let Some(win) = window() else {
                log::warn!("⚠️ [BUS] Sin window: no hay propagación entre pestañas");
                return Subscription::detached();
            };

            let watched = self.key.clone();
            let closure = Closure::wrap(Box::new(move |event: StorageEvent| {
                let key = event.key();
                // key == null → localStorage.clear() en otra pestaña
                if key.as_deref().map_or(true, |k| watched.matches(k)) {
                    listener(&ChangeEvent::StorageChanged { key });
                }
            }) as Box<dyn FnMut(StorageEvent)>);

            if win
                .add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
                .is_err()
            {
                log::warn!("⚠️ [BUS] No se pudo registrar el listener de storage");
                return Subscription::detached();
            }

            // El closure vive dentro de la Subscription y se libera al quitar el listener
            Subscription::new(move || {
                match win.remove_event_listener_with_callback("storage", closure.as_ref().unchecked_ref()) {
                    Ok(()) => log::debug!("🔌 [BUS] Listener de storage eliminado"),
                    Err(e) => log::warn!("⚠️ [BUS] No se pudo quitar el listener de storage: {:?}", e),
                }
            })
        }
    }
}
