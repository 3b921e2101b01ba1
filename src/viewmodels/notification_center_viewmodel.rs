// ============================================================================
// NOTIFICATION CENTER VIEWMODEL - Lógica del panel de notificaciones
// ============================================================================
// SIN DOM: la vista solo lee `visible()` / `unread_badge()` y llama a los
// comandos. Las recargas (creación local, evento storage, polling, manual)
// llegan por una única cola y se agrupan en un solo `load()`.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;

use crate::models::Notification;
use crate::services::api_client::NotificationTransport;
use crate::services::change_bus::{
    reload_channel, request_reload, ChangeEvent, ChangeSignal, ReloadReason, ReloadReceiver,
    ReloadSender,
};
use crate::state::notification_state::{MutationOutcome, NotificationStore};
use crate::state::reactivity::{ReactiveState, Subscription};
use crate::state::session_state::SessionCredential;
use crate::utils::constants::UNREAD_BADGE_CAP;

/// Modo de la lista: filtro puro, sin efectos
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    UnreadOnly,
}

pub struct NotificationCenter<T> {
    store: NotificationStore<T>,
    filter: ReactiveState<FilterMode>,
    reloads: ReloadSender,
    // Se saca de aquí cuando arranca `run()`
    receiver: RefCell<Option<ReloadReceiver>>,
    _signals: Vec<Subscription>,
}

impl<T: NotificationTransport + 'static> NotificationCenter<T> {
    /// `local` avisa de creaciones en esta pestaña; `cross_tab` de cambios
    /// en la persistencia hechos por otras pestañas.
    pub fn new(store: NotificationStore<T>, local: &dyn ChangeSignal, cross_tab: &dyn ChangeSignal) -> Self {
        let (reloads, receiver) = reload_channel();

        let on_local = {
            let store = store.clone();
            let reloads = reloads.clone();
            local.subscribe(Rc::new(move |event: &ChangeEvent| {
                // Visible ya, aunque la persistencia falle o la recarga tarde
                if let ChangeEvent::Created(n) = event {
                    store.upsert(n.clone());
                }
                request_reload(&reloads, ReloadReason::from(event));
            }))
        };

        let on_cross_tab = {
            let reloads = reloads.clone();
            cross_tab.subscribe(Rc::new(move |event: &ChangeEvent| {
                request_reload(&reloads, ReloadReason::from(event));
            }))
        };

        Self {
            store,
            filter: ReactiveState::new(FilterMode::All),
            reloads,
            receiver: RefCell::new(Some(receiver)),
            _signals: vec![on_local, on_cross_tab],
        }
    }

    /// Para el polling y otros productores de recargas
    pub fn reload_sender(&self) -> ReloadSender {
        self.reloads.clone()
    }

    pub fn refresh(&self) {
        request_reload(&self.reloads, ReloadReason::Manual);
    }

    /// Vacía la cola pendiente y, si había algo, hace un único `load()`.
    /// Devuelve cuántas peticiones se agruparon.
    pub async fn process_pending(&self) -> usize {
        let reasons = {
            let mut slot = self.receiver.borrow_mut();
            match slot.as_mut() {
                Some(rx) => drain_ready(rx),
                None => {
                    log::warn!("⚠️ [CENTER] process_pending con run() activo, se ignora");
                    return 0;
                }
            }
        };

        if !reasons.is_empty() {
            log::debug!("🔄 [CENTER] Recarga por {:?}", reasons);
            self.store.load().await;
        }
        reasons.len()
    }

    /// Bucle de recargas del navegador: espera la siguiente petición, agrupa
    /// las que ya estén en cola y recarga. Termina cuando se cierran todos
    /// los emisores.
    pub async fn run(&self) {
        let Some(mut rx) = self.receiver.borrow_mut().take() else {
            log::warn!("⚠️ [CENTER] run() ya estaba en marcha");
            return;
        };

        while let Some(first) = rx.next().await {
            let mut reasons = vec![first];
            reasons.extend(drain_ready(&mut rx));
            log::debug!("🔄 [CENTER] Recarga por {:?}", reasons);
            self.store.load().await;
        }
        log::info!("🔌 [CENTER] Cola de recargas cerrada");
    }

    /// Login, logout o cambio de usuario: la lista de la sesión anterior no
    /// se muestra nunca a la siguiente. Con sesión, recarga.
    pub fn switch_session(&self, credential: Option<&SessionCredential>) {
        self.store.switch_session(credential);
        if credential.is_some() {
            self.refresh();
        }
    }

    /// Click en una fila: marca como leída (si no lo estaba) y devuelve el
    /// destino de navegación, si lo tiene.
    pub async fn open(&self, id: &str) -> Option<String> {
        let notification = self.store.get(id)?;
        if !notification.read {
            self.store.mark_read(id).await;
        }
        let route = notification.route();
        if let Some(route) = &route {
            log::info!("🧭 [CENTER] Navegando a {}", route);
        }
        route
    }

    pub async fn delete(&self, id: &str) -> MutationOutcome {
        self.store.remove(id).await
    }

    pub async fn mark_all_read(&self) -> MutationOutcome {
        self.store.mark_all_read().await
    }

    pub async fn clear_all(&self) -> MutationOutcome {
        self.store.clear_all().await
    }
}

impl<T> NotificationCenter<T> {
    pub fn store(&self) -> &NotificationStore<T> {
        &self.store
    }

    pub fn filter(&self) -> FilterMode {
        self.filter.snapshot()
    }

    pub fn set_filter(&self, mode: FilterMode) {
        if self.filter() != mode {
            self.filter.set(mode);
        }
    }

    /// Lista a renderizar: más reciente primero, filtrada según el modo
    pub fn visible(&self) -> Vec<Notification> {
        let mode = self.filter();
        self.store
            .sorted()
            .into_iter()
            .filter(|n| mode == FilterMode::All || !n.read)
            .collect()
    }

    /// Texto del badge: oculto a 0, `9+` por encima del tope
    pub fn unread_badge(&self) -> Option<String> {
        match self.store.unread_count() {
            0 => None,
            n if n > UNREAD_BADGE_CAP => Some(format!("{}+", UNREAD_BADGE_CAP)),
            n => Some(n.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Cambios en la lista o en el filtro
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Clone + 'static,
    {
        let on_store = self.store.subscribe(callback.clone());
        let on_filter = self.filter.subscribe(callback);
        Subscription::new(move || {
            drop(on_store);
            drop(on_filter);
        })
    }
}

fn drain_ready(rx: &mut ReloadReceiver) -> Vec<ReloadReason> {
    let mut reasons = Vec::new();
    while let Ok(Some(reason)) = rx.try_next() {
        reasons.push(reason);
    }
    reasons
}
