// ============================================================================
// APP - Cableado del Notification Center y los toasts en el navegador
// ============================================================================
// Construye los adaptadores reales (localStorage, evento storage, gloo-net,
// gloo-timers), los conecta a la lógica y re-renderiza en cada cambio.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;

use crate::config::{PollInterval, CONFIG};
use crate::dom::{ensure_root, navigate_to, replace_children, take_render_listeners};
use crate::models::{NewNotification, Notification};
use crate::services::api_client::HttpTransport;
use crate::services::change_bus::{LocalBus, StorageEventBus};
use crate::services::notification_dispatcher::NotificationDispatcher;
use crate::services::notification_sync::NotificationSync;
use crate::services::offline_service::OfflineService;
use crate::services::poll_scheduler::PollScheduler;
use crate::services::timers::{BrowserTimers, Timers};
use crate::state::notification_state::NotificationStore;
use crate::state::reactivity::Subscription;
use crate::state::session_state::SessionState;
use crate::state::toast_state::ToastChannel;
use crate::utils::constants::{NOTIFICATION_ROOT_ID, TOAST_ROOT_ID};
use crate::utils::storage::{BrowserStorage, KeyValueStorage, ScopedKey};
use crate::viewmodels::{FilterMode, NotificationCenter};
use crate::views::{render_notification_panel, render_toast_stack, PanelHandlers, PanelModel};

type Center = NotificationCenter<HttpTransport>;

/// Sesión + intervalo → scheduler. Se re-evalúa en cada cambio de cualquiera.
struct PollControl {
    session: SessionState,
    interval: Cell<PollInterval>,
    scheduler: RefCell<PollScheduler>,
}

impl PollControl {
    fn reconcile(&self) {
        let credential = self.session.credential();
        self.scheduler
            .borrow_mut()
            .reconcile(credential.as_ref(), self.interval.get());
    }

    fn set_interval(&self, interval: PollInterval) {
        self.interval.set(interval);
        self.reconcile();
    }
}

pub struct App {
    session: SessionState,
    center: Rc<Center>,
    dispatcher: NotificationDispatcher<HttpTransport>,
    toasts: ToastChannel,
    poll: Rc<PollControl>,
    panel_open: Rc<Cell<bool>>,
    notification_root: Element,
    toast_root: Element,
    // Listeners de clicks del último render; se sustituyen en cada render
    render_listeners: RefCell<Vec<Subscription>>,
    _subscriptions: Vec<Subscription>,
}

impl App {
    pub fn new() -> Result<Self, JsValue> {
        let notification_root = ensure_root(NOTIFICATION_ROOT_ID)?;
        let toast_root = ensure_root(TOAST_ROOT_ID)?;

        let storage_key = ScopedKey::new(CONFIG.storage_config.storage_key.clone());
        let session = SessionState::new();
        let local_bus = LocalBus::new();
        let storage: Rc<dyn KeyValueStorage> = Rc::new(BrowserStorage);
        let offline = OfflineService::new(
            storage,
            local_bus.clone(),
            storage_key.clone(),
            CONFIG.storage_config.local_capacity,
        );

        let remote = Rc::new(NotificationSync::new(HttpTransport::new(
            CONFIG.backend_url(),
            session.clone(),
        )));
        let store = NotificationStore::new(remote.clone(), offline.clone());
        let center = Rc::new(NotificationCenter::new(
            store,
            &local_bus,
            &StorageEventBus::new(storage_key),
        ));
        let dispatcher = NotificationDispatcher::new(remote, offline, local_bus);

        let timers: Rc<dyn Timers> = Rc::new(BrowserTimers);
        let toasts = ToastChannel::new(timers.clone(), CONFIG.toast_config.clone());
        let poll = Rc::new(PollControl {
            session: session.clone(),
            interval: Cell::new(CONFIG.poll_interval()),
            scheduler: RefCell::new(PollScheduler::new(timers, center.reload_sender())),
        });

        let on_session = {
            let poll = poll.clone();
            let center = center.clone();
            let session = session.clone();
            session.clone().subscribe(move || {
                poll.reconcile();
                center.switch_session(session.credential().as_ref());
            })
        };

        let subscriptions = vec![
            center.subscribe(schedule_rerender),
            toasts.subscribe(schedule_rerender),
            on_session,
        ];

        // Bucle de recargas: vive lo mismo que la app
        let runner = center.clone();
        spawn_local(async move { runner.run().await });

        log::info!("🚀 [APP] Notification Center listo (backend {})", CONFIG.backend_url());

        Ok(Self {
            session,
            center,
            dispatcher,
            toasts,
            poll,
            panel_open: Rc::new(Cell::new(false)),
            notification_root,
            toast_root,
            render_listeners: RefCell::new(Vec::new()),
            _subscriptions: subscriptions,
        })
    }

    pub fn render(&self) -> Result<(), JsValue> {
        let model = PanelModel {
            open: self.panel_open.get(),
            badge: self.center.unread_badge(),
            filter: self.center.filter(),
            loading: self.center.is_loading(),
            notifications: self.center.visible(),
            poll_interval: self.poll.interval.get(),
            now: chrono::Utc::now(),
        };
        let panel = render_notification_panel(&model, &self.panel_handlers())?;
        replace_children(&self.notification_root, &panel)?;

        let toasts = self.toasts.clone();
        let stack = render_toast_stack(&self.toasts.toasts(), Rc::new(move |id| toasts.dismiss(id)))?;
        replace_children(&self.toast_root, &stack)?;

        // Los nodos anteriores ya no están en el DOM: fuera sus listeners
        *self.render_listeners.borrow_mut() = take_render_listeners();
        Ok(())
    }

    fn panel_handlers(&self) -> PanelHandlers {
        let center = &self.center;

        let on_toggle = {
            let (open, center) = (self.panel_open.clone(), center.clone());
            Rc::new(move || {
                let now_open = !open.get();
                open.set(now_open);
                if now_open {
                    center.refresh();
                }
                schedule_rerender();
            }) as Rc<dyn Fn()>
        };

        let on_open = {
            let center = center.clone();
            Rc::new(move |id: String| {
                let center = center.clone();
                spawn_local(async move {
                    if let Some(route) = center.open(&id).await {
                        if let Err(e) = navigate_to(&route) {
                            log::warn!("⚠️ [APP] No se pudo navegar a {}: {:?}", route, e);
                        }
                    }
                });
            }) as Rc<dyn Fn(String)>
        };

        let on_delete = {
            let center = center.clone();
            Rc::new(move |id: String| {
                let center = center.clone();
                spawn_local(async move {
                    center.delete(&id).await;
                });
            }) as Rc<dyn Fn(String)>
        };

        let on_filter = {
            let center = center.clone();
            Rc::new(move |mode: FilterMode| center.set_filter(mode)) as Rc<dyn Fn(FilterMode)>
        };

        let on_mark_all_read = {
            let center = center.clone();
            Rc::new(move || {
                let center = center.clone();
                spawn_local(async move {
                    center.mark_all_read().await;
                });
            }) as Rc<dyn Fn()>
        };

        let on_clear_all = {
            let (center, toasts) = (center.clone(), self.toasts.clone());
            Rc::new(move || {
                let (center, toasts) = (center.clone(), toasts.clone());
                spawn_local(async move {
                    center.clear_all().await;
                    toasts.info("Notifications cleared");
                });
            }) as Rc<dyn Fn()>
        };

        let on_interval = {
            let poll = self.poll.clone();
            Rc::new(move |interval: PollInterval| {
                poll.set_interval(interval);
                schedule_rerender();
            }) as Rc<dyn Fn(PollInterval)>
        };

        PanelHandlers {
            on_toggle,
            on_open,
            on_delete,
            on_filter,
            on_mark_all_read,
            on_clear_all,
            on_interval,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn dispatcher(&self) -> NotificationDispatcher<HttpTransport> {
        self.dispatcher.clone()
    }

    pub fn toasts(&self) -> &ToastChannel {
        &self.toasts
    }

    pub fn set_poll_interval(&self, interval: PollInterval) {
        self.poll.set_interval(interval);
        schedule_rerender();
    }

    pub fn refresh(&self) {
        self.center.refresh();
    }

    /// Creación desde el ciclo de vida de tickets; no bloquea al llamador
    pub fn notify(&self, new: NewNotification) {
        let dispatcher = self.dispatcher.clone();
        spawn_local(async move {
            let created: Notification = dispatcher.notify(new).await;
            log::debug!("🔔 [APP] Notificación {} publicada", created.id);
        });
    }
}

/// Agrupa varios cambios seguidos en un solo render en el siguiente tick
fn schedule_rerender() {
    Timeout::new(0, crate::rerender_app).forget();
}
