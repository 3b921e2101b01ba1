// Dobles de test compartidos por los módulos del crate

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use chrono::Utc;
use futures::channel::oneshot;
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::models::Notification;
use crate::services::api_client::{Method, NotificationTransport};
use crate::services::notification_sync::normalize_notification;
use crate::services::timers::{TimerGuard, Timers};

#[derive(Default)]
struct FakeServer {
    notifications: RefCell<Vec<Notification>>,
    calls: RefCell<Vec<(Method, String)>>,
    offline: Cell<bool>,
    failing_paths: RefCell<HashSet<String>>,
    create_response: RefCell<Option<Value>>,
    next_id: Cell<u64>,
    // Peticiones retenidas hasta `Gate::release`, en orden de alta
    gates: RefCell<Vec<(Method, String, oneshot::Receiver<()>)>>,
}

/// Retiene la siguiente petición que coincida hasta que se suelta
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

/// Servidor de notificaciones en memoria detrás del puerto de transporte.
/// Los clones comparten el mismo servidor (varias pestañas, un backend).
#[derive(Clone, Default)]
pub struct FakeTransport {
    server: Rc<FakeServer>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifications(list: Vec<Notification>) -> Self {
        let transport = Self::new();
        *transport.server.notifications.borrow_mut() = list;
        transport
    }

    pub fn set_offline(&self, offline: bool) {
        self.server.offline.set(offline);
    }

    pub fn fail_path(&self, path: &str) {
        self.server.failing_paths.borrow_mut().insert(path.to_string());
    }

    /// La próxima petición `method path` espera a `Gate::release`; el
    /// resultado se calcula al soltarla (offline, lista del servidor...).
    pub fn hold(&self, method: Method, path: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.server.gates.borrow_mut().push((method, path.to_string(), rx));
        Gate(tx)
    }

    pub fn respond_to_create(&self, response: Value) {
        *self.server.create_response.borrow_mut() = Some(response);
    }

    /// Lo que otro actor (p.ej. un admin en otra sesión) crea en el servidor
    pub fn push_server_notification(&self, notification: Notification) {
        self.server.notifications.borrow_mut().push(notification);
    }

    pub fn server_notifications(&self) -> Vec<Notification> {
        self.server.notifications.borrow().clone()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.server.calls.borrow().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.server
            .calls
            .borrow()
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    fn handle(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SyncError> {
        let server = &self.server;
        let rest = path.strip_prefix("/api/notifications").unwrap_or(path);

        match (method, rest) {
            (Method::Get, "") => Ok(serde_json::to_value(&*server.notifications.borrow())
                .map_err(|e| SyncError::Malformed(e.to_string()))?),
            (Method::Patch, "/read-all") => {
                server.notifications.borrow_mut().iter_mut().for_each(|n| n.read = true);
                Ok(Value::Null)
            }
            (Method::Patch, rest) if rest.ends_with("/read") => {
                let id = rest.trim_start_matches('/').trim_end_matches("/read");
                if let Some(n) = server.notifications.borrow_mut().iter_mut().find(|n| n.id == id) {
                    n.read = true;
                }
                Ok(Value::Null)
            }
            (Method::Delete, "") => {
                server.notifications.borrow_mut().clear();
                Ok(Value::Null)
            }
            (Method::Delete, rest) => {
                let id = rest.trim_start_matches('/');
                server.notifications.borrow_mut().retain(|n| n.id != id);
                Ok(Value::Null)
            }
            (Method::Post, "") => {
                if let Some(response) = server.create_response.borrow_mut().take() {
                    return Ok(response);
                }
                let seq = server.next_id.get() + 1;
                server.next_id.set(seq);
                let mut record = body.cloned().unwrap_or_else(|| json!({}));
                if let Some(map) = record.as_object_mut() {
                    map.insert("id".to_string(), json!(format!("srv-{}", seq)));
                    map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
                }
                let created = normalize_notification(&record)
                    .ok_or_else(|| SyncError::Malformed("create sin campos".to_string()))?;
                server.notifications.borrow_mut().push(created.clone());
                serde_json::to_value(&created).map_err(|e| SyncError::Malformed(e.to_string()))
            }
            _ => Err(SyncError::Http {
                status: 404,
                body: format!("no route for {:?} {}", method, path),
            }),
        }
    }
}

impl NotificationTransport for FakeTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SyncError> {
        self.server.calls.borrow_mut().push((method, path.to_string()));

        let gate = {
            let mut gates = self.server.gates.borrow_mut();
            gates
                .iter()
                .position(|(m, p, _)| *m == method && p == path)
                .map(|i| gates.remove(i).2)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.server.offline.get() || self.server.failing_paths.borrow().contains(path) {
            return Err(SyncError::Network("connection refused".to_string()));
        }
        self.handle(method, path, body)
    }
}

enum ManualCallback {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>, u64),
}

struct ManualEntry {
    callback: ManualCallback,
    cancelled: Rc<Cell<bool>>,
}

#[derive(Default)]
struct ManualInner {
    now_ms: Cell<u64>,
    next_seq: Cell<u64>,
    // (vencimiento, secuencia) → entrada; la secuencia desempata en orden de alta
    entries: RefCell<BTreeMap<(u64, u64), ManualEntry>>,
}

struct CancelOnDrop(Rc<Cell<bool>>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Reloj virtual: los temporizadores solo avanzan con `advance`
#[derive(Clone, Default)]
pub struct ManualTimers {
    inner: Rc<ManualInner>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.now_ms.get()
    }

    /// Temporizadores vivos (no cancelados)
    pub fn pending(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .values()
            .filter(|e| !e.cancelled.get())
            .count()
    }

    /// Avanza el reloj disparando en orden todo lo que venza por el camino.
    /// Los callbacks se ejecutan sin ningún borrow activo, así que pueden
    /// crear o cancelar temporizadores.
    pub fn advance(&self, millis: u64) {
        let target = self.inner.now_ms.get() + millis;

        loop {
            let next = {
                let mut entries = self.inner.entries.borrow_mut();
                let due_key = entries.keys().next().copied().filter(|(due, _)| *due <= target);
                due_key.and_then(|key| entries.remove(&key).map(|entry| (key.0, entry)))
            };

            let Some((due, entry)) = next else {
                break;
            };
            self.inner.now_ms.set(due);

            if entry.cancelled.get() {
                continue;
            }

            match entry.callback {
                ManualCallback::Once(callback) => callback(),
                ManualCallback::Repeat(mut callback, period) => {
                    callback();
                    if !entry.cancelled.get() {
                        self.schedule(due + period, ManualCallback::Repeat(callback, period), entry.cancelled);
                    }
                }
            }
        }

        self.inner.now_ms.set(target);
    }

    fn schedule(&self, due: u64, callback: ManualCallback, cancelled: Rc<Cell<bool>>) {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        self.inner
            .entries
            .borrow_mut()
            .insert((due, seq), ManualEntry { callback, cancelled });
    }

    fn register(&self, millis: u32, callback: ManualCallback) -> TimerGuard {
        let cancelled = Rc::new(Cell::new(false));
        let due = self.inner.now_ms.get() + u64::from(millis);
        self.schedule(due, callback, cancelled.clone());
        TimerGuard::new(CancelOnDrop(cancelled))
    }
}

impl Timers for ManualTimers {
    fn timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> TimerGuard {
        self.register(millis, ManualCallback::Once(callback))
    }

    fn interval(&self, millis: u32, callback: Box<dyn FnMut()>) -> TimerGuard {
        // Un intervalo de 0 ms haría girar `advance` para siempre
        let period = u64::from(millis.max(1));
        self.register(millis.max(1), ManualCallback::Repeat(callback, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_fires_once_when_due() {
        let timers = ManualTimers::new();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let _guard = timers.timeout(100, Box::new(move || f.set(f.get() + 1)));

        timers.advance(99);
        assert_eq!(fired.get(), 0);
        timers.advance(1);
        assert_eq!(fired.get(), 1);
        timers.advance(1_000);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_interval_repeats_until_guard_dropped() {
        let timers = ManualTimers::new();
        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        let guard = timers.interval(1_000, Box::new(move || t.set(t.get() + 1)));

        timers.advance(3_500);
        assert_eq!(ticks.get(), 3);

        drop(guard);
        timers.advance(10_000);
        assert_eq!(ticks.get(), 3);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_callback_may_schedule_new_timer() {
        let timers = ManualTimers::new();
        let fired = Rc::new(Cell::new(false));
        let slot: Rc<RefCell<Option<TimerGuard>>> = Rc::new(RefCell::new(None));

        let (t, f, s) = (timers.clone(), fired.clone(), slot.clone());
        let _outer = timers.timeout(
            10,
            Box::new(move || {
                let f = f.clone();
                *s.borrow_mut() = Some(t.timeout(10, Box::new(move || f.set(true))));
            }),
        );

        timers.advance(15);
        assert!(!fired.get());
        timers.advance(5);
        assert!(fired.get());
        assert_eq!(timers.now_ms(), 20);
    }
}
