// ============================================================================
// REACTIVITY - Sistema de notificaciones/subscribers para reactividad
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Listener<E> = Rc<dyn Fn(&E)>;

/// Handle de una suscripción: al hacer drop se da de baja el listener
#[must_use = "al soltar la Subscription el listener se elimina"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Suscripción sin nada que cancelar (p.ej. la plataforma no expone el evento)
    pub fn detached() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Suscripciones que se sustituyen en bloque, p.ej. los listeners de un
/// render: al soltar lo que devuelve `take` se cancelan todas.
#[derive(Default)]
pub struct SubscriptionBag {
    subscriptions: RefCell<Vec<Subscription>>,
}

impl SubscriptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    pub fn take(&self) -> Vec<Subscription> {
        std::mem::take(&mut *self.subscriptions.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ListenerInner<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<E>)>>,
}

/// Lista de listeners compartida (clonar comparte la misma lista)
pub struct ListenerSet<E> {
    inner: Rc<ListenerInner<E>>,
}

impl<E: 'static> ListenerSet<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ListenerInner {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));

        let weak: Weak<ListenerInner<E>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Llama a todos los listeners. Se trabaja sobre una copia de la lista para
    /// que un listener pueda suscribirse o darse de baja durante el emit.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ListenerSet<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Estado reactivo con sistema de notificaciones
pub struct ReactiveState<T> {
    value: Rc<RefCell<T>>,
    subscribers: ListenerSet<()>,
}

impl<T> ReactiveState<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: ListenerSet::new(),
        }
    }

    /// Lectura sin clonar. No llamar a `set`/`update` desde el closure.
    pub fn with<R>(&self, reader: impl FnOnce(&T) -> R) -> R {
        reader(&self.value.borrow())
    }

    /// Establecer nuevo valor y notificar subscribers
    pub fn set(&self, new_value: T) {
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    /// Actualizar valor usando closure y notificar
    pub fn update<R>(&self, updater: impl FnOnce(&mut T) -> R) -> R {
        let result = updater(&mut self.value.borrow_mut());
        self.notify();
        result
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.subscribers.add(move |_| callback())
    }

    fn notify(&self) {
        self.subscribers.emit(&());
    }
}

impl<T: Clone> ReactiveState<T> {
    pub fn snapshot(&self) -> T {
        self.value.borrow().clone()
    }
}

// Los clones comparten valor y subscribers: todas las vistas ven el mismo estado
impl<T> Clone for ReactiveState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_notifies_every_clone() {
        let state = ReactiveState::new(0u32);
        let other = state.clone();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let _sub = state.subscribe(move || h.set(h.get() + 1));

        other.update(|v| *v += 5);
        assert_eq!(state.snapshot(), 5);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let state = ReactiveState::new(());
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let sub = state.subscribe(move || h.set(h.get() + 1));
        state.set(());
        drop(sub);
        state.set(());

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_can_read_state_during_notify() {
        let state = ReactiveState::new(vec![1, 2, 3]);
        let seen = Rc::new(Cell::new(0usize));

        let reader = state.clone();
        let s = seen.clone();
        let _sub = state.subscribe(move || s.set(reader.with(|v| v.len())));

        state.update(|v| v.push(4));
        assert_eq!(seen.get(), 4);
    }

    #[test]
    fn test_replacing_bag_contents_cancels_previous_round() {
        let bag = SubscriptionBag::new();
        let cancelled = Rc::new(Cell::new(0));

        let mut held: Vec<Subscription> = Vec::new();
        for round in 0..3 {
            for _ in 0..50 {
                let c = cancelled.clone();
                bag.push(Subscription::new(move || c.set(c.get() + 1)));
            }
            // El render nuevo sustituye al anterior
            drop(std::mem::replace(&mut held, bag.take()));
            assert!(bag.is_empty());
            assert_eq!(cancelled.get(), round * 50);
        }

        assert_eq!(held.len(), 50);
        drop(held);
        assert_eq!(cancelled.get(), 150);
    }
}
