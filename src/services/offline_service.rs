// ============================================================================
// OFFLINE SERVICE - Persistencia local en modo degradado
// ============================================================================
// Lista de notificaciones guardada en localStorage (compartido por todas las
// pestañas del origen). Todas las escrituras son read-modify-write sobre la
// lista actual para no pisar lo que haya escrito otra pestaña. La lista se
// guarda de más nueva a más antigua y nunca supera la capacidad configurada.
// ============================================================================

use std::rc::Rc;

use chrono::Utc;

use crate::error::StorageError;
use crate::models::{NewNotification, Notification};
use crate::services::change_bus::{ChangeEvent, LocalBus};
use crate::utils::storage::{load_from_storage, save_to_storage, KeyValueStorage, ScopedKey};

#[derive(Clone)]
pub struct OfflineService {
    storage: Rc<dyn KeyValueStorage>,
    bus: LocalBus,
    key: ScopedKey,
    capacity: usize,
}

impl OfflineService {
    pub fn new(storage: Rc<dyn KeyValueStorage>, bus: LocalBus, key: impl Into<ScopedKey>, capacity: usize) -> Self {
        Self {
            storage,
            bus,
            key: key.into(),
            capacity: capacity.max(1),
        }
    }

    /// Pasa a la lista del usuario indicado. Devuelve si cambió de lista.
    pub fn scope_to(&self, user_id: Option<&str>) -> bool {
        self.key.scope_to(user_id)
    }

    /// Lista persistida. Sin lista previa → vacía; JSON corrupto → vacía (se
    /// reescribe en la siguiente escritura).
    pub fn load_all(&self) -> Result<Vec<Notification>, StorageError> {
        match load_from_storage::<Vec<Notification>>(self.storage.as_ref(), &self.key.current()) {
            Ok(list) => Ok(list.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                log::warn!("⚠️ [OFFLINE] Lista local corrupta, se reinicia: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Crea una notificación local: id local, no leída, `created_at = now`,
    /// al principio de la lista y recortada a la capacidad. Siempre devuelve la
    /// notificación aunque el storage falle, y siempre la anuncia en el bus.
    pub fn create_local(&self, new: NewNotification) -> Notification {
        let notification = new.into_local(Utc::now());
        let capacity = self.capacity;

        let inserted = notification.clone();
        match self.modify(move |list| {
            list.insert(0, inserted);
            list.truncate(capacity);
        }) {
            Ok(()) => log::info!("💾 [OFFLINE] Notificación local creada: {}", notification.id),
            Err(e) => log::warn!(
                "⚠️ [OFFLINE] No se pudo persistir {} (solo en memoria): {}",
                notification.id,
                e
            ),
        }

        self.bus.announce(ChangeEvent::Created(notification.clone()));
        notification
    }

    pub fn mark_read(&self, id: &str) -> Result<(), StorageError> {
        self.modify(|list| {
            if let Some(n) = list.iter_mut().find(|n| n.id == id) {
                n.read = true;
            }
        })
    }

    pub fn mark_all_read(&self) -> Result<(), StorageError> {
        self.modify(|list| list.iter_mut().for_each(|n| n.read = true))
    }

    pub fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.modify(|list| list.retain(|n| n.id != id))
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.modify(Vec::clear)
    }

    /// Read-modify-write. No escribe si la mutación no cambió nada, así no se
    /// dispara un evento `storage` inútil en las otras pestañas.
    fn modify<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Vec<Notification>),
    {
        let mut list = self.load_all()?;
        let before = list.clone();
        mutate(&mut list);
        list.truncate(self.capacity);

        if list == before {
            return Ok(());
        }
        save_to_storage(self.storage.as_ref(), &self.key.current(), &list)
    }
}
