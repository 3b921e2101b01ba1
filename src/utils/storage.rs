// ============================================================================
// STORAGE - Puerto clave/valor (localStorage en navegador, memoria en tests)
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;
use crate::services::change_bus::{ChangeEvent, ChangeSignal};
use crate::state::reactivity::{ListenerSet, Subscription};

/// Almacenamiento de strings por clave, compartido por todas las pestañas del origen
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

pub fn save_to_storage<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.set_item(key, &json)
}

/// `Ok(None)` si la clave no existe; JSON corrupto es un error de serialización
pub fn load_from_storage<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get_item(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

pub fn get_cache_key(base: &str, user_id: &str) -> String {
    format!("{}_{}", base, user_id)
}

/// Clave de la lista degradada, acotada al usuario de la sesión. Los clones
/// comparten el ámbito actual (persistencia, bus de storage, dispatcher).
#[derive(Clone, Debug)]
pub struct ScopedKey {
    base: Rc<str>,
    current: Rc<RefCell<String>>,
}

impl ScopedKey {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            current: Rc::new(RefCell::new(base.clone())),
            base: Rc::from(base),
        }
    }

    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn matches(&self, key: &str) -> bool {
        *self.current.borrow() == key
    }

    /// Sin usuario → clave base. Devuelve si la clave cambió.
    pub fn scope_to(&self, user_id: Option<&str>) -> bool {
        let next = match user_id {
            Some(user) => get_cache_key(&self.base, user),
            None => self.base.to_string(),
        };
        if self.matches(&next) {
            return false;
        }
        log::debug!("🔑 [STORAGE] Clave degradada: {}", next);
        *self.current.borrow_mut() = next;
        true
    }
}

impl From<&str> for ScopedKey {
    fn from(base: &str) -> Self {
        Self::new(base)
    }
}

impl From<String> for ScopedKey {
    fn from(base: String) -> Self {
        Self::new(base)
    }
}

struct StorageWrite {
    origin_tab: u64,
    key: String,
}

struct MemoryBacking {
    items: RefCell<HashMap<String, String>>,
    writes: ListenerSet<StorageWrite>,
    next_tab: Cell<u64>,
    unavailable: Cell<bool>,
}

/// Storage en memoria con semántica de pestañas: varios handles (`open_tab`)
/// comparten los datos y cada escritura avisa solo a las *otras* pestañas,
/// igual que el evento `storage` del navegador.
#[derive(Clone)]
pub struct MemoryStorage {
    backing: Rc<MemoryBacking>,
    tab_id: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            backing: Rc::new(MemoryBacking {
                items: RefCell::new(HashMap::new()),
                writes: ListenerSet::new(),
                next_tab: Cell::new(1),
                unavailable: Cell::new(false),
            }),
            tab_id: 0,
        }
    }

    /// Nuevo handle sobre los mismos datos, como otra pestaña del mismo origen
    pub fn open_tab(&self) -> Self {
        let tab_id = self.backing.next_tab.get();
        self.backing.next_tab.set(tab_id + 1);
        Self {
            backing: self.backing.clone(),
            tab_id,
        }
    }

    /// Simula storage deshabilitado / cuota agotada para todas las pestañas
    pub fn set_unavailable(&self, unavailable: bool) {
        self.backing.unavailable.set(unavailable);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.backing.unavailable.get() {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn announce_write(&self, key: &str) {
        self.backing.writes.emit(&StorageWrite {
            origin_tab: self.tab_id,
            key: key.to_string(),
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.backing.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let changed = {
            let mut items = self.backing.items.borrow_mut();
            items.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        };
        // El navegador no dispara `storage` si el valor no cambia
        if changed {
            self.announce_write(key);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let removed = self.backing.items.borrow_mut().remove(key).is_some();
        if removed {
            self.announce_write(key);
        }
        Ok(())
    }
}

impl ChangeSignal for MemoryStorage {
    fn subscribe(&self, listener: Rc<dyn Fn(&ChangeEvent)>) -> Subscription {
        let own_tab = self.tab_id;
        self.backing.writes.add(move |write: &StorageWrite| {
            if write.origin_tab != own_tab {
                listener(&ChangeEvent::StorageChanged {
                    key: Some(write.key.clone()),
                });
            }
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use web_sys::{window, Storage};

    use super::KeyValueStorage;
    use crate::error::StorageError;

    /// `window.localStorage`. Nunca hace panic: si no hay storage devuelve error.
    #[derive(Clone, Default)]
    pub struct BrowserStorage;

    impl BrowserStorage {
        fn local_storage(&self) -> Result<Storage, StorageError> {
            window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or(StorageError::Unavailable)
        }
    }

    impl KeyValueStorage for BrowserStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.local_storage()?
                .get_item(key)
                .map_err(|_| StorageError::Unavailable)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.local_storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Write(format!("{:?}", e)))
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.local_storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Write(format!("{:?}", e)))
        }
    }
}
