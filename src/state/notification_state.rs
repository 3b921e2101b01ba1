// ============================================================================
// NOTIFICATION STATE - Store de notificaciones de la sesión
// ============================================================================
// Fuente única de la lista que se renderiza. Reglas:
// - load(): reemplazo completo (remoto, o si falla la lista degradada)
// - mutaciones: primero local (optimista), luego remoto; si el remoto falla
//   la mutación local se queda como verdad degradada, sin rollback
// - no leídas: siempre derivado de la lista, nunca un contador aparte
// ============================================================================

use std::cell::Cell;
use std::collections::HashSet;
use std::future::Future;
use std::rc::Rc;

use crate::error::{StorageError, SyncError};
use crate::models::{sort_newest_first, Notification};
use crate::services::api_client::NotificationTransport;
use crate::services::notification_sync::NotificationSync;
use crate::services::offline_service::OfflineService;
use crate::state::reactivity::{ReactiveState, Subscription};
use crate::state::session_state::SessionCredential;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationListState {
    pub items: Vec<Notification>,
    pub loading: bool,
}

/// Resultado visible para quien llama: nunca un error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Aplicada en local y confirmada por el servidor
    Synced,
    /// Aplicada en local; el servidor no estaba disponible
    Degraded,
    /// No había nada que cambiar
    Skipped,
}

#[derive(Clone, Copy, Debug)]
enum LocalMutation<'a> {
    MarkRead(&'a str),
    MarkAllRead,
    Remove(&'a str),
    ClearAll,
}

impl LocalMutation<'_> {
    fn apply(&self, items: &mut Vec<Notification>) {
        match self {
            LocalMutation::MarkRead(id) => {
                if let Some(n) = items.iter_mut().find(|n| n.id == *id) {
                    n.read = true;
                }
            }
            LocalMutation::MarkAllRead => items.iter_mut().for_each(|n| n.read = true),
            LocalMutation::Remove(id) => items.retain(|n| n.id != *id),
            LocalMutation::ClearAll => items.clear(),
        }
    }

    fn mirror(&self, offline: &OfflineService) -> Result<(), StorageError> {
        match self {
            LocalMutation::MarkRead(id) => offline.mark_read(id),
            LocalMutation::MarkAllRead => offline.mark_all_read(),
            LocalMutation::Remove(id) => offline.remove(id),
            LocalMutation::ClearAll => offline.clear_all(),
        }
    }
}

pub struct NotificationStore<T> {
    state: ReactiveState<NotificationListState>,
    remote: Rc<NotificationSync<T>>,
    offline: OfflineService,
    load_generation: Rc<Cell<u64>>,
}

impl<T> Clone for NotificationStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            remote: self.remote.clone(),
            offline: self.offline.clone(),
            load_generation: self.load_generation.clone(),
        }
    }
}

impl<T: NotificationTransport> NotificationStore<T> {
    pub fn new(remote: Rc<NotificationSync<T>>, offline: OfflineService) -> Self {
        Self {
            state: ReactiveState::new(NotificationListState::default()),
            remote,
            offline,
            load_generation: Rc::new(Cell::new(0)),
        }
    }

    /// Reemplaza la lista completa. Nunca falla ni deja `loading` colgado:
    /// remoto → lista degradada → (si también falla el storage) lista actual.
    /// Si arranca otro load mientras este espera, gana el más reciente.
    pub async fn load(&self) {
        let generation = self.load_generation.get() + 1;
        self.load_generation.set(generation);
        self.state.update(|s| s.loading = true);

        let next = match self.remote.fetch().await {
            Ok(list) => Some(list),
            Err(e) => {
                log::warn!("📴 [STORE] Servicio remoto no disponible, modo degradado: {}", e);
                match self.offline.load_all() {
                    Ok(list) => Some(list),
                    Err(storage_err) => {
                        log::warn!("⚠️ [STORE] Storage local no disponible, se mantiene la lista actual: {}", storage_err);
                        None
                    }
                }
            }
        };

        if generation != self.load_generation.get() {
            log::debug!("⏭️ [STORE] load #{} superado por uno más reciente", generation);
            return;
        }

        self.state.update(|s| {
            if let Some(list) = next {
                s.items = dedup_by_id(list);
            }
            s.loading = false;
        });
        log::debug!("📋 [STORE] {} notificaciones, {} sin leer", self.len(), self.unread_count());
    }

    /// Idempotente: si ya está leída (o no existe) no hay llamada remota
    pub async fn mark_read(&self, id: &str) -> MutationOutcome {
        let unread = self.state.with(|s| s.items.iter().any(|n| n.id == id && !n.read));
        if !unread {
            return MutationOutcome::Skipped;
        }
        self.apply_optimistic(LocalMutation::MarkRead(id), self.remote.set_read(id))
            .await
    }

    pub async fn mark_all_read(&self) -> MutationOutcome {
        self.apply_optimistic(LocalMutation::MarkAllRead, self.remote.set_all_read())
            .await
    }

    pub async fn remove(&self, id: &str) -> MutationOutcome {
        if self.get(id).is_none() {
            return MutationOutcome::Skipped;
        }
        self.apply_optimistic(LocalMutation::Remove(id), self.remote.delete(id))
            .await
    }

    pub async fn clear_all(&self) -> MutationOutcome {
        self.apply_optimistic(LocalMutation::ClearAll, self.remote.delete_all())
            .await
    }

    /// Aplicar en local y en la persistencia degradada, lanzar el remoto e
    /// ignorar su fallo. El espejo va antes del remoto: un `load()` que caiga
    /// a la lista degradada mientras el remoto está en vuelo ya la ve aplicada.
    async fn apply_optimistic<F>(&self, mutation: LocalMutation<'_>, remote: F) -> MutationOutcome
    where
        F: Future<Output = Result<(), SyncError>>,
    {
        self.state.update(|s| mutation.apply(&mut s.items));
        if let Err(e) = mutation.mirror(&self.offline) {
            log::warn!("⚠️ [STORE] No se pudo reflejar {:?} en storage local: {}", mutation, e);
        }

        match remote.await {
            Ok(()) => MutationOutcome::Synced,
            Err(e) => {
                log::warn!("📴 [STORE] {:?} solo aplicado en local: {}", mutation, e);
                MutationOutcome::Degraded
            }
        }
    }

    /// Cambio de sesión: la persistencia degradada pasa a la clave del nuevo
    /// usuario y, si cambió de usuario o se cerró sesión, la lista se vacía.
    pub fn switch_session(&self, credential: Option<&SessionCredential>) {
        let user = credential.and_then(|c| c.user_id.as_deref());
        let rescoped = self.offline.scope_to(user);
        if rescoped || credential.is_none() {
            self.reset();
        }
    }

    /// Inserta o reemplaza por id sin tocar remoto ni storage
    pub fn upsert(&self, notification: Notification) {
        self.state.update(|s| match s.items.iter_mut().find(|n| n.id == notification.id) {
            Some(existing) => *existing = notification,
            None => s.items.push(notification),
        });
    }
}

impl<T> NotificationStore<T> {
    /// Vacía la lista y descarta cualquier `load()` en vuelo
    pub fn reset(&self) {
        self.load_generation.set(self.load_generation.get() + 1);
        self.state.set(NotificationListState::default());
        log::info!("🧹 [STORE] Lista de notificaciones reiniciada");
    }

    pub fn items(&self) -> Vec<Notification> {
        self.state.with(|s| s.items.clone())
    }

    /// Lista para render: más reciente primero
    pub fn sorted(&self) -> Vec<Notification> {
        let mut items = self.items();
        sort_newest_first(&mut items);
        items
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state.with(|s| s.items.iter().find(|n| n.id == id).cloned())
    }

    pub fn unread_count(&self) -> usize {
        self.state.with(|s| s.items.iter().filter(|n| !n.read).count())
    }

    pub fn len(&self) -> usize {
        self.state.with(|s| s.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.loading)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.state.subscribe(callback)
    }
}

fn dedup_by_id(list: Vec<Notification>) -> Vec<Notification> {
    let mut seen = HashSet::with_capacity(list.len());
    list.into_iter().filter(|n| seen.insert(n.id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewNotification, NotificationKind};
    use crate::services::api_client::Method;
    use crate::services::change_bus::LocalBus;
    use crate::services::testing::FakeTransport;
    use crate::utils::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use proptest::prelude::*;
    use proptest::test_runner::Config;

    const LIST_PATH: &str = "/api/notifications";

    fn server_notification(id: &str, secs: i64, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: format!("title {}", id),
            message: "msg".to_string(),
            kind: NotificationKind::Info,
            read,
            created_at: Utc.timestamp_opt(secs, 0).single().expect("ts"),
            ticket_id: None,
            link: None,
        }
    }

    fn store_with(transport: &FakeTransport, storage: &MemoryStorage) -> NotificationStore<FakeTransport> {
        let offline = OfflineService::new(Rc::new(storage.clone()), LocalBus::new(), "notifications", 50);
        NotificationStore::new(Rc::new(NotificationSync::new(transport.clone())), offline)
    }

    #[test]
    fn test_load_replaces_whole_list_from_remote() {
        let transport = FakeTransport::with_notifications(vec![
            server_notification("1", 10, false),
            server_notification("2", 20, true),
        ]);
        let store = store_with(&transport, &MemoryStorage::new());
        store.upsert(server_notification("stale", 5, false));

        block_on(store.load());

        let ids: Vec<String> = store.sorted().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(store.unread_count(), 1);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_load_falls_back_to_degraded_list_when_fetch_fails() {
        let transport = FakeTransport::new();
        transport.set_offline(true);
        let storage = MemoryStorage::new();
        let store = store_with(&transport, &storage);
        let offline = OfflineService::new(Rc::new(storage.clone()), LocalBus::new(), "notifications", 50);
        let local = offline.create_local(NewNotification::new("local", "m", NotificationKind::Warning));

        block_on(store.load());

        assert_eq!(store.items(), vec![local]);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_load_keeps_current_list_when_remote_and_storage_fail() {
        let transport = FakeTransport::new();
        transport.set_offline(true);
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        let store = store_with(&transport, &storage);
        store.upsert(server_notification("kept", 1, false));

        block_on(store.load());

        assert_eq!(store.len(), 1);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let transport = FakeTransport::with_notifications(vec![
            server_notification("dup", 10, false),
            server_notification("dup", 11, true),
        ]);
        let store = store_with(&transport, &MemoryStorage::new());
        block_on(store.load());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let transport = FakeTransport::with_notifications(vec![server_notification("1", 10, false)]);
        let store = store_with(&transport, &MemoryStorage::new());
        block_on(store.load());

        assert_eq!(block_on(store.mark_read("1")), MutationOutcome::Synced);
        assert_eq!(block_on(store.mark_read("1")), MutationOutcome::Skipped);

        assert_eq!(store.get("1").map(|n| n.read), Some(true));
        assert_eq!(transport.count(Method::Patch, "/api/notifications/1/read"), 1);
    }

    #[test]
    fn test_remote_failure_keeps_optimistic_mutation_and_mirrors_locally() {
        let transport = FakeTransport::with_notifications(vec![
            server_notification("1", 10, false),
            server_notification("2", 20, false),
        ]);
        let storage = MemoryStorage::new();
        let store = store_with(&transport, &storage);
        block_on(store.load());

        transport.set_offline(true);
        assert_eq!(block_on(store.remove("2")), MutationOutcome::Degraded);
        assert_eq!(block_on(store.mark_read("1")), MutationOutcome::Degraded);

        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 0);
        // El servidor no se enteró; no hay reintento
        assert_eq!(transport.server_notifications().len(), 2);
    }

    #[test]
    fn test_bulk_operations() {
        let transport = FakeTransport::with_notifications(vec![
            server_notification("1", 10, false),
            server_notification("2", 20, false),
        ]);
        let store = store_with(&transport, &MemoryStorage::new());
        block_on(store.load());

        assert_eq!(block_on(store.mark_all_read()), MutationOutcome::Synced);
        assert_eq!(store.unread_count(), 0);
        assert!(transport.server_notifications().iter().all(|n| n.read));

        assert_eq!(block_on(store.clear_all()), MutationOutcome::Synced);
        assert!(store.is_empty());
        assert!(transport.server_notifications().is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_skipped() {
        let transport = FakeTransport::new();
        let store = store_with(&transport, &MemoryStorage::new());
        assert_eq!(block_on(store.remove("ghost")), MutationOutcome::Skipped);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_mutation_notifies_subscribers_before_remote_resolves() {
        let transport = FakeTransport::with_notifications(vec![server_notification("1", 10, false)]);
        let store = store_with(&transport, &MemoryStorage::new());
        block_on(store.load());

        let observed: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));
        let (o, reader) = (observed.clone(), store.clone());
        let _sub = store.subscribe(move || {
            if o.get().is_none() {
                o.set(Some(reader.unread_count()));
            }
        });

        let calls_before = transport.calls().len();
        block_on(store.mark_read("1"));
        // La primera notificación a subscribers ya tenía la lectura aplicada
        assert_eq!(observed.get(), Some(0));
        assert_eq!(transport.calls().len(), calls_before + 1);
    }

    #[test]
    fn test_degraded_load_during_mutation_keeps_optimistic_change() {
        let transport = FakeTransport::new();
        transport.set_offline(true);
        let storage = MemoryStorage::new();
        let store = store_with(&transport, &storage);
        let offline = OfflineService::new(Rc::new(storage.clone()), LocalBus::new(), "notifications", 50);
        let local = offline.create_local(NewNotification::new("local", "m", NotificationKind::Warning));
        block_on(store.load());
        assert_eq!(store.unread_count(), 1);

        let fetch = transport.hold(Method::Get, LIST_PATH);
        let patch = transport.hold(Method::Patch, &format!("{}/{}/read", LIST_PATH, local.id));

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let loader = store.clone();
        spawner.spawn_local(async move { loader.load().await }).expect("spawn load");
        let (reader, id) = (store.clone(), local.id.clone());
        spawner
            .spawn_local(async move {
                reader.mark_read(&id).await;
            })
            .expect("spawn mark_read");
        pool.run_until_stalled();
        assert_eq!(store.get(&local.id).map(|n| n.read), Some(true));

        // El GET falla y cae a la lista degradada mientras el PATCH sigue en vuelo
        fetch.release();
        pool.run_until_stalled();
        patch.release();
        pool.run_until_stalled();

        assert_eq!(store.get(&local.id).map(|n| n.read), Some(true));
        assert_eq!(store.unread_count(), 0);
        assert!(offline.load_all().expect("list").iter().all(|n| n.read));
    }

    #[test]
    fn test_newest_overlapping_load_wins() {
        let transport = FakeTransport::with_notifications(vec![server_notification("1", 10, false)]);
        let store = store_with(&transport, &MemoryStorage::new());
        let older = transport.hold(Method::Get, LIST_PATH);
        let newer = transport.hold(Method::Get, LIST_PATH);

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let first = store.clone();
        spawner.spawn_local(async move { first.load().await }).expect("spawn older");
        pool.run_until_stalled();
        let second = store.clone();
        spawner.spawn_local(async move { second.load().await }).expect("spawn newer");
        pool.run_until_stalled();
        assert!(store.is_loading());

        transport.push_server_notification(server_notification("2", 20, false));
        newer.release();
        pool.run_until_stalled();
        assert_eq!(store.len(), 2);
        assert!(!store.is_loading());

        // El más antiguo resuelve el último (y vacío, storage sin lista): se descarta
        transport.set_offline(true);
        older.release();
        pool.run_until_stalled();
        assert_eq!(store.len(), 2);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_reset_discards_in_flight_load() {
        let transport = FakeTransport::with_notifications(vec![server_notification("1", 10, false)]);
        let store = store_with(&transport, &MemoryStorage::new());
        let fetch = transport.hold(Method::Get, LIST_PATH);

        let mut pool = LocalPool::new();
        let loader = store.clone();
        pool.spawner()
            .spawn_local(async move { loader.load().await })
            .expect("spawn load");
        pool.run_until_stalled();

        store.reset();
        fetch.release();
        pool.run_until_stalled();

        assert!(store.is_empty());
        assert!(!store.is_loading());
    }

    #[test]
    fn test_switching_user_hides_previous_degraded_list() {
        let transport = FakeTransport::new();
        transport.set_offline(true);
        let storage = MemoryStorage::new();
        let store = store_with(&transport, &storage);
        let alice_offline = OfflineService::new(Rc::new(storage.clone()), LocalBus::new(), "notifications_alice", 50);
        let alice_local = alice_offline.create_local(NewNotification::new("for alice", "m", NotificationKind::Info));

        let alice = SessionCredential::new("tok-a", Some("alice"));
        let bob = SessionCredential::new("tok-b", Some("bob"));

        store.switch_session(Some(&alice));
        block_on(store.load());
        assert_eq!(store.items(), vec![alice_local.clone()]);

        store.switch_session(Some(&bob));
        assert!(store.is_empty());
        block_on(store.load());
        assert!(store.is_empty());

        store.switch_session(None);
        assert!(store.is_empty());

        store.switch_session(Some(&alice));
        block_on(store.load());
        assert_eq!(store.items(), vec![alice_local]);
    }

    #[test]
    fn test_token_refresh_keeps_list() {
        let transport = FakeTransport::with_notifications(vec![server_notification("1", 10, false)]);
        let store = store_with(&transport, &MemoryStorage::new());
        store.switch_session(Some(&SessionCredential::new("tok-1", Some("alice"))));
        block_on(store.load());

        store.switch_session(Some(&SessionCredential::new("tok-2", Some("alice"))));
        assert_eq!(store.len(), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        MarkRead(usize),
        Remove(usize),
        MarkAllRead,
        ClearAll,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        // Ids 12 y 13 no existen: ejercitan el camino Skipped
        prop_oneof![
            4 => (0usize..14).prop_map(Op::MarkRead),
            3 => (0usize..14).prop_map(Op::Remove),
            1 => Just(Op::MarkAllRead),
            1 => Just(Op::ClearAll),
        ]
    }

    proptest! {
        #![proptest_config(Config::with_cases(64))]
        #[test]
        fn unread_count_matches_model_for_any_mutation_sequence(
            steps in prop::collection::vec((arb_op(), any::<bool>()), 0..40)
        ) {
            let list: Vec<Notification> = (0..12)
                .map(|i| server_notification(&i.to_string(), i, i % 3 == 0))
                .collect();
            let mut model: Vec<(String, bool)> = list.iter().map(|n| (n.id.clone(), n.read)).collect();
            let transport = FakeTransport::with_notifications(list);
            let store = store_with(&transport, &MemoryStorage::new());
            block_on(store.load());

            for (op, offline) in steps {
                transport.set_offline(offline);
                let before = store.unread_count();
                match op {
                    Op::MarkRead(i) => {
                        let id = i.to_string();
                        block_on(store.mark_read(&id));
                        model.iter_mut().filter(|(m, _)| *m == id).for_each(|(_, r)| *r = true);
                    }
                    Op::Remove(i) => {
                        let id = i.to_string();
                        block_on(store.remove(&id));
                        model.retain(|(m, _)| *m != id);
                    }
                    Op::MarkAllRead => {
                        block_on(store.mark_all_read());
                        model.iter_mut().for_each(|(_, r)| *r = true);
                    }
                    Op::ClearAll => {
                        block_on(store.clear_all());
                        model.clear();
                    }
                }

                prop_assert_eq!(store.unread_count(), model.iter().filter(|(_, r)| !r).count());
                prop_assert_eq!(store.len(), model.len());
                prop_assert!(store.unread_count() <= before);
            }
        }
    }
}
