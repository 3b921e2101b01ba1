// ============================================================================
// ERRORES - Taxonomía de fallos del subsistema de notificaciones
// ============================================================================
// Ninguno de estos errores llega al usuario: el store y el dispatcher los
// capturan en su frontera y degradan a persistencia local.
// ============================================================================

use thiserror::Error;

/// Fallo del servicio remoto de notificaciones (remote-unavailable)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("no hay sesión autenticada")]
    Unauthenticated,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("payload inválido: {0}")]
    Malformed(String),
}

/// Fallo de la persistencia local (local-storage-unavailable)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("localStorage no disponible")]
    Unavailable,
    #[error("error escribiendo en storage: {0}")]
    Write(String),
    #[error("error serializando: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("intervalo de polling demasiado corto: {0} ms (mínimo 1000 ms)")]
    IntervalTooShort(u32),
}
