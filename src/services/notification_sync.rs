// ============================================================================
// NOTIFICATION SYNC - Sincronizador remoto de notificaciones
// ============================================================================
// Traduce las intenciones del store a llamadas remotas y normaliza las
// distintas formas de respuesta (snake_case / camelCase, envoltorios) al
// modelo canónico. Cada método falla de forma independiente y nunca
// reintenta: el reintento llega con el siguiente tick de polling o la
// siguiente acción del usuario.
// ============================================================================

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::error::SyncError;
use crate::models::{NewNotification, Notification, NotificationKind};
use crate::services::api_client::{Method, NotificationTransport};
use crate::utils::constants::{NOTIFICATIONS_PATH, NOTIFICATIONS_READ_ALL_PATH};

pub struct NotificationSync<T> {
    transport: T,
}

impl<T: NotificationTransport> NotificationSync<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch(&self) -> Result<Vec<Notification>, SyncError> {
        let payload = self.transport.request(Method::Get, NOTIFICATIONS_PATH, None).await?;
        let list = normalize_list(&payload)?;
        log::debug!("📥 [SYNC] {} notificaciones recibidas", list.len());
        Ok(list)
    }

    pub async fn set_read(&self, id: &str) -> Result<(), SyncError> {
        let path = format!("{}/{}/read", NOTIFICATIONS_PATH, id);
        self.transport.request(Method::Patch, &path, None).await.map(|_| ())
    }

    pub async fn set_all_read(&self) -> Result<(), SyncError> {
        self.transport
            .request(Method::Patch, NOTIFICATIONS_READ_ALL_PATH, None)
            .await
            .map(|_| ())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let path = format!("{}/{}", NOTIFICATIONS_PATH, id);
        self.transport.request(Method::Delete, &path, None).await.map(|_| ())
    }

    pub async fn delete_all(&self) -> Result<(), SyncError> {
        self.transport
            .request(Method::Delete, NOTIFICATIONS_PATH, None)
            .await
            .map(|_| ())
    }

    /// Crea la notificación en el servidor. Si el servidor confirma sin devolver
    /// el registro se acepta con los datos enviados y un id local.
    pub async fn create(&self, new: &NewNotification) -> Result<Notification, SyncError> {
        let body = json!({
            "title": new.title,
            "message": new.message,
            "type": new.kind.as_str(),
            "ticket_id": new.ticket_id,
            "link": new.link,
        });
        let payload = self.transport.request(Method::Post, NOTIFICATIONS_PATH, Some(&body)).await?;

        let record = unwrap_record(&payload).and_then(normalize_notification);
        Ok(record.unwrap_or_else(|| {
            log::debug!("ℹ️ [SYNC] create sin registro en la respuesta, se usa id local");
            new.clone().into_local(Utc::now())
        }))
    }
}

/// Lista de notificaciones: array directo o `{notifications|data|items: [...]}`.
/// Los registros sin id se descartan; cualquier otra forma es `Malformed`.
pub fn normalize_list(payload: &Value) -> Result<Vec<Notification>, SyncError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => ["notifications", "data", "items"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| SyncError::Malformed("respuesta sin lista de notificaciones".to_string()))?,
        other => {
            return Err(SyncError::Malformed(format!(
                "se esperaba lista u objeto, llegó {}",
                json_type(other)
            )))
        }
    };

    let list: Vec<Notification> = items.iter().filter_map(normalize_notification).collect();
    if list.len() < items.len() {
        log::warn!("⚠️ [SYNC] {} registros descartados por no tener id", items.len() - list.len());
    }
    Ok(list)
}

fn unwrap_record(payload: &Value) -> Option<&Value> {
    let map = payload.as_object()?;
    for key in ["notification", "data"] {
        if let Some(inner) = map.get(key).filter(|v| v.is_object()) {
            return Some(inner);
        }
    }
    Some(payload)
}

/// Un registro remoto → `Notification`. `None` si no trae id utilizable.
pub fn normalize_notification(record: &Value) -> Option<Notification> {
    let map = record.as_object()?;

    let id = first_id(map, &["id", "_id", "notification_id", "notificationId"])?;
    let title = first_str(map, &["title", "subject"]).unwrap_or_default();
    let message = first_str(map, &["message", "body", "content"]).unwrap_or_default();
    let kind = first_str(map, &["kind", "type", "notification_type", "notificationType"])
        .and_then(|raw| NotificationKind::parse(&raw))
        .unwrap_or(NotificationKind::Info);
    let read = first_bool(map, &["read", "is_read", "isRead"])
        .or_else(|| first_present(map, &["read_at", "readAt"]).map(|v| !v.is_null()))
        .unwrap_or(false);
    let created_at = first_present(map, &["created_at", "createdAt", "timestamp"])
        .and_then(parse_instant)
        .unwrap_or_else(Utc::now);
    let ticket_id = first_id(map, &["ticket_id", "ticketId"]);
    let link = first_str(map, &["link", "url", "action_url", "actionUrl"]).filter(|l| !l.is_empty());

    Some(Notification {
        id,
        title,
        message,
        kind,
        read,
        created_at,
        ticket_id,
        link,
    })
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

fn first_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn first_bool(map: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_bool))
}

/// Ids como string o número; vacíos no cuentan
fn first_id(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// RFC 3339 o epoch (milisegundos; segundos si el número es pequeño)
fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Por debajo de 10^11 el valor solo tiene sentido como segundos
            let millis = if raw.abs() < 100_000_000_000 { raw * 1_000 } else { raw };
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
