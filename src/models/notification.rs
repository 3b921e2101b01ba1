use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefijo de los ids generados en modo degradado (nunca colisiona con ids del servidor)
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Tipo de notificación. Conjunto cerrado: añadir un tipo obliga a cubrirlo
/// en `presentation()` y `route_prefix()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    TicketAssigned,
    TicketResolved,
    Approval,
    SlaAlert,
}

/// Icono, clase CSS y etiqueta de un tipo de notificación
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindPresentation {
    pub icon: &'static str,
    pub css_class: &'static str,
    pub label: &'static str,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 8] = [
        NotificationKind::Info,
        NotificationKind::Success,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::TicketAssigned,
        NotificationKind::TicketResolved,
        NotificationKind::Approval,
        NotificationKind::SlaAlert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::TicketAssigned => "ticket_assigned",
            NotificationKind::TicketResolved => "ticket_resolved",
            NotificationKind::Approval => "approval",
            NotificationKind::SlaAlert => "sla_alert",
        }
    }

    /// Acepta snake_case, camelCase, kebab-case y mayúsculas
    /// ("ticketAssigned", "TICKET-ASSIGNED", "ticket_assigned")
    pub fn parse(raw: &str) -> Option<Self> {
        let mut normalized = String::with_capacity(raw.len() + 4);
        let mut prev_lower = false;
        for c in raw.trim().chars() {
            if c == '-' || c == ' ' {
                normalized.push('_');
                prev_lower = false;
            } else if c.is_ascii_uppercase() {
                if prev_lower {
                    normalized.push('_');
                }
                normalized.push(c.to_ascii_lowercase());
                prev_lower = false;
            } else {
                normalized.push(c);
                prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        }

        Self::ALL.iter().copied().find(|k| k.as_str() == normalized)
    }

    pub fn presentation(&self) -> KindPresentation {
        match self {
            NotificationKind::Info => KindPresentation {
                icon: "ℹ️",
                css_class: "notification--info",
                label: "Info",
            },
            NotificationKind::Success => KindPresentation {
                icon: "✅",
                css_class: "notification--success",
                label: "Success",
            },
            NotificationKind::Warning => KindPresentation {
                icon: "⚠️",
                css_class: "notification--warning",
                label: "Warning",
            },
            NotificationKind::Error => KindPresentation {
                icon: "❌",
                css_class: "notification--error",
                label: "Error",
            },
            NotificationKind::TicketAssigned => KindPresentation {
                icon: "🎫",
                css_class: "notification--assigned",
                label: "Ticket assigned",
            },
            NotificationKind::TicketResolved => KindPresentation {
                icon: "✔️",
                css_class: "notification--resolved",
                label: "Ticket resolved",
            },
            NotificationKind::Approval => KindPresentation {
                icon: "📝",
                css_class: "notification--approval",
                label: "Approval",
            },
            NotificationKind::SlaAlert => KindPresentation {
                icon: "⏰",
                css_class: "notification--sla",
                label: "SLA alert",
            },
        }
    }

    /// Ruta base a la que navega una notificación con `ticket_id`
    pub fn route_prefix(&self) -> &'static str {
        match self {
            NotificationKind::Approval => "/approvals",
            NotificationKind::Info
            | NotificationKind::Success
            | NotificationKind::Warning
            | NotificationKind::Error
            | NotificationKind::TicketAssigned
            | NotificationKind::TicketResolved
            | NotificationKind::SlaAlert => "/tickets",
        }
    }
}

/// Notificación persistente del Notification Center
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Notification {
    /// Destino de navegación: `link` explícito, si no la ruta del ticket según el tipo
    pub fn route(&self) -> Option<String> {
        if let Some(link) = self.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            return Some(link.to_string());
        }

        self.ticket_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|ticket| format!("{}/{}", self.kind.route_prefix(), ticket))
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Datos que aporta quien crea una notificación (ciclo de vida del ticket)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            ticket_id: None,
            link: None,
        }
    }

    pub fn with_ticket(mut self, ticket_id: impl ToString) -> Self {
        self.ticket_id = Some(ticket_id.to_string());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Materializa la notificación en modo local: id local, no leída, creada `now`
    pub fn into_local(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: generate_local_id(now),
            title: self.title,
            message: self.message,
            kind: self.kind,
            read: false,
            created_at: now,
            ticket_id: self.ticket_id,
            link: self.link,
        }
    }
}

/// `local-{millis}-{sufijo aleatorio}`
pub fn generate_local_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}-{}", LOCAL_ID_PREFIX, now.timestamp_millis(), &suffix[..8])
}

/// Orden de render: más reciente primero (desempate por id para que sea estable)
pub fn sort_newest_first(list: &mut [Notification]) {
    list.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
