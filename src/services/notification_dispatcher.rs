// ============================================================================
// NOTIFICATION DISPATCHER - Punto de entrada del ciclo de vida de tickets
// ============================================================================
// Crea notificaciones en el servidor y, si no está disponible, en la
// persistencia local. En ambos casos la creación se anuncia en el bus local
// para que las vistas de esta pestaña recarguen.
// ============================================================================

use std::rc::Rc;

use crate::models::{NewNotification, Notification, NotificationKind};
use crate::services::api_client::NotificationTransport;
use crate::services::change_bus::{ChangeEvent, LocalBus};
use crate::services::notification_sync::NotificationSync;
use crate::services::offline_service::OfflineService;

pub struct NotificationDispatcher<T> {
    remote: Rc<NotificationSync<T>>,
    offline: OfflineService,
    bus: LocalBus,
}

impl<T> Clone for NotificationDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            offline: self.offline.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<T: NotificationTransport> NotificationDispatcher<T> {
    pub fn new(remote: Rc<NotificationSync<T>>, offline: OfflineService, bus: LocalBus) -> Self {
        Self { remote, offline, bus }
    }

    /// Nunca falla: servidor si se puede, persistencia local si no
    pub async fn notify(&self, new: NewNotification) -> Notification {
        match self.remote.create(&new).await {
            Ok(created) => {
                log::info!("🔔 [DISPATCH] Notificación creada en servidor: {}", created.id);
                self.bus.announce(ChangeEvent::Created(created.clone()));
                created
            }
            Err(e) => {
                log::warn!("📴 [DISPATCH] create remoto no disponible ({}), se crea en local", e);
                // create_local ya anuncia en el bus
                self.offline.create_local(new)
            }
        }
    }

    pub async fn ticket_assigned(&self, ticket_id: &str, ticket_title: &str, assignee: &str) -> Notification {
        self.notify(
            NewNotification::new(
                format!("Ticket #{} assigned", ticket_id),
                format!("\"{}\" was assigned to {}", ticket_title, assignee),
                NotificationKind::TicketAssigned,
            )
            .with_ticket(ticket_id),
        )
        .await
    }

    pub async fn ticket_resolved(&self, ticket_id: &str, ticket_title: &str) -> Notification {
        self.notify(
            NewNotification::new(
                format!("Ticket #{} resolved", ticket_id),
                format!("\"{}\" has been resolved", ticket_title),
                NotificationKind::TicketResolved,
            )
            .with_ticket(ticket_id),
        )
        .await
    }

    pub async fn approval_requested(&self, ticket_id: &str, requester: &str) -> Notification {
        self.notify(
            NewNotification::new(
                "Approval required",
                format!("{} requested approval for ticket #{}", requester, ticket_id),
                NotificationKind::Approval,
            )
            .with_ticket(ticket_id),
        )
        .await
    }

    /// `remaining` llega ya calculado por quien lleva el SLA ("2h 15m")
    pub async fn sla_alert(&self, ticket_id: &str, remaining: &str) -> Notification {
        self.notify(
            NewNotification::new(
                format!("SLA alert on ticket #{}", ticket_id),
                format!("SLA deadline in {}", remaining),
                NotificationKind::SlaAlert,
            )
            .with_ticket(ticket_id),
        )
        .await
    }
}
