// ============================================================================
// NOTIFICATION PANEL VIEW - Campana, badge y lista del Notification Center
// ============================================================================
// Función pura de render: recibe lo que hay que pintar y los callbacks; toda
// la lógica vive en NotificationCenter.
// ============================================================================

use std::rc::Rc;

use chrono::{DateTime, Utc};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::config::PollInterval;
use crate::dom::ElementBuilder;
use crate::models::Notification;
use crate::utils::time::format_relative;
use crate::viewmodels::FilterMode;

/// Datos del panel en el momento del render
pub struct PanelModel {
    pub open: bool,
    pub badge: Option<String>,
    pub filter: FilterMode,
    pub loading: bool,
    pub notifications: Vec<Notification>,
    pub poll_interval: PollInterval,
    pub now: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PanelHandlers {
    pub on_toggle: Rc<dyn Fn()>,
    pub on_open: Rc<dyn Fn(String)>,
    pub on_delete: Rc<dyn Fn(String)>,
    pub on_filter: Rc<dyn Fn(FilterMode)>,
    pub on_mark_all_read: Rc<dyn Fn()>,
    pub on_clear_all: Rc<dyn Fn()>,
    pub on_interval: Rc<dyn Fn(PollInterval)>,
}

pub fn render_notification_panel(model: &PanelModel, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let container = ElementBuilder::new("div")?
        .class("notification-center")
        .child(render_bell(model, handlers)?)?;

    if !model.open {
        return Ok(container.build());
    }

    let panel = ElementBuilder::new("div")?
        .class("notification-panel")
        .attr("role", "dialog")?
        .child(render_header(model, handlers)?)?
        .child(render_list(model, handlers)?)?
        .child(render_poll_presets(model, handlers)?)?
        .build();

    Ok(container.child(panel)?.build())
}

fn render_bell(model: &PanelModel, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let on_toggle = handlers.on_toggle.clone();
    let mut bell = ElementBuilder::new("button")?
        .class("notification-bell")
        .attr("aria-label", "Notifications")?
        .child(ElementBuilder::new("span")?.text("🔔").build())?
        .on_click(move |_| on_toggle())?;

    if let Some(badge) = &model.badge {
        bell = bell.child(
            ElementBuilder::new("span")?
                .class("notification-badge")
                .text(badge)
                .build(),
        )?;
    }
    Ok(bell.build())
}

fn render_header(model: &PanelModel, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let tabs = ElementBuilder::new("div")?
        .class("notification-tabs")
        .child(filter_tab("All", FilterMode::All, model.filter, handlers)?)?
        .child(filter_tab("Unread", FilterMode::UnreadOnly, model.filter, handlers)?)?
        .build();

    let has_items = !model.notifications.is_empty() || model.filter == FilterMode::UnreadOnly;

    let on_mark_all = handlers.on_mark_all_read.clone();
    let mark_all = ElementBuilder::new("button")?
        .class("notification-action")
        .text("Mark all as read")
        .attr_if(model.badge.is_none(), "disabled", "true")?
        .on_click(move |_| on_mark_all())?
        .build();

    let on_clear = handlers.on_clear_all.clone();
    let clear_all = ElementBuilder::new("button")?
        .class("notification-action notification-action--danger")
        .text("Clear all")
        .attr_if(!has_items, "disabled", "true")?
        .on_click(move |_| on_clear())?
        .build();

    let title = ElementBuilder::new("h3")?
        .text(if model.loading { "Notifications ⏳" } else { "Notifications" })
        .build();

    Ok(ElementBuilder::new("div")?
        .class("notification-panel__header")
        .children([title, tabs, mark_all, clear_all])?
        .build())
}

fn filter_tab(label: &str, mode: FilterMode, current: FilterMode, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let on_filter = handlers.on_filter.clone();
    Ok(ElementBuilder::new("button")?
        .class("notification-tab")
        .class_if(mode == current, "notification-tab--active")?
        .text(label)
        .on_click(move |_| on_filter(mode))?
        .build())
}

fn render_list(model: &PanelModel, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let list = ElementBuilder::new("ul")?.class("notification-list");

    if model.notifications.is_empty() {
        let empty_text = match model.filter {
            FilterMode::All => "No notifications",
            FilterMode::UnreadOnly => "You're all caught up",
        };
        return Ok(list
            .child(
                ElementBuilder::new("li")?
                    .class("notification-empty")
                    .text(empty_text)
                    .build(),
            )?
            .build());
    }

    let rows = model
        .notifications
        .iter()
        .map(|n| render_row(n, model.now, handlers))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(list.children(rows)?.build())
}

fn render_row(notification: &Notification, now: DateTime<Utc>, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let presentation = notification.kind.presentation();

    let body = ElementBuilder::new("div")?
        .class("notification-row__body")
        .child(ElementBuilder::new("strong")?.text(&notification.title).build())?
        .child(ElementBuilder::new("p")?.text(&notification.message).build())?
        .child(
            ElementBuilder::new("time")?
                .attr("datetime", &notification.created_at.to_rfc3339())?
                .text(&format_relative(notification.created_at, now))
                .build(),
        )?
        .build();

    // El borrado no debe disparar también el click de la fila
    let on_delete = handlers.on_delete.clone();
    let delete_id = notification.id.clone();
    let delete = ElementBuilder::new("button")?
        .class("notification-row__delete")
        .attr("aria-label", "Delete notification")?
        .text("✕")
        .on_click(move |event| {
            event.stop_propagation();
            on_delete(delete_id.clone());
        })?
        .build();

    let on_open = handlers.on_open.clone();
    let open_id = notification.id.clone();
    Ok(ElementBuilder::new("li")?
        .class(&format!("notification-row {}", presentation.css_class))
        .class_if(!notification.read, "notification-row--unread")?
        .attr("data-id", &notification.id)?
        .attr("title", presentation.label)?
        .child(
            ElementBuilder::new("span")?
                .class("notification-row__icon")
                .text(presentation.icon)
                .build(),
        )?
        .child(body)?
        .child(delete)?
        .on_click(move |_| on_open(open_id.clone()))?
        .build())
}

fn render_poll_presets(model: &PanelModel, handlers: &PanelHandlers) -> Result<Element, JsValue> {
    let chips = PollInterval::PRESETS
        .iter()
        .map(|preset| -> Result<Element, JsValue> {
            let preset = *preset;
            let on_interval = handlers.on_interval.clone();
            ElementBuilder::new("button")?
                .class("poll-preset")
                .class_if(preset == model.poll_interval, "poll-preset--active")?
                .text(&preset.label())
                .on_click(move |_| on_interval(preset))
                .map(ElementBuilder::build)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElementBuilder::new("div")?
        .class("notification-panel__footer")
        .child(ElementBuilder::new("span")?.text("Refresh every").build())?
        .children(chips)?
        .build())
}
