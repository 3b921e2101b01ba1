// ============================================================================
// EVENT HANDLING
// ============================================================================
// Cada listener de elemento queda registrado en la bolsa del render en curso.
// Quien renderiza se queda con ella (`take_render_listeners`) y la suelta al
// renderizar otra vez: se quita el listener y se libera el closure de Rust.
// ============================================================================

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

use crate::state::reactivity::{Subscription, SubscriptionBag};

thread_local! {
    static RENDER_LISTENERS: SubscriptionBag = SubscriptionBag::new();
}

/// Helper para crear click handler simple
pub fn on_click<F>(element: &Element, handler: F) -> Result<(), JsValue>
where
    F: FnMut(MouseEvent) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(MouseEvent)>);
    element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;

    let target = element.clone();
    let listener = Subscription::new(move || {
        if let Err(e) = target.remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref()) {
            log::warn!("⚠️ [DOM] No se pudo quitar listener de click: {:?}", e);
        }
    });
    RENDER_LISTENERS.with(|bag| bag.push(listener));
    Ok(())
}

/// Listeners creados desde la última llamada
pub fn take_render_listeners() -> Vec<Subscription> {
    RENDER_LISTENERS.with(SubscriptionBag::take)
}
