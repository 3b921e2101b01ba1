// ============================================================================
// TOAST STACK VIEW - Pila de toasts
// ============================================================================

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::ElementBuilder;
use crate::models::Toast;

pub fn render_toast_stack(toasts: &[Toast], on_dismiss: Rc<dyn Fn(u64)>) -> Result<Element, JsValue> {
    let items = toasts
        .iter()
        .map(|toast| -> Result<Element, JsValue> {
            let on_dismiss = on_dismiss.clone();
            let id = toast.id;
            let close = ElementBuilder::new("button")?
                .class("toast__close")
                .attr("aria-label", "Dismiss")?
                .text("✕")
                .on_click(move |_| on_dismiss(id))?
                .build();

            Ok(ElementBuilder::new("div")?
                .class(&format!("toast {}", toast.kind.css_class()))
                .attr("role", "status")?
                .child(ElementBuilder::new("span")?.text(toast.kind.icon()).build())?
                .child(ElementBuilder::new("span")?.class("toast__message").text(&toast.message).build())?
                .child(close)?
                .build())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElementBuilder::new("div")?
        .class("toast-stack")
        .attr("aria-live", "polite")?
        .children(items)?
        .build())
}
