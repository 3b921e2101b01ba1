// ============================================================================
// ELEMENT HELPERS - Funciones básicas para manipular DOM
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

/// Obtener window global
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Obtener document
pub fn document() -> Option<Document> {
    window()?.document()
}

/// Obtener elemento por ID
pub fn get_element_by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

/// Contenedor con ese id; si la página no lo trae se crea al final del body
pub fn ensure_root(id: &str) -> Result<Element, JsValue> {
    if let Some(existing) = get_element_by_id(id) {
        return Ok(existing);
    }
    let doc = document().ok_or_else(|| JsValue::from_str("No document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("No body"))?;
    let root = doc.create_element("div")?;
    root.set_id(id);
    body.append_child(&root)?;
    Ok(root)
}

/// Crear elemento
pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("No document"))
        .and_then(|doc| doc.create_element(tag))
}

/// Establecer text content
pub fn set_text_content(element: &Element, text: &str) {
    element.set_text_content(Some(text));
}

/// Vaciar y reemplazar el contenido de un contenedor
pub fn replace_children(parent: &Element, child: &Element) -> Result<(), JsValue> {
    parent.set_inner_html("");
    parent.append_child(child).map(|_| ())
}

/// Agregar hijo
pub fn append_child(parent: &Element, child: &Element) -> Result<(), JsValue> {
    parent.append_child(child).map(|_| ())
}

/// Establecer atributo
pub fn set_attribute(element: &Element, name: &str, value: &str) -> Result<(), JsValue> {
    element.set_attribute(name, value)
}

/// Navegación del host (ruta relativa o URL absoluta)
pub fn navigate_to(route: &str) -> Result<(), JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("No window"))?
        .location()
        .assign(route)
}
