// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio: envía la petición y devuelve el JSON crudo.
// La normalización de respuestas vive en NotificationSync.
// ============================================================================

use serde_json::Value;

use crate::error::SyncError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// Transporte hacia el servicio remoto de notificaciones.
/// Un cuerpo de respuesta vacío se devuelve como `Value::Null`.
#[allow(async_fn_in_trait)]
pub trait NotificationTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SyncError>;
}

#[cfg(target_arch = "wasm32")]
pub use browser::HttpTransport;

#[cfg(target_arch = "wasm32")]
mod browser {
    use gloo_net::http::{Request, RequestBuilder};
    use serde_json::Value;

    use super::{Method, NotificationTransport};
    use crate::error::SyncError;
    use crate::state::session_state::SessionState;

    /// Cliente HTTP (gloo-net) autenticado con el token de la sesión actual
    #[derive(Clone)]
    pub struct HttpTransport {
        base_url: String,
        session: SessionState,
    }

    impl HttpTransport {
        pub fn new(base_url: impl Into<String>, session: SessionState) -> Self {
            Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                session,
            }
        }

        fn builder(&self, method: Method, url: &str) -> RequestBuilder {
            match method {
                Method::Get => Request::get(url),
                Method::Post => Request::post(url),
                Method::Patch => Request::patch(url),
                Method::Delete => Request::delete(url),
            }
        }
    }

    impl NotificationTransport for HttpTransport {
        async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SyncError> {
            // Sin credencial no se habla con el backend
            let token = self.session.token().ok_or(SyncError::Unauthenticated)?;
            let url = format!("{}{}", self.base_url, path);

            let builder = self
                .builder(method, &url)
                .header("Authorization", &format!("Bearer {}", token))
                .header("Accept", "application/json");

            let response = match body {
                Some(body) => builder
                    .json(body)
                    .map_err(|e| SyncError::Malformed(format!("Request build error: {}", e)))?
                    .send()
                    .await,
                None => builder.send().await,
            }
            .map_err(|e| SyncError::Network(e.to_string()))?;

            if !response.ok() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(SyncError::Http { status, body });
            }

            let text = response
                .text()
                .await
                .map_err(|e| SyncError::Network(e.to_string()))?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }

            serde_json::from_str(&text).map_err(|e| SyncError::Malformed(format!("Parse error: {}", e)))
        }
    }
}
