// ============================================================================
// SESSION STATE - Credencial de la sesión autenticada
// ============================================================================
// Lo rellena el colaborador de autenticación. Mientras no haya credencial no
// hay polling ni llamadas remotas.
// ============================================================================

use crate::state::reactivity::{ReactiveState, Subscription};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCredential {
    pub token: String,
    /// Usuario de la sesión; acota la persistencia degradada a ese usuario
    pub user_id: Option<String>,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>, user_id: Option<&str>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.map(str::to_string),
        }
    }
}

#[derive(Clone)]
pub struct SessionState {
    credential: ReactiveState<Option<SessionCredential>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            credential: ReactiveState::new(None),
        }
    }

    /// Login / refresco de token sin usuario conocido
    pub fn set_token(&self, token: Option<String>) {
        self.set_session(token, None);
    }

    /// Login / refresco de token. Un token vacío equivale a logout.
    pub fn set_session(&self, token: Option<String>, user_id: Option<String>) {
        let user_id = user_id.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let credential = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|token| SessionCredential { token, user_id });

        if self.credential.with(|current| *current == credential) {
            return;
        }
        log::info!(
            "🔐 [SESSION] {}",
            if credential.is_some() { "Sesión activa" } else { "Sesión cerrada" }
        );
        self.credential.set(credential);
    }

    pub fn logout(&self) {
        self.set_token(None);
    }

    pub fn credential(&self) -> Option<SessionCredential> {
        self.credential.snapshot()
    }

    pub fn token(&self) -> Option<String> {
        self.credential.with(|c| c.as_ref().map(|c| c.token.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.with(Option::is_some)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.credential.subscribe(callback)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
