use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    pub poll_interval_ms: u32,
    pub toast_config: ToastConfig,
    pub storage_config: StorageConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backend_url_development: "http://localhost:8000".to_string(),
            backend_url_production: "https://helpdesk.example.com".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            poll_interval_ms: 30_000,
            toast_config: ToastConfig::default(),
            storage_config: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastConfig {
    pub default_duration_ms: u32,
    pub error_duration_ms: u32,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5_000,
            error_duration_ms: 7_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub storage_key: String,
    pub local_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_key: "helpdesk_notifications".to_string(),
            local_capacity: 50,
        }
    }
}

impl NotificationConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url_development: option_env!("BACKEND_URL_DEVELOPMENT")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_development),
            backend_url_production: option_env!("BACKEND_URL_PRODUCTION")
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_production),
            environment: option_env!("ENVIRONMENT")
                .map(str::to_string)
                .unwrap_or(defaults.environment),
            enable_logging: option_env!("ENABLE_LOGGING")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_logging),
            poll_interval_ms: option_env!("NOTIFICATION_POLL_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
            toast_config: ToastConfig {
                default_duration_ms: option_env!("TOAST_DURATION_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.toast_config.default_duration_ms),
                error_duration_ms: option_env!("TOAST_ERROR_DURATION_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.toast_config.error_duration_ms),
            },
            storage_config: StorageConfig {
                storage_key: option_env!("NOTIFICATION_STORAGE_KEY")
                    .map(str::to_string)
                    .unwrap_or(defaults.storage_config.storage_key),
                local_capacity: option_env!("LOCAL_NOTIFICATION_CAPACITY")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.storage_config.local_capacity),
            },
        }
    }

    /// Obtiene la URL del backend según el entorno actual
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }

    /// Intervalo de polling configurado; si el valor de compilación es inválido
    /// se usa el preset de 30 s
    pub fn poll_interval(&self) -> PollInterval {
        PollInterval::from_millis(self.poll_interval_ms).unwrap_or(PollInterval::THIRTY_SECONDS)
    }
}

/// Intervalo del polling de notificaciones (nunca sub-segundo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollInterval(u32);

impl PollInterval {
    pub const MIN_MS: u32 = 1_000;

    pub const FIFTEEN_SECONDS: PollInterval = PollInterval(15_000);
    pub const THIRTY_SECONDS: PollInterval = PollInterval(30_000);
    pub const ONE_MINUTE: PollInterval = PollInterval(60_000);
    pub const FIVE_MINUTES: PollInterval = PollInterval(300_000);

    /// Presets que ofrece la UI
    pub const PRESETS: [PollInterval; 4] = [
        Self::FIFTEEN_SECONDS,
        Self::THIRTY_SECONDS,
        Self::ONE_MINUTE,
        Self::FIVE_MINUTES,
    ];

    pub fn from_millis(ms: u32) -> Result<Self, ConfigError> {
        if ms < Self::MIN_MS {
            return Err(ConfigError::IntervalTooShort(ms));
        }
        Ok(Self(ms))
    }

    pub fn as_millis(&self) -> u32 {
        self.0
    }

    pub fn label(&self) -> String {
        match self.0 {
            ms if ms % 60_000 == 0 => format!("{} min", ms / 60_000),
            ms if ms % 1_000 == 0 => format!("{} s", ms / 1_000),
            ms => format!("{} ms", ms),
        }
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: NotificationConfig = NotificationConfig::from_env();
}
