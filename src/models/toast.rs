use crate::config::ToastConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Some(ToastKind::Success),
            "error" => Some(ToastKind::Error),
            "warning" => Some(ToastKind::Warning),
            "info" => Some(ToastKind::Info),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Success => "✅",
            ToastKind::Error => "❌",
            ToastKind::Warning => "⚠️",
            ToastKind::Info => "ℹ️",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast--success",
            ToastKind::Error => "toast--error",
            ToastKind::Warning => "toast--warning",
            ToastKind::Info => "toast--info",
        }
    }

    /// Los errores se quedan más tiempo en pantalla
    pub fn default_duration_ms(&self, config: &ToastConfig) -> u32 {
        match self {
            ToastKind::Error => config.error_duration_ms,
            ToastKind::Success | ToastKind::Warning | ToastKind::Info => config.default_duration_ms,
        }
    }
}

/// Mensaje efímero. `duration_ms == 0` = fijo hasta que el usuario lo cierre
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u32,
}

impl Toast {
    pub fn is_sticky(&self) -> bool {
        self.duration_ms == 0
    }
}
