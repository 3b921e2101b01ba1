// ============================================================================
// POLL SCHEDULER - Reconciliación periódica con el servicio remoto
// ============================================================================
// Su ciclo de vida es función explícita de (sesión, intervalo): quien lo usa
// llama a `reconcile` cada vez que cambia cualquiera de los dos. Como mucho
// hay un temporizador vivo; cada tick encola una recarga completa.
// ============================================================================

use std::rc::Rc;

use crate::config::PollInterval;
use crate::services::change_bus::{request_reload, ReloadReason, ReloadSender};
use crate::services::timers::{TimerGuard, Timers};
use crate::state::session_state::SessionCredential;

struct ActivePoll {
    interval: PollInterval,
    _guard: TimerGuard,
}

pub struct PollScheduler {
    timers: Rc<dyn Timers>,
    reloads: ReloadSender,
    active: Option<ActivePoll>,
}

impl PollScheduler {
    pub fn new(timers: Rc<dyn Timers>, reloads: ReloadSender) -> Self {
        Self {
            timers,
            reloads,
            active: None,
        }
    }

    /// Arranca, reinicia o para el polling según el estado actual.
    /// - sin credencial → parado
    /// - mismo intervalo que el activo → no toca nada
    /// - intervalo distinto → cancela el anterior y arranca uno nuevo
    pub fn reconcile(&mut self, credential: Option<&SessionCredential>, interval: PollInterval) {
        if credential.is_none() {
            self.stop();
            return;
        }

        if self.current_interval() == Some(interval) {
            return;
        }

        // Soltar el guard anterior antes de crear el nuevo
        if self.active.take().is_some() {
            log::info!("⏱️ [POLL] Cambio de intervalo → {}", interval.label());
        } else {
            log::info!("⏱️ [POLL] Polling iniciado cada {}", interval.label());
        }

        let reloads = self.reloads.clone();
        let guard = self.timers.interval(
            interval.as_millis(),
            Box::new(move || {
                log::debug!("⏱️ [POLL] Tick");
                request_reload(&reloads, ReloadReason::Poll);
            }),
        );
        self.active = Some(ActivePoll {
            interval,
            _guard: guard,
        });
    }

    pub fn stop(&mut self) {
        if self.active.take().is_some() {
            log::info!("⏹️ [POLL] Polling detenido");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_interval(&self) -> Option<PollInterval> {
        self.active.as_ref().map(|a| a.interval)
    }
}
