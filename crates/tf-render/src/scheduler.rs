use std::time::{Duration, Instant};

use tf_core::traits::{TickHandle, TickScheduler};

/// Planificateur coopératif calé sur une cadence de rafraîchissement.
///
/// Aucun thread : la boucle de la présentation appelle `take_due(now)` à
/// chaque tour et dort jusqu'à `next_deadline()`.
///
/// # Example
/// ```
/// use std::time::{Duration, Instant};
/// use tf_core::traits::TickScheduler;
/// use tf_render::scheduler::RefreshScheduler;
///
/// let mut sched = RefreshScheduler::new(60);
/// let tick = sched.schedule_next_tick();
/// let later = Instant::now() + Duration::from_secs(1);
/// assert_eq!(sched.take_due(later), Some(tick));
/// assert_eq!(sched.take_due(later), None);
/// ```
pub struct RefreshScheduler {
    period: Duration,
    next_id: u64,
    /// Ticks en attente, dans l'ordre de programmation.
    pending: Vec<(TickHandle, Instant)>,
    last_deadline: Option<Instant>,
}

impl RefreshScheduler {
    /// Cadence en images par seconde (bornée à 1 minimum).
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        Self {
            period: Self::period_for(target_fps),
            next_id: 0,
            pending: Vec::new(),
            last_deadline: None,
        }
    }

    /// Change la cadence. Les ticks déjà programmés gardent leur échéance.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.period = Self::period_for(target_fps);
    }

    /// Intervalle entre deux rafraîchissements.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Nombre de ticks en attente.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn period_for(target_fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1)))
    }
}

impl TickScheduler for RefreshScheduler {
    fn schedule_next_tick(&mut self) -> TickHandle {
        let now = Instant::now();
        // Reste sur la grille de rafraîchissement ; en retard, on tire au plus tôt.
        let deadline = self
            .last_deadline
            .map_or(now + self.period, |prev| (prev + self.period).max(now));
        self.last_deadline = Some(deadline);

        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.pending.push((handle, deadline));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.pending.retain(|(h, _)| *h != handle);
    }

    fn take_due(&mut self, now: Instant) -> Option<TickHandle> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .min_by_key(|(_, (h, deadline))| (*deadline, *h))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(idx).0)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, d)| *d).min()
    }
}
