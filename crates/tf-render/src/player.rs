use std::sync::Arc;
use std::time::Instant;

use tf_ascii::Converter;
use tf_core::config::Parameters;
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, FrameBuffer};
use tf_core::traits::{FrameSink, TickHandle, TickScheduler, VideoHandle, VideoPoll};

/// État de la boucle de rendu vidéo.
///
/// `Idle → Running ⇄ Paused`, `stop()` depuis n'importe quel état passe
/// par `Stopped` et revient à `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Aucune vidéo.
    Idle,
    /// Un tick est programmé.
    Running,
    /// Pause utilisateur, pause vidéo ou fin de flux. Aucun tick programmé.
    Paused,
    /// Transitoire pendant `stop()`.
    Stopped,
}

/// Ce qu'a fait un tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Une frame a été convertie et publiée.
    Published,
    /// Rien de neuf ou source pas prête ; tick suivant programmé.
    Skipped,
    /// Tick qui n'est pas le tick en attente de cette boucle : ignoré.
    Stale,
    /// La vidéo s'est mise en pause.
    Paused,
    /// Fin du flux.
    Ended,
}

/// Contrôleur de la boucle vidéo.
///
/// À chaque tick : sonde la vidéo, convertit la frame courante avec les
/// `Parameters` actifs, publie, puis programme le tick suivant. Il n'y a
/// jamais plus d'un tick en attente, et toute sortie de `Running` annule
/// ce tick avant de changer d'état.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
/// use tf_core::config::Parameters;
/// use tf_core::frame::{AsciiFrame, FrameBuffer};
/// use tf_core::traits::{VideoHandle, VideoPoll};
/// use tf_render::player::{LoopState, RenderLoop};
/// use tf_render::scheduler::RefreshScheduler;
///
/// struct Still(Arc<FrameBuffer>);
/// impl VideoHandle for Still {
///     fn poll_frame(&mut self) -> VideoPoll { VideoPoll::Frame(Arc::clone(&self.0)) }
///     fn play(&mut self) {}
///     fn pause(&mut self) {}
/// }
///
/// let mut player = RenderLoop::new(RefreshScheduler::new(60));
/// player.start(Still(Arc::new(FrameBuffer::filled(100, 50, [0, 0, 0]))));
/// assert_eq!(player.state(), LoopState::Running);
///
/// let mut frames: Vec<AsciiFrame> = Vec::new();
/// let later = Instant::now() + Duration::from_secs(1);
/// player.pump(later, &Parameters::default(), &mut |f: &AsciiFrame| frames.push(f.clone()));
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].height(), 25);
/// ```
pub struct RenderLoop<V, S> {
    state: LoopState,
    video: Option<V>,
    scheduler: S,
    pending: Option<TickHandle>,
    converter: Converter,
    last_source: Option<Arc<FrameBuffer>>,
    last_frame: Option<AsciiFrame>,
    frames_published: u64,
}

impl<V: VideoHandle, S: TickScheduler> RenderLoop<V, S> {
    #[must_use]
    pub fn new(scheduler: S) -> Self {
        Self {
            state: LoopState::Idle,
            video: None,
            scheduler,
            pending: None,
            converter: Converter::new(),
            last_source: None,
            last_frame: None,
            frames_published: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Dernière frame publiée par cette lecture.
    #[must_use]
    pub fn current_frame(&self) -> Option<&AsciiFrame> {
        self.last_frame.as_ref()
    }

    /// Frames publiées depuis la création.
    #[must_use]
    pub fn frames_published(&self) -> u64 {
        self.frames_published
    }

    /// Tick en attente, s'il y en a un.
    #[must_use]
    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Vidéo possédée, pour les commandes annexes (seek).
    pub fn video_mut(&mut self) -> Option<&mut V> {
        self.video.as_mut()
    }

    /// Prend possession de `video` et démarre la boucle.
    ///
    /// Une lecture en cours est d'abord arrêtée comme par `stop()`.
    pub fn start(&mut self, mut video: V) {
        if self.state != LoopState::Idle {
            self.stop();
        }
        video.play();
        self.video = Some(video);
        self.transition(LoopState::Running);
        self.schedule();
    }

    /// `Running → Paused`. Retourne `false` si la boucle ne tournait pas.
    pub fn pause(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        self.cancel_pending();
        if let Some(video) = self.video.as_mut() {
            video.pause();
        }
        self.transition(LoopState::Paused);
        true
    }

    /// `Paused → Running`. Retourne `false` si la boucle n'était pas en pause.
    pub fn resume(&mut self) -> bool {
        if self.state != LoopState::Paused {
            return false;
        }
        if let Some(video) = self.video.as_mut() {
            video.play();
        }
        self.transition(LoopState::Running);
        self.schedule();
        true
    }

    /// Bascule pause/lecture.
    pub fn toggle_pause(&mut self) -> bool {
        match self.state {
            LoopState::Running => self.pause(),
            LoopState::Paused => self.resume(),
            LoopState::Idle | LoopState::Stopped => false,
        }
    }

    /// Annule le tick en attente, libère la vidéo, oublie la dernière
    /// frame. Revient toujours à `Idle`.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.video = None;
        self.last_source = None;
        self.last_frame = None;
        self.transition(LoopState::Stopped);
        self.transition(LoopState::Idle);
    }

    /// Exécute le tick `handle`.
    ///
    /// Un handle qui n'est pas le tick en attente de cette boucle est
    /// ignoré : un tick annulé ne publie jamais.
    pub fn on_tick<K: FrameSink + ?Sized>(
        &mut self,
        handle: TickHandle,
        params: &Parameters,
        sink: &mut K,
    ) -> TickOutcome {
        if self.pending != Some(handle) || self.state != LoopState::Running {
            log::debug!("Tick {handle:?} ignoré (attendu {:?})", self.pending);
            return TickOutcome::Stale;
        }
        self.pending = None;

        let Some(video) = self.video.as_mut() else {
            return TickOutcome::Stale;
        };

        let outcome = match video.poll_frame() {
            VideoPoll::Frame(source) => match self.converter.convert(source.as_ref(), params) {
                Ok(frame) => {
                    sink.publish(&frame);
                    self.last_source = Some(source);
                    self.last_frame = Some(frame);
                    self.frames_published += 1;
                    TickOutcome::Published
                }
                Err(e) if e.is_transient() => {
                    log::debug!("Frame ignorée : {e}");
                    TickOutcome::Skipped
                }
                Err(e) => {
                    log::warn!("Conversion impossible : {e}");
                    TickOutcome::Skipped
                }
            },
            VideoPoll::Pending => TickOutcome::Skipped,
            VideoPoll::Paused => {
                self.transition(LoopState::Paused);
                return TickOutcome::Paused;
            }
            VideoPoll::Ended => {
                log::info!("Fin de la vidéo après {} frames", self.frames_published);
                self.transition(LoopState::Paused);
                return TickOutcome::Ended;
            }
        };

        // Tick suivant seulement après publication : un seul tick en vol.
        self.schedule();
        outcome
    }

    /// Reconvertit la dernière frame source avec `params` et la republie.
    ///
    /// Sert quand les paramètres changent alors qu'aucun tick ne viendra
    /// (pause, fin de flux) ou avant le prochain tick. Retourne `Ok(false)`
    /// en `Idle`, sans frame source, ou sur erreur transitoire.
    ///
    /// # Errors
    /// Propage les erreurs non transitoires de la conversion.
    pub fn recompute<K: FrameSink + ?Sized>(
        &mut self,
        params: &Parameters,
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        if !matches!(self.state, LoopState::Running | LoopState::Paused) {
            return Ok(false);
        }
        let Some(source) = self.last_source.as_ref() else {
            return Ok(false);
        };
        match self.converter.convert(source.as_ref(), params) {
            Ok(frame) => {
                sink.publish(&frame);
                self.last_frame = Some(frame);
                Ok(true)
            }
            Err(e) if e.is_transient() => {
                log::debug!("Reconversion ignorée : {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Exécute au plus un tick arrivé à échéance à `now`.
    pub fn pump<K: FrameSink + ?Sized>(
        &mut self,
        now: Instant,
        params: &Parameters,
        sink: &mut K,
    ) -> Option<TickOutcome> {
        let handle = self.scheduler.take_due(now)?;
        Some(self.on_tick(handle, params, sink))
    }

    fn schedule(&mut self) {
        debug_assert!(self.pending.is_none(), "tick déjà en attente");
        self.pending = Some(self.scheduler.schedule_next_tick());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            log::debug!("RenderLoop: {:?} → {next:?}", self.state);
            self.state = next;
        }
    }
}
