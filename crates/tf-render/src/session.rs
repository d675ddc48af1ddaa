use std::time::Instant;

use tf_core::config::Parameters;
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, FrameBuffer};
use tf_core::traits::{FrameSink, TickScheduler, VideoHandle};

use crate::player::{LoopState, RenderLoop, TickOutcome};
use crate::still::StillRenderer;

/// Source active d'une session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Rien de chargé.
    Empty,
    /// Image fixe.
    Image,
    /// Lecture vidéo.
    Video,
}

/// Point d'entrée unique de la présentation.
///
/// Possède les `Parameters`, le chemin image fixe et la boucle vidéo. Un
/// seul des deux chemins est actif ; changer de mode réinitialise tout
/// avant de démarrer l'autre.
///
/// # Example
/// ```
/// use tf_core::config::Parameters;
/// use tf_core::frame::{AsciiFrame, FrameBuffer};
/// use tf_core::traits::{VideoHandle, VideoPoll};
/// use tf_render::scheduler::RefreshScheduler;
/// use tf_render::session::{Mode, Session};
///
/// struct NoVideo;
/// impl VideoHandle for NoVideo {
///     fn poll_frame(&mut self) -> VideoPoll { VideoPoll::Ended }
///     fn play(&mut self) {}
///     fn pause(&mut self) {}
/// }
///
/// let mut session: Session<NoVideo, _> =
///     Session::new(Parameters::default(), RefreshScheduler::new(30));
/// let mut sink = |_: &AsciiFrame| {};
/// session.load_image(FrameBuffer::filled(200, 100, [0, 0, 0]), &mut sink).unwrap();
/// assert_eq!(session.mode(), Mode::Image);
///
/// session.update_params(|p| { p.step_width(1); }, &mut sink).unwrap();
/// assert_eq!(session.current_frame().unwrap().width(), 110);
/// ```
pub struct Session<V, S> {
    params: Parameters,
    mode: Mode,
    still: StillRenderer,
    player: RenderLoop<V, S>,
}

impl<V: VideoHandle, S: TickScheduler> Session<V, S> {
    #[must_use]
    pub fn new(params: Parameters, scheduler: S) -> Self {
        Self {
            params,
            mode: Mode::Empty,
            still: StillRenderer::new(),
            player: RenderLoop::new(scheduler),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    #[must_use]
    pub fn player(&self) -> &RenderLoop<V, S> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut RenderLoop<V, S> {
        &mut self.player
    }

    #[must_use]
    pub fn still(&self) -> &StillRenderer {
        &self.still
    }

    /// État de la boucle vidéo (`Idle` hors mode vidéo).
    #[must_use]
    pub fn loop_state(&self) -> LoopState {
        self.player.state()
    }

    /// Passe en mode image et convertit `source` immédiatement.
    ///
    /// # Errors
    /// Propage les erreurs non transitoires de la conversion.
    pub fn load_image<K: FrameSink + ?Sized>(
        &mut self,
        source: FrameBuffer,
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        if self.mode == Mode::Video {
            self.reset();
        }
        self.still.set_source(source);
        self.mode = Mode::Image;
        self.recompute(sink)
    }

    /// Passe en mode vidéo et démarre la boucle sur `video`.
    pub fn load_video(&mut self, video: V) {
        if self.mode == Mode::Image {
            self.reset();
        }
        self.player.start(video);
        self.mode = Mode::Video;
    }

    /// Reconversion explicite après un changement de source ou de paramètres.
    ///
    /// En mode vidéo, la dernière frame source est reconvertie : en pause
    /// ou après la fin du flux aucun tick ne le ferait.
    ///
    /// # Errors
    /// Propage les erreurs non transitoires de la conversion.
    pub fn recompute<K: FrameSink + ?Sized>(&mut self, sink: &mut K) -> Result<bool, CoreError> {
        match self.mode {
            Mode::Image => self.still.recompute(&self.params, sink),
            Mode::Video => self.player.recompute(&self.params, sink),
            Mode::Empty => Ok(false),
        }
    }

    /// Modifie les paramètres puis reconvertit s'ils ont changé.
    ///
    /// # Errors
    /// See [`Session::recompute`].
    pub fn update_params<K: FrameSink + ?Sized>(
        &mut self,
        f: impl FnOnce(&mut Parameters),
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        let before = self.params.clone();
        f(&mut self.params);
        if self.params == before {
            return Ok(false);
        }
        log::debug!(
            "Paramètres : largeur={} invert={}",
            self.params.output_width,
            self.params.invert
        );
        self.recompute(sink)
    }

    /// Remplace tous les paramètres (rechargement de configuration).
    ///
    /// # Errors
    /// See [`Session::recompute`].
    pub fn set_params<K: FrameSink + ?Sized>(
        &mut self,
        params: Parameters,
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        self.update_params(|p| *p = params, sink)
    }

    /// Largeur et inversion par défaut.
    ///
    /// # Errors
    /// See [`Session::recompute`].
    pub fn reset_parameters<K: FrameSink + ?Sized>(
        &mut self,
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        self.update_params(Parameters::reset, sink)
    }

    /// Arrête la vidéo, oublie l'image, revient à `Mode::Empty`.
    pub fn reset(&mut self) {
        self.player.stop();
        self.still.clear();
        if self.mode != Mode::Empty {
            log::debug!("Session : {:?} → Empty", self.mode);
        }
        self.mode = Mode::Empty;
    }

    /// Exécute au plus un tick vidéo échu.
    pub fn pump<K: FrameSink + ?Sized>(&mut self, now: Instant, sink: &mut K) -> Option<TickOutcome> {
        if self.mode != Mode::Video {
            return None;
        }
        self.player.pump(now, &self.params, sink)
    }

    /// Prochaine échéance de tick, pour dormir jusque-là.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.player.scheduler().next_deadline()
    }

    /// Frame affichée par le mode actif.
    #[must_use]
    pub fn current_frame(&self) -> Option<&AsciiFrame> {
        match self.mode {
            Mode::Image => self.still.current_frame(),
            Mode::Video => self.player.current_frame(),
            Mode::Empty => None,
        }
    }

    /// Pause/lecture en mode vidéo.
    pub fn toggle_pause(&mut self) -> bool {
        self.mode == Mode::Video && self.player.toggle_pause()
    }

    /// Déplacement relatif en secondes dans la vidéo.
    pub fn seek(&mut self, delta: f64) {
        if self.mode != Mode::Video {
            return;
        }
        if let Some(video) = self.player.video_mut() {
            video.seek(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::scheduler::RefreshScheduler;
    use crate::testing::{Probe, ScriptedVideo, far, frame};
    use tf_core::charset::Ramp;
    use tf_core::traits::VideoPoll;

    type TestSession = Session<ScriptedVideo, RefreshScheduler>;

    fn session() -> TestSession {
        Session::new(
            Parameters::new(10, false, Ramp::default()),
            RefreshScheduler::new(60),
        )
    }

    fn dark_video(frames: usize) -> (ScriptedVideo, Probe) {
        ScriptedVideo::new((0..frames).map(|_| VideoPoll::Frame(frame(10, 10, 0))).collect())
    }

    #[test]
    fn starts_empty() {
        let s = session();
        assert_eq!(s.mode(), Mode::Empty);
        assert!(s.current_frame().is_none());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn switch_to_image_mid_playback() {
        let mut s = session();
        let (video, probe) = dark_video(10);
        let mut out: Vec<AsciiFrame> = Vec::new();
        let mut sink = |f: &AsciiFrame| out.push(f.clone());

        s.load_video(video);
        assert_eq!(s.pump(far(), &mut sink), Some(TickOutcome::Published));
        assert_eq!(s.loop_state(), LoopState::Running);

        let white = FrameBuffer::filled(10, 10, [255, 255, 255]);
        assert!(s.load_image(white, &mut sink).unwrap());
        assert_eq!(s.mode(), Mode::Image);
        assert_eq!(s.loop_state(), LoopState::Idle);
        assert!(probe.dropped());
        assert!(s.next_deadline().is_none());

        // Plus aucune frame vidéo, même en pompant.
        assert_eq!(s.pump(far(), &mut sink), None);
        assert_eq!(out.len(), 2);
        assert!(out[0].lines().all(|l| l == "@".repeat(10)));
        assert!(out[1].lines().all(|l| l == " ".repeat(10)));
        assert_eq!(s.current_frame(), Some(&out[1]));
        assert_eq!(s.still().conversions(), 1);
    }

    #[test]
    fn switch_to_video_clears_image() {
        let mut s = session();
        let mut sink = |_: &AsciiFrame| {};
        s.load_image(FrameBuffer::filled(10, 10, [0, 0, 0]), &mut sink)
            .unwrap();
        let (video, _probe) = dark_video(0);
        s.load_video(video);
        assert_eq!(s.mode(), Mode::Video);
        assert!(!s.still().has_source());
        // Aucune frame vidéo encore publiée.
        assert!(s.current_frame().is_none());
    }

    #[test]
    fn parameter_changes_recompute_image() {
        let mut s = session();
        let count = Cell::new(0);
        let mut sink = |_: &AsciiFrame| count.set(count.get() + 1);
        s.load_image(FrameBuffer::filled(20, 20, [0, 0, 0]), &mut sink)
            .unwrap();
        assert!(s.update_params(Parameters::toggle_invert, &mut sink).unwrap());
        // Aucun changement effectif : pas de reconversion.
        assert!(!s.update_params(|p| p.invert = true, &mut sink).unwrap());
        assert!(s.reset_parameters(&mut sink).unwrap());
        assert_eq!(s.params().output_width, 100);
        assert!(!s.params().invert);
        assert_eq!(count.get(), 3);

        // Vidéo sans frame publiée : rien à reconvertir.
        let (video, _probe) = dark_video(1);
        s.load_video(video);
        assert!(!s.update_params(|p| p.output_width = 50, &mut sink).unwrap());
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn parameter_change_after_video_end_redraws_last_frame() {
        let mut s = session();
        let (video, _probe) = ScriptedVideo::new(vec![
            VideoPoll::Frame(frame(100, 100, 0)),
            VideoPoll::Ended,
        ]);
        let mut sink = |_: &AsciiFrame| {};
        s.load_video(video);
        s.update_params(|p| p.output_width = 100, &mut sink).unwrap();
        assert_eq!(s.pump(far(), &mut sink), Some(TickOutcome::Published));
        assert_eq!(s.pump(far(), &mut sink), Some(TickOutcome::Ended));
        assert_eq!(s.loop_state(), LoopState::Paused);

        assert!(s
            .update_params(
                |p| {
                    p.output_width = 40;
                    p.invert = true;
                },
                &mut sink,
            )
            .unwrap());
        let shown = s.current_frame().unwrap();
        assert_eq!((shown.width(), shown.height()), (40, 20));
        assert_eq!(shown.lines().next(), Some(" ".repeat(40).as_str()));
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn parameter_change_during_user_pause_redraws_last_frame() {
        let mut s = session();
        let (video, _probe) = dark_video(5);
        let mut out: Vec<AsciiFrame> = Vec::new();
        let mut sink = |f: &AsciiFrame| out.push(f.clone());
        s.load_video(video);
        assert_eq!(s.pump(far(), &mut sink), Some(TickOutcome::Published));
        assert!(s.toggle_pause());

        assert!(s.update_params(Parameters::toggle_invert, &mut sink).unwrap());
        assert!(s.reset_parameters(&mut sink).unwrap());
        assert_eq!(s.loop_state(), LoopState::Paused);
        assert_eq!(out.len(), 3);
        assert!(out[1].lines().all(|l| l == " ".repeat(10)));
        assert_eq!((out[2].width(), out[2].height()), (100, 50));
        assert_eq!(s.current_frame(), Some(&out[2]));
        assert_eq!(s.player().frames_published(), 1);
    }

    #[test]
    fn degenerate_image_keeps_previous_frame() {
        let mut s = session();
        let mut sink = |_: &AsciiFrame| {};
        s.load_image(FrameBuffer::filled(10, 10, [0, 0, 0]), &mut sink)
            .unwrap();
        let before = s.current_frame().cloned();
        assert!(!s.load_image(FrameBuffer::new(0, 4), &mut sink).unwrap());
        assert_eq!(s.current_frame().cloned(), before);
    }

    #[test]
    fn pause_and_seek_only_in_video_mode() {
        let mut s = session();
        assert!(!s.toggle_pause());
        s.seek(5.0);

        let (video, probe) = dark_video(0);
        s.load_video(video);
        s.seek(-5.0);
        assert_eq!(probe.seeks(), 1);
        assert!(s.toggle_pause());
        assert_eq!(s.loop_state(), LoopState::Paused);
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut s = session();
        let (video, probe) = dark_video(3);
        s.load_video(video);
        s.reset();
        assert_eq!(s.mode(), Mode::Empty);
        assert_eq!(s.loop_state(), LoopState::Idle);
        assert!(probe.dropped());
    }
}
