use std::sync::Arc;
use std::time::Instant;

use crate::frame::{AsciiFrame, FrameBuffer};

/// Grille 2-D de pixels RGBA de dimensions connues.
///
/// Snapshot immuable au moment de l'échantillonnage. Implémenté par
/// `FrameBuffer` (image décodée ou frame vidéo courante).
///
/// # Example
/// ```
/// use tf_core::traits::PixelSource;
/// use tf_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(4, 2);
/// assert_eq!((fb.width(), fb.height()), (4, 2));
/// assert_eq!(fb.rgba().len(), 32);
/// ```
pub trait PixelSource {
    /// Largeur en pixels (0 si les métadonnées ne sont pas prêtes).
    fn width(&self) -> u32;

    /// Hauteur en pixels.
    fn height(&self) -> u32;

    /// Pixels RGBA8, row-major, sans padding : `width * height * 4` bytes.
    fn rgba(&self) -> &[u8];
}

/// Résultat d'un sondage de la vidéo à un tick.
#[derive(Clone, Debug)]
pub enum VideoPoll {
    /// Nouvelle frame décodée depuis le dernier sondage.
    Frame(Arc<FrameBuffer>),
    /// Rien de neuf (décodeur en retard, métadonnées pas prêtes).
    Pending,
    /// La lecture a été mise en pause côté vidéo.
    Paused,
    /// Fin du flux.
    Ended,
}

/// Vidéo en cours de lecture, possédée exclusivement par le contrôleur
/// de boucle. La libérer = la dropper.
///
/// # Example
/// ```
/// use tf_core::traits::{VideoHandle, VideoPoll};
///
/// struct Blank;
/// impl VideoHandle for Blank {
///     fn poll_frame(&mut self) -> VideoPoll { VideoPoll::Ended }
///     fn play(&mut self) {}
///     fn pause(&mut self) {}
/// }
/// ```
pub trait VideoHandle {
    /// Retourne la frame décodée la plus récente, si nouvelle.
    ///
    /// Ne bloque JAMAIS.
    fn poll_frame(&mut self) -> VideoPoll;

    /// Reprendre la lecture.
    fn play(&mut self);

    /// Mettre en pause.
    fn pause(&mut self);

    /// Sauter de `delta` secondes. No-op par défaut.
    fn seek(&mut self, delta: f64) {
        let _ = delta;
    }
}

/// Identifiant d'un tick programmé. Sert aussi de poignée d'annulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(pub u64);

/// Planificateur de ticks annulable, calé sur le rafraîchissement.
///
/// Contrat : un handle annulé ne ressort JAMAIS de `take_due`.
pub trait TickScheduler {
    /// Programme un tick au prochain rafraîchissement.
    fn schedule_next_tick(&mut self) -> TickHandle;

    /// Annule un tick programmé. No-op s'il a déjà été consommé.
    fn cancel(&mut self, handle: TickHandle);

    /// Retire et retourne le plus ancien tick arrivé à échéance à `now`.
    fn take_due(&mut self, now: Instant) -> Option<TickHandle>;

    /// Échéance du prochain tick en attente, s'il y en a un.
    fn next_deadline(&self) -> Option<Instant>;
}

/// Reçoit les `AsciiFrame` publiées (couche présentation).
///
/// Implémenté pour toute closure `FnMut(&AsciiFrame)`.
///
/// # Example
/// ```
/// use tf_core::traits::FrameSink;
/// use tf_core::frame::AsciiFrame;
///
/// let mut count = 0;
/// let mut sink = |_: &AsciiFrame| count += 1;
/// sink.publish(&AsciiFrame::with_width(0));
/// assert_eq!(count, 1);
/// ```
pub trait FrameSink {
    /// Publie une frame complète.
    fn publish(&mut self, frame: &AsciiFrame);
}

impl<F: FnMut(&AsciiFrame)> FrameSink for F {
    fn publish(&mut self, frame: &AsciiFrame) {
        self(frame);
    }
}
