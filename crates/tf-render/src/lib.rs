/// Boucle de rendu et présentation terminal pour txtframe.
///
/// `scheduler` fournit les ticks annulables, `player` pilote la boucle
/// vidéo, `still` le chemin image fixe, `session` arbitre entre les deux.
pub mod player;
pub mod scheduler;
pub mod session;
pub mod still;
pub mod ui;

#[cfg(test)]
mod testing;

pub use player::{LoopState, RenderLoop, TickOutcome};
pub use scheduler::RefreshScheduler;
pub use session::{Mode, Session};
pub use still::StillRenderer;
pub use ui::Status;
