/// Types partagés, traits et configuration pour txtframe.
///
/// Ce crate ne fait aucune I/O hormis la lecture du fichier de config :
/// le Sampler, le Mapper et le contrôleur de boucle ne dépendent que de lui.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::{DEFAULT_RAMP, Ramp};
pub use config::{Parameters, RenderConfig};
pub use error::CoreError;
pub use frame::{AsciiFrame, FrameBuffer, LuminanceGrid};
