/// Moteur de conversion ASCII pour txtframe.
///
/// `sampler` réduit une source de pixels en grille de luminances,
/// `mapper` transforme cette grille en texte.
pub mod mapper;
pub mod sampler;

use tf_core::config::Parameters;
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, LuminanceGrid};
use tf_core::traits::PixelSource;

pub use mapper::{map_to_ascii, map_with_ramp};
pub use sampler::{Sampler, output_height, sample};

/// Sampler + grille réutilisés d'une conversion à l'autre.
///
/// Une conversion = un échantillonnage puis un mapping, avec les
/// `Parameters` lus au moment de l'appel.
///
/// # Example
/// ```
/// use tf_ascii::Converter;
/// use tf_core::config::Parameters;
/// use tf_core::frame::FrameBuffer;
///
/// let mut converter = Converter::new();
/// let source = FrameBuffer::filled(200, 100, [255, 255, 255]);
/// let frame = converter.convert(&source, &Parameters::default()).unwrap();
/// assert_eq!(frame.height(), 25);
/// assert!(frame.lines().all(|l| l == " ".repeat(100)));
/// ```
pub struct Converter {
    sampler: Sampler,
    grid: LuminanceGrid,
}

impl Converter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sampler: Sampler::new(),
            grid: LuminanceGrid::new(0, 0),
        }
    }

    /// Échantillonne `source` puis mappe vers du texte.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimension` if the source or the requested
    /// width is empty; callers skip the conversion in that case.
    pub fn convert<P: PixelSource + ?Sized>(
        &mut self,
        source: &P,
        params: &Parameters,
    ) -> Result<AsciiFrame, CoreError> {
        self.sampler
            .sample_into(source, params.output_width, &mut self.grid)?;
        Ok(map_with_ramp(&self.grid, &params.ramp, params.invert))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot conversion. Allocates a fresh sampler; prefer `Converter` in a loop.
///
/// # Errors
/// See [`Converter::convert`].
pub fn convert<P: PixelSource + ?Sized>(
    source: &P,
    params: &Parameters,
) -> Result<AsciiFrame, CoreError> {
    Converter::new().convert(source, params)
}
