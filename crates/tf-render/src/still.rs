use tf_ascii::Converter;
use tf_core::config::Parameters;
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, FrameBuffer};
use tf_core::traits::FrameSink;

/// Chemin image fixe : une source, reconvertie à chaque changement de
/// paramètres.
///
/// # Example
/// ```
/// use tf_core::config::Parameters;
/// use tf_core::frame::{AsciiFrame, FrameBuffer};
/// use tf_render::still::StillRenderer;
///
/// let mut still = StillRenderer::new();
/// still.set_source(FrameBuffer::filled(200, 100, [0, 0, 0]));
/// let mut shown = None;
/// still.recompute(&Parameters::default(), &mut |f: &AsciiFrame| shown = Some(f.clone())).unwrap();
/// assert_eq!(shown.unwrap().height(), 25);
/// ```
pub struct StillRenderer {
    source: Option<FrameBuffer>,
    converter: Converter,
    current: Option<AsciiFrame>,
    conversions: u64,
}

impl StillRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            converter: Converter::new(),
            current: None,
            conversions: 0,
        }
    }

    /// Remplace la source. La frame affichée reste jusqu'au prochain `recompute`.
    pub fn set_source(&mut self, source: FrameBuffer) {
        log::debug!("Image fixe : {}x{}", source.width, source.height);
        self.source = Some(source);
    }

    #[must_use]
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Reconvertit la source avec `params` et publie le résultat.
    ///
    /// Retourne `Ok(false)` sans source, ou quand la conversion est
    /// ignorée (dimension nulle) : la frame précédente reste affichée.
    ///
    /// # Errors
    /// Propage les erreurs non transitoires de la conversion.
    pub fn recompute<K: FrameSink + ?Sized>(
        &mut self,
        params: &Parameters,
        sink: &mut K,
    ) -> Result<bool, CoreError> {
        let Some(source) = self.source.as_ref() else {
            return Ok(false);
        };
        match self.converter.convert(source, params) {
            Ok(frame) => {
                sink.publish(&frame);
                self.current = Some(frame);
                self.conversions += 1;
                Ok(true)
            }
            Err(e) if e.is_transient() => {
                log::debug!("Conversion ignorée : {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Oublie source et frame.
    pub fn clear(&mut self) {
        self.source = None;
        self.current = None;
    }

    #[must_use]
    pub fn current_frame(&self) -> Option<&AsciiFrame> {
        self.current.as_ref()
    }

    /// Nombre de conversions réussies.
    #[must_use]
    pub fn conversions(&self) -> u64 {
        self.conversions
    }
}

impl Default for StillRenderer {
    fn default() -> Self {
        Self::new()
    }
}
