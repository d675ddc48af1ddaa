use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use tf_core::error::CoreError;
use tf_core::frame::LuminanceGrid;
use tf_core::traits::PixelSource;

/// Correction verticale : une cellule texte est ~2× plus haute que large.
///
/// Constante figée (parité de sortie). La hauteur de ligne et la taille de
/// police côté affichage n'ont aucune influence ici.
pub const CELL_ASPECT_CORRECTION: f64 = 0.5;

/// Hauteur de sortie dérivée : `floor(src_h * (out_w / src_w) * 0.5)`.
///
/// # Example
/// ```
/// use tf_ascii::sampler::output_height;
/// assert_eq!(output_height(2, 2, 2), 1);
/// assert_eq!(output_height(1920, 1080, 100), 28);
/// ```
#[inline]
#[must_use]
pub fn output_height(src_width: u32, src_height: u32, output_width: u32) -> u32 {
    if src_width == 0 {
        return 0;
    }
    let scale = f64::from(output_width) / f64::from(src_width);
    (f64::from(src_height) * scale * CELL_ASPECT_CORRECTION).floor() as u32
}

/// Sampler réutilisable wrappant fast_image_resize.
///
/// Rééchantillonne la source en filtre boîte (moyenne de surface) vers
/// `output_width × output_height`, puis moyenne R, G, B par cellule.
/// Les buffers internes sont un détail d'implémentation : aucun état
/// observable ne survit entre deux appels.
///
/// # Example
/// ```
/// use tf_ascii::sampler::Sampler;
/// use tf_core::frame::FrameBuffer;
///
/// let mut sampler = Sampler::new();
/// let src = FrameBuffer::filled(8, 8, [30, 60, 90]);
/// let grid = sampler.sample(&src, 4).unwrap();
/// assert_eq!((grid.width(), grid.height()), (4, 2));
/// assert!((grid.get(0, 0) - 60.0).abs() < 0.5);
/// ```
pub struct Sampler {
    inner: Resizer,
    options: ResizeOptions,
    /// Scratch source (fast_image_resize exige `&mut` sur la source).
    src_buf: Vec<u8>,
    /// Scratch destination RGBA.
    dst_buf: Vec<u8>,
}

impl Sampler {
    /// Create a new sampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
            src_buf: Vec::new(),
            dst_buf: Vec::new(),
        }
    }

    /// Échantillonne `source` dans une grille neuve.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimension` if the source has a zero
    /// dimension, a pixel buffer of the wrong size, or `output_width == 0`.
    pub fn sample<P: PixelSource + ?Sized>(
        &mut self,
        source: &P,
        output_width: u32,
    ) -> Result<LuminanceGrid, CoreError> {
        let mut grid = LuminanceGrid::new(0, 0);
        self.sample_into(source, output_width, &mut grid)?;
        Ok(grid)
    }

    /// Échantillonne `source` dans `grid`, redimensionnée au besoin.
    ///
    /// En cas d'erreur, `grid` n'est pas modifiée.
    ///
    /// # Errors
    /// See [`Sampler::sample`].
    pub fn sample_into<P: PixelSource + ?Sized>(
        &mut self,
        source: &P,
        output_width: u32,
        grid: &mut LuminanceGrid,
    ) -> Result<(), CoreError> {
        let (src_w, src_h) = (source.width(), source.height());
        if src_w == 0 || src_h == 0 || output_width == 0 {
            return Err(CoreError::InvalidDimension {
                width: if output_width == 0 { 0 } else { src_w },
                height: src_h,
            });
        }
        let pixels = source.rgba();
        if pixels.len() != src_w as usize * src_h as usize * 4 {
            return Err(CoreError::InvalidDimension {
                width: src_w,
                height: src_h,
            });
        }

        let out_h = output_height(src_w, src_h, output_width);
        if out_h == 0 {
            grid.reshape(output_width, 0);
            return Ok(());
        }

        self.resize(pixels, (src_w, src_h), (output_width, out_h))?;

        grid.reshape(output_width, out_h);
        for (cell, px) in grid.values_mut().iter_mut().zip(self.dst_buf.chunks_exact(4)) {
            let sum = u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2]);
            *cell = f64::from(sum) / 3.0;
        }
        Ok(())
    }

    fn resize(
        &mut self,
        pixels: &[u8],
        (src_w, src_h): (u32, u32),
        (dst_w, dst_h): (u32, u32),
    ) -> Result<(), CoreError> {
        // R1: copie forcée par l'API fast_image_resize (requiert &mut sur la source)
        self.src_buf.clear();
        self.src_buf.extend_from_slice(pixels);
        self.dst_buf.clear();
        self.dst_buf.resize(dst_w as usize * dst_h as usize * 4, 0);

        let invalid = |width, height| CoreError::InvalidDimension { width, height };

        let src_image = Image::from_slice_u8(src_w, src_h, &mut self.src_buf, PixelType::U8x4)
            .map_err(|_| invalid(src_w, src_h))?;
        let mut dst_image =
            Image::from_slice_u8(dst_w, dst_h, &mut self.dst_buf, PixelType::U8x4)
                .map_err(|_| invalid(dst_w, dst_h))?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| {
                log::warn!("Resize {src_w}x{src_h} → {dst_w}x{dst_h} échoué : {e}");
                invalid(dst_w, dst_h)
            })
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for one-shot usage. DO NOT use in hot path.
///
/// # Errors
/// See [`Sampler::sample`].
///
/// # Example
/// ```
/// use tf_ascii::sampler::sample;
/// use tf_core::frame::FrameBuffer;
/// let grid = sample(&FrameBuffer::filled(10, 10, [255, 0, 0]), 10).unwrap();
/// assert_eq!(grid.height(), 5);
/// assert!((grid.get(9, 4) - 85.0).abs() < 0.5);
/// ```
pub fn sample<P: PixelSource + ?Sized>(
    source: &P,
    output_width: u32,
) -> Result<LuminanceGrid, CoreError> {
    Sampler::new().sample(source, output_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::frame::FrameBuffer;

    #[test]
    fn zero_width_source() {
        let err = sample(&FrameBuffer::new(0, 4), 10).unwrap_err();
        assert_eq!(err, CoreError::InvalidDimension { width: 0, height: 4 });
    }

    #[test]
    fn zero_height_source() {
        assert!(sample(&FrameBuffer::new(4, 0), 10).is_err());
    }

    #[test]
    fn zero_output_width() {
        let err = sample(&FrameBuffer::filled(4, 4, [1, 1, 1]), 0).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn truncated_buffer_rejected() {
        let mut fb = FrameBuffer::filled(4, 4, [1, 1, 1]);
        fb.data.truncate(10);
        assert!(sample(&fb, 4).is_err());
    }

    #[test]
    fn failed_sample_leaves_grid_untouched() {
        let mut sampler = Sampler::new();
        let mut grid = LuminanceGrid::uniform(3, 1, 42.0);
        assert!(
            sampler
                .sample_into(&FrameBuffer::new(0, 0), 3, &mut grid)
                .is_err()
        );
        assert_eq!(grid.values(), &[42.0, 42.0, 42.0]);
    }

    #[test]
    fn flat_source_collapses_to_zero_rows() {
        // 100×1 à largeur 100 : floor(1 * 1 * 0.5) = 0.
        let grid = sample(&FrameBuffer::filled(100, 1, [9, 9, 9]), 100).unwrap();
        assert_eq!((grid.width(), grid.height()), (100, 0));
        assert_eq!(grid.rows().count(), 0);
    }

    #[test]
    fn checkerboard_averages_columns() {
        let src = FrameBuffer::from_rgb_rows(&[
            vec![[0, 0, 0], [255, 255, 255]],
            vec![[255, 255, 255], [0, 0, 0]],
        ])
        .unwrap();
        let grid = sample(&src, 2).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 1));
        for x in 0..2 {
            assert!((grid.get(x, 0) - 127.5).abs() <= 0.5, "{}", grid.get(x, 0));
        }
    }

    #[test]
    fn uniform_source_keeps_channel_mean() {
        let grid = sample(&FrameBuffer::filled(64, 32, [10, 20, 60]), 16).unwrap();
        assert_eq!((grid.width(), grid.height()), (16, 4));
        assert!(grid.values().iter().all(|&v| (v - 30.0).abs() < 1.0));
    }

    #[test]
    fn channel_mean_per_column() {
        // Deux lignes identiques, largeur conservée : seule la moyenne RGB compte.
        let rows: Vec<Vec<[u8; 3]>> = (0..2)
            .map(|_| vec![[1, 2, 3], [255, 0, 0], [0, 255, 255], [7, 7, 7]])
            .collect();
        let src = FrameBuffer::from_rgb_rows(&rows).unwrap();
        let grid = sample(&src, 4).unwrap();
        assert_eq!(grid.height(), 1);
        assert!((grid.get(0, 0) - 2.0).abs() < 0.5);
        assert!((grid.get(1, 0) - 85.0).abs() < 0.5);
        assert!((grid.get(2, 0) - 170.0).abs() < 0.5);
        assert!((grid.get(3, 0) - 7.0).abs() < 0.5);
    }

    #[test]
    fn output_height_formula() {
        assert_eq!(output_height(0, 10, 10), 0);
        assert_eq!(output_height(640, 480, 100), 37);
        assert_eq!(output_height(100, 1, 100), 0);
        assert_eq!(output_height(1, 1, 200), 100);
    }
}
