use std::fmt;

use crate::error::CoreError;
use crate::traits::PixelSource;

/// Snapshot de pixels. Pré-alloué, réutilisable d'une frame à l'autre.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel. C'est
/// l'implémentation concrète de [`PixelSource`] pour une image décodée
/// comme pour la frame vidéo courante.
///
/// # Example
/// ```
/// use tf_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir transparent aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use tf_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap an existing RGBA buffer.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimension` if `data.len()` is not
    /// `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimension { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build an opaque frame from `[r, g, b]` rows. Rows must share a length.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimension` on ragged rows.
    ///
    /// # Example
    /// ```
    /// use tf_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::from_rgb_rows(&[vec![[0, 0, 0], [255, 255, 255]]]).unwrap();
    /// assert_eq!((fb.width, fb.height), (2, 1));
    /// assert_eq!(fb.pixel(1, 0), (255, 255, 255, 255));
    /// ```
    pub fn from_rgb_rows(rows: &[Vec<[u8; 3]>]) -> Result<Self, CoreError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, Vec::len) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in rows {
            if row.len() as u32 != width {
                return Err(CoreError::InvalidDimension { width, height });
            }
            for &[r, g, b] in row {
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Self::from_rgba(width, height, data)
    }

    /// Frame unie, utile pour les tests et les placeholders.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        fb
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }
}

impl PixelSource for FrameBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgba(&self) -> &[u8] {
        &self.data
    }
}

/// Grille de luminances `[0, 255]`, row-major. Produite par le Sampler.
///
/// # Example
/// ```
/// use tf_core::frame::LuminanceGrid;
/// let mut grid = LuminanceGrid::new(4, 2);
/// grid.set(3, 1, 128.0);
/// assert_eq!(grid.get(3, 1), 128.0);
/// assert_eq!(grid.rows().count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid {
    values: Vec<f64>,
    width: u32,
    height: u32,
}

impl LuminanceGrid {
    /// Grille noire aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            values: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Grille uniforme de valeur `value`.
    #[must_use]
    pub fn uniform(width: u32, height: u32, value: f64) -> Self {
        Self {
            values: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap row-major values.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimension` if `values.len() != width * height`.
    pub fn from_values(width: u32, height: u32, values: Vec<f64>) -> Result<Self, CoreError> {
        if values.len() != width as usize * height as usize {
            return Err(CoreError::InvalidDimension { width, height });
        }
        Ok(Self {
            values,
            width,
            height,
        })
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luminance de la cellule (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Set a cell at position (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: u32, y: u32, value: f64) {
        self.values[y as usize * self.width as usize + x as usize] = value;
    }

    /// Itère ligne par ligne.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panique : une grille de largeur nulle n'a aucune ligne.
        self.values
            .chunks_exact(self.width.max(1) as usize)
            .take(if self.width == 0 { 0 } else { self.height as usize })
    }

    /// Redimensionne sans préserver le contenu. No-op si déjà aux bonnes dimensions.
    pub fn reshape(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.values.clear();
            self.values.resize(width as usize * height as usize, 0.0);
        }
    }

    /// Valeurs brutes, row-major.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Valeurs brutes, mutables.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

/// Rendu texte final : `height` lignes de `width` caractères, chacune
/// terminée par `'\n'`. Seul artefact exposé à la présentation.
///
/// # Example
/// ```
/// use tf_core::frame::AsciiFrame;
/// let mut frame = AsciiFrame::with_width(3);
/// frame.push_line("@#.".chars());
/// assert_eq!(frame.as_str(), "@#.\n");
/// assert_eq!(frame.height(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsciiFrame {
    text: String,
    width: u32,
    height: u32,
}

impl AsciiFrame {
    /// Frame vide (zéro ligne) de largeur `width`.
    #[must_use]
    pub fn with_width(width: u32) -> Self {
        Self {
            text: String::new(),
            width,
            height: 0,
        }
    }

    /// Ajoute une ligne et son terminateur.
    pub fn push_line(&mut self, line: impl IntoIterator<Item = char>) {
        let before = self.text.len();
        self.text.extend(line);
        debug_assert_eq!(
            self.text[before..].chars().count(),
            self.width as usize,
            "line width mismatch"
        );
        self.text.push('\n');
        self.height += 1;
    }

    /// Width in characters.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Nombre de lignes.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texte complet, lignes terminées par `'\n'`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lignes sans terminateur.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for AsciiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
