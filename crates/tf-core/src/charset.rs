use std::fmt;

use crate::error::CoreError;

/// 10 caractères, du plus dense (sombre) au plus clair. Parité de sortie
/// exigée : ne pas modifier.
pub const DEFAULT_RAMP: &str = "@%#*+=-:. ";

/// 70 caractères — Paul Bourke, dense→clair.
pub const RAMP_DETAILED: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Blocs Unicode — pseudo-pixels.
pub const RAMP_BLOCKS: &str = "█▓▒░ ";

/// Minimal — haut contraste.
pub const RAMP_MINIMAL: &str = "█▓▒░:. ";

/// Presets nommés, sélectionnables depuis la CLI ou le fichier de config.
pub const RAMP_PRESETS: &[(&str, &str)] = &[
    ("default", DEFAULT_RAMP),
    ("detailed", RAMP_DETAILED),
    ("blocks", RAMP_BLOCKS),
    ("minimal", RAMP_MINIMAL),
];

/// Résout un nom de preset, sinon retourne la chaîne telle quelle.
///
/// # Example
/// ```
/// use tf_core::charset::{resolve_ramp, RAMP_BLOCKS};
/// assert_eq!(resolve_ramp("blocks"), RAMP_BLOCKS);
/// assert_eq!(resolve_ramp("#. "), "#. ");
/// ```
#[must_use]
pub fn resolve_ramp(name_or_chars: &str) -> &str {
    RAMP_PRESETS
        .iter()
        .find(|(name, _)| *name == name_or_chars)
        .map_or(name_or_chars, |(_, chars)| chars)
}

/// Rampe de caractères validée, ordonnée du plus sombre au plus clair.
///
/// Chaque `char` occupe une cellule : les rampes Unicode sont indexées par
/// caractère, pas par octet.
///
/// # Example
/// ```
/// use tf_core::charset::Ramp;
/// let ramp = Ramp::new("@. ").unwrap();
/// assert_eq!(ramp.len(), 3);
/// assert_eq!(ramp.char_for(0.0, false), '@');
/// assert_eq!(ramp.char_for(255.0, false), ' ');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ramp {
    chars: Vec<char>,
}

impl Ramp {
    /// Build a ramp from its characters, darkest first.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidRamp` if `chars` is empty.
    pub fn new(chars: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = chars.chars().collect();
        if chars.is_empty() {
            return Err(CoreError::InvalidRamp);
        }
        Ok(Self { chars })
    }

    /// Nombre de caractères (jamais 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always `false`: emptiness is rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Characters in ramp order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Même rampe, ordre inversé.
    ///
    /// # Example
    /// ```
    /// use tf_core::charset::Ramp;
    /// let ramp = Ramp::new("@. ").unwrap();
    /// assert_eq!(ramp.reversed().to_string(), " .@");
    /// ```
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            chars: self.chars.iter().rev().copied().collect(),
        }
    }

    /// Index de rampe pour une luminance : `floor((v / 255) * (n - 1))`,
    /// borné à `[0, n - 1]`. NaN retombe sur 0.
    #[inline]
    #[must_use]
    pub fn index_for(&self, luminance: f64) -> usize {
        let last = self.chars.len() - 1;
        let idx = ((luminance / 255.0) * last as f64).floor();
        (idx.max(0.0) as usize).min(last)
    }

    /// Caractère pour une luminance. Sous `invert`, l'index est reflété
    /// (`n - 1 - index`) sans toucher à la rampe.
    #[inline]
    #[must_use]
    pub fn char_for(&self, luminance: f64, invert: bool) -> char {
        let idx = self.index_for(luminance);
        if invert {
            self.chars[self.chars.len() - 1 - idx]
        } else {
            self.chars[idx]
        }
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            chars: DEFAULT_RAMP.chars().collect(),
        }
    }
}

impl fmt::Display for Ramp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}
