use thiserror::Error;

/// Errors originating from the conversion core.
///
/// # Example
/// ```
/// use tf_core::error::CoreError;
/// let err = CoreError::InvalidDimension { width: 0, height: 0 };
/// assert!(err.is_transient());
/// assert!(!CoreError::InvalidRamp.is_transient());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Source vide (métadonnées pas encore prêtes) ou largeur de sortie nulle.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimension {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Rampe de caractères vide.
    #[error("Rampe de caractères vide")]
    InvalidRamp,

    /// Décodage ou lecture de la source impossible (côté collaborateur).
    #[error("Source indisponible : {0}")]
    SourceUnavailable(String),

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}

impl CoreError {
    /// `true` si l'erreur décrit un état transitoire : l'appelant doit
    /// sauter la conversion sans rien signaler à l'utilisateur.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::InvalidDimension { .. })
    }
}
