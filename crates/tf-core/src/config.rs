use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{self, Ramp};
use crate::error::CoreError;

/// Largeur de sortie par défaut (caractères).
pub const DEFAULT_WIDTH: u32 = 100;
/// Borne basse du réglage de largeur.
pub const WIDTH_MIN: u32 = 40;
/// Borne haute du réglage de largeur.
pub const WIDTH_MAX: u32 = 200;
/// Pas du réglage de largeur.
pub const WIDTH_STEP: u32 = 10;
/// Cadence de rafraîchissement par défaut.
pub const DEFAULT_FPS: u32 = 60;

/// Paramètres de conversion actifs, passés par référence au Sampler et au
/// Mapper. Muté uniquement par la présentation.
///
/// La hauteur de sortie n'est jamais stockée : elle dérive de la largeur
/// et du ratio de la source.
///
/// # Example
/// ```
/// use tf_core::config::Parameters;
/// let mut params = Parameters::default();
/// assert_eq!(params.output_width, 100);
/// params.step_width(2);
/// assert_eq!(params.output_width, 120);
/// params.reset();
/// assert_eq!(params.output_width, 100);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Largeur de sortie en caractères.
    pub output_width: u32,
    /// Inverser l'association clair/sombre.
    pub invert: bool,
    /// Rampe, du plus sombre au plus clair.
    pub ramp: Ramp,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            output_width: DEFAULT_WIDTH,
            invert: false,
            ramp: Ramp::default(),
        }
    }
}

impl Parameters {
    #[must_use]
    pub fn new(output_width: u32, invert: bool, ramp: Ramp) -> Self {
        Self {
            output_width,
            invert,
            ramp,
        }
    }

    /// Déplace la largeur de `steps` crans de `WIDTH_STEP`, bornée à
    /// `[WIDTH_MIN, WIDTH_MAX]`. Retourne `true` si la largeur a changé.
    pub fn step_width(&mut self, steps: i32) -> bool {
        let target = i64::from(self.output_width) + i64::from(steps) * i64::from(WIDTH_STEP);
        let target = target.clamp(i64::from(WIDTH_MIN), i64::from(WIDTH_MAX)) as u32;
        let changed = target != self.output_width;
        self.output_width = target;
        changed
    }

    /// Bascule l'inversion de contraste.
    pub fn toggle_invert(&mut self) {
        self.invert = !self.invert;
    }

    /// Restaure largeur et inversion par défaut. La rampe configurée est conservée.
    pub fn reset(&mut self) {
        self.output_width = DEFAULT_WIDTH;
        self.invert = false;
    }
}

/// Configuration complète, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use tf_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.width, 100);
/// assert_eq!(config.ramp, "@%#*+=-:. ");
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RenderConfig {
    /// Largeur de sortie en caractères.
    pub width: u32,
    /// Inverser la luminance.
    pub invert: bool,
    /// Rampe (caractères, sombre→clair) ou nom de preset.
    pub ramp: String,
    /// Cadence cible de la boucle vidéo.
    pub target_fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            invert: false,
            ramp: charset::DEFAULT_RAMP.to_string(),
            target_fps: DEFAULT_FPS,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    pub fn clamp_all(&mut self) {
        self.width = self.width.clamp(WIDTH_MIN, WIDTH_MAX);
        self.target_fps = self.target_fps.clamp(1, 240);
    }

    /// Construit les `Parameters` validés.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidRamp` if the resolved ramp is empty.
    ///
    /// # Example
    /// ```
    /// use tf_core::config::RenderConfig;
    /// let mut config = RenderConfig::default();
    /// config.ramp = "blocks".into();
    /// let params = config.parameters().unwrap();
    /// assert_eq!(params.ramp.len(), 5);
    /// ```
    pub fn parameters(&self) -> Result<Parameters, CoreError> {
        let ramp = Ramp::new(charset::resolve_ramp(&self.ramp))?;
        Ok(Parameters::new(self.width, self.invert, ramp))
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    display: Option<DisplaySection>,
}

#[derive(Deserialize)]
struct RenderSection {
    width: Option<u32>,
    invert: Option<bool>,
    ramp: Option<String>,
}

#[derive(Deserialize)]
struct DisplaySection {
    target_fps: Option<u32>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// La rampe est validée ici : une rampe vide est une erreur de
/// configuration, jamais une erreur de conversion.
///
/// # Errors
/// Returns an error if the TOML is malformed or the ramp is empty.
///
/// # Example
/// ```
/// use tf_core::config::parse_config;
/// let config = parse_config("[render]\nwidth = 120\n").unwrap();
/// assert_eq!(config.width, 120);
/// assert!(!config.invert);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;

    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.width {
            config.width = v;
        }
        if let Some(v) = r.invert {
            config.invert = v;
        }
        if let Some(v) = r.ramp {
            config.ramp = v;
        }
    }
    if let Some(d) = file.display
        && let Some(v) = d.target_fps
    {
        config.target_fps = v;
    }

    config.clamp_all();
    config.parameters()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if its ramp is empty.
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config =
        parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))?;
    log::debug!("Config chargée depuis {} : {config:?}", path.display());
    Ok(config)
}
