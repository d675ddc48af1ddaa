use std::path::{Path, PathBuf};

use clap::Parser;
use tf_core::config::RenderConfig;
use tf_source::image::{MediaType, classify_media};

/// txtframe — images et vidéos en texte ASCII dans le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Image source (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Vidéo source. Requiert ffmpeg et ffprobe dans le PATH.
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Largeur de sortie en caractères (40–200).
    #[arg(long)]
    pub width: Option<u32>,

    /// Inverser clair/sombre.
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Rampe de caractères (sombre→clair) ou preset : default, detailed, blocks, minimal.
    #[arg(long)]
    pub ramp: Option<String>,

    /// Cadence de rafraîchissement de la boucle vidéo.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Fichier de configuration TOML, relu à chaque modification.
    /// Les options ci-dessus restent prioritaires. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Convertir l'image une fois et l'écrire sur stdout.
    #[arg(long, default_value_t = false)]
    pub print: bool,

    /// Convertir l'image une fois et l'écrire dans ce fichier.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one visual source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or two sources are given, or if a one-shot
    /// output is requested for a video.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (&self.image, &self.video) {
            (None, None) => {
                anyhow::bail!("Aucune source visuelle spécifiée. Utilisez --image ou --video.");
            }
            (Some(_), Some(_)) => {
                anyhow::bail!("Une seule source visuelle à la fois : --image OU --video.");
            }
            (None, Some(_)) if self.is_one_shot() => {
                anyhow::bail!("--print et --output ne s'appliquent qu'à --image.");
            }
            (Some(path), None) => check_media(path, MediaType::Image),
            (None, Some(path)) => check_media(path, MediaType::Video),
        }
    }

    /// `--print` ou `--output` : pas de terminal interactif.
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.print || self.output.is_some()
    }

    /// Options qui priment sur le fichier de configuration.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            width: self.width,
            invert: self.invert,
            ramp: self.ramp.clone(),
            fps: self.fps,
        }
    }

    /// Applique les overrides de la ligne de commande, puis re-borne.
    pub fn apply_overrides(&self, config: &mut RenderConfig) {
        self.overrides().apply(config);
    }
}

/// Valeurs de la ligne de commande, réappliquées après chaque rechargement
/// de la config.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub width: Option<u32>,
    pub invert: bool,
    pub ramp: Option<String>,
    pub fps: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if self.invert {
            config.invert = true;
        }
        if let Some(ref ramp) = self.ramp {
            config.ramp.clone_from(ramp);
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        config.clamp_all();
    }
}

/// Refuse une vidéo passée à `--image` et inversement. Une extension
/// inconnue est tentée quand même.
fn check_media(path: &Path, expected: MediaType) -> anyhow::Result<()> {
    match classify_media(path) {
        Some(kind) if kind != expected => anyhow::bail!(
            "{} est de type {kind:?}, attendu {expected:?}.",
            path.display()
        ),
        Some(_) => Ok(()),
        None => {
            log::warn!("Extension non reconnue : {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("txtframe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn exactly_one_source() {
        assert!(parse(&[]).validate_source().is_err());
        assert!(parse(&["--image", "a.png", "--video", "b.mp4"]).validate_source().is_err());
        assert!(parse(&["--image", "a.png"]).validate_source().is_ok());
        assert!(parse(&["--video", "b.mp4"]).validate_source().is_ok());
    }

    #[test]
    fn source_kind_must_match_flag() {
        assert!(parse(&["--image", "clip.mp4"]).validate_source().is_err());
        assert!(parse(&["--video", "photo.jpg"]).validate_source().is_err());
        assert!(parse(&["--image", "scan.unknown"]).validate_source().is_ok());
    }

    #[test]
    fn one_shot_needs_image() {
        assert!(parse(&["--video", "b.mp4", "--print"]).validate_source().is_err());
        let cli = parse(&["--image", "a.png", "--output", "out.txt"]);
        assert!(cli.is_one_shot());
        assert!(cli.validate_source().is_ok());
    }

    #[test]
    fn overrides_are_clamped() {
        let cli = parse(&["--image", "a.png", "--width", "999", "--invert", "--ramp", "blocks"]);
        let mut config = RenderConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.width, 200);
        assert!(config.invert);
        assert_eq!(config.ramp, "blocks");
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let overrides = parse(&["--image", "a.png"]).overrides();
        assert_eq!(overrides, Overrides::default());
        let mut config = RenderConfig {
            width: 150,
            ..RenderConfig::default()
        };
        overrides.apply(&mut config);
        assert_eq!(config.width, 150);
    }

    #[test]
    fn defaults() {
        let cli = parse(&["--image", "a.png"]);
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        assert_eq!(cli.log_level, "warn");
        assert!(!cli.is_one_shot());
    }
}
