use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tf_core::config::RenderConfig;

use crate::cli::Overrides;

/// Lance un watcher sur le fichier config ; chaque modification valide
/// remplace la config dans l'`ArcSwap`, `overrides` réappliqués par-dessus.
///
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<RenderConfig>>,
    overrides: Overrides,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        {
            reload_into(&path, &config, &overrides);
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    log::debug!("Surveillance de {}", config_path.display());
    Ok(watcher)
}

/// Relit `path` et publie la nouvelle config si elle est valide et différente.
///
/// Retourne `true` si la config a été remplacée. Une config invalide est
/// ignorée : l'ancienne reste active.
pub fn reload_into(
    path: &Path,
    config: &ArcSwap<RenderConfig>,
    overrides: &Overrides,
) -> bool {
    match tf_core::config::load_config(path) {
        Ok(mut new_config) => {
            overrides.apply(&mut new_config);
            if **config.load() == new_config {
                return false;
            }
            config.store(Arc::new(new_config));
            log::info!("Config rechargée depuis {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("Erreur de rechargement config : {e:#}");
            false
        }
    }
}
