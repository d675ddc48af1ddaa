use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use clap::Parser;
use tf_core::config::RenderConfig;

pub mod app;
pub mod cli;
pub mod export;
pub mod hotreload;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    let params = config.parameters()?;

    // 5. Sortie one-shot : pas de terminal
    if cli.is_one_shot() {
        return run_one_shot(&cli, &params);
    }

    let config = Arc::new(ArcSwap::from_pointee(config));

    // 6. Hot-reload config (thread interne notify)
    let _watcher = if cli.config.exists() {
        Some(hotreload::spawn_config_watcher(
            &cli.config,
            &config,
            cli.overrides(),
        )?)
    } else {
        None
    };

    // 7. Ouvrir la source avant de prendre le terminal : les erreurs restent lisibles
    let mut app_instance = app::App::new(config, std::env::current_dir()?)?;
    app_instance.open(cli.image.as_deref(), cli.video.as_deref())?;

    // 8. Initialiser le terminal ratatui
    let terminal = ratatui::init();

    // 9. Boucle principale
    let result = app_instance.run(terminal);

    // 10. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

/// `--print` / `--output` : une seule conversion de l'image.
fn run_one_shot(cli: &cli::Cli, params: &tf_core::config::Parameters) -> Result<()> {
    let Some(path) = cli.image.as_deref() else {
        anyhow::bail!("--print et --output ne s'appliquent qu'à --image.");
    };
    let source = tf_source::image::load_image(path)?;
    let frame = tf_ascii::convert(&source, params)?;

    if let Some(ref out) = cli.output {
        export::save_frame(&frame, out)?;
    }
    if cli.print {
        export::write_frame(&frame, &mut std::io::stdout().lock())?;
    }
    Ok(())
}

/// Config depuis `--config`, ou défauts si le fichier n'existe pas.
fn resolve_config(cli: &cli::Cli) -> Result<RenderConfig> {
    if cli.config.exists() {
        tf_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(RenderConfig::default())
    }
}
