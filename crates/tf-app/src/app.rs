use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use arc_swap::ArcSwap;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use tf_core::config::{Parameters, RenderConfig};
use tf_core::error::CoreError;
use tf_core::frame::{AsciiFrame, FrameBuffer};
use tf_render::scheduler::RefreshScheduler;
use tf_render::session::{Mode, Session};
use tf_render::ui::{self, Status};
use tf_source::video::VideoSource;

use crate::export;

/// Attente max entre deux tours sans tick programmé (resize, reload).
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Pas de seek (secondes).
const SEEK_STEP: f64 = 5.0;

/// État de l'application interactive.
pub struct App {
    config: Arc<ArcSwap<RenderConfig>>,
    /// Dernière config appliquée, pour détecter un rechargement.
    applied_config: Arc<RenderConfig>,
    session: Session<VideoSource, RefreshScheduler>,
    /// Dossier où `s` écrit les instantanés.
    snapshot_dir: PathBuf,
    message: Option<String>,
    show_help: bool,
    quitting: bool,
    needs_redraw: bool,
}

impl App {
    /// Construit l'app à partir de la config partagée.
    ///
    /// # Errors
    /// Returns an error if the configured ramp is invalid.
    pub fn new(config: Arc<ArcSwap<RenderConfig>>, snapshot_dir: PathBuf) -> Result<Self> {
        let applied_config = config.load_full();
        let params = applied_config.parameters()?;
        let scheduler = RefreshScheduler::new(applied_config.target_fps);
        Ok(Self {
            config,
            applied_config,
            session: Session::new(params, scheduler),
            snapshot_dir,
            message: None,
            show_help: false,
            quitting: false,
            needs_redraw: true,
        })
    }

    /// Charge une image fixe et la convertit.
    ///
    /// # Errors
    /// Returns an error if the conversion fails for a non-transient reason.
    pub fn load_image(&mut self, source: FrameBuffer) -> Result<()> {
        self.session.load_image(source, &mut |_: &AsciiFrame| {})?;
        self.needs_redraw = true;
        Ok(())
    }

    /// Démarre la lecture d'une vidéo.
    pub fn load_video(&mut self, video: VideoSource) {
        let info = video.info();
        log::info!(
            "Vidéo {}x{} @ {:.2} fps",
            info.width,
            info.height,
            info.fps
        );
        self.session.load_video(video);
        self.needs_redraw = true;
    }

    /// Ouvre `path` selon son type (`--image` ou `--video`).
    ///
    /// # Errors
    /// Returns an error if the file cannot be decoded or ffmpeg is missing.
    pub fn open(&mut self, image: Option<&Path>, video: Option<&Path>) -> Result<()> {
        if let Some(path) = image {
            self.load_image(tf_source::image::load_image(path)?)?;
        } else if let Some(path) = video {
            self.load_video(VideoSource::open(path)?);
        }
        Ok(())
    }

    #[must_use]
    pub fn params(&self) -> &Parameters {
        self.session.params()
    }

    #[must_use]
    pub fn session(&self) -> &Session<VideoSource, RefreshScheduler> {
        &self.session
    }

    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Boucle principale : tick vidéo échu, redessin, puis attente
    /// d'événement jusqu'à la prochaine échéance.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.quitting {
            self.apply_config_reload();

            let mut published = false;
            self.session
                .pump(Instant::now(), &mut |_: &AsciiFrame| published = true);

            if published || self.needs_redraw {
                let status = self.status();
                let frame = self.session.current_frame();
                terminal.draw(|f| ui::draw(f, frame, &status))?;
                self.needs_redraw = false;
            }

            let timeout = self
                .session
                .next_deadline()
                .map_or(IDLE_POLL, |d| d.saturating_duration_since(Instant::now()))
                .min(IDLE_POLL);
            if event::poll(timeout)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
            }
        }
        Ok(())
    }

    /// Ce que la barre d'état affiche.
    #[must_use]
    pub fn status(&self) -> Status {
        let params = self.session.params();
        let frames = match self.session.mode() {
            Mode::Video => self.session.player().frames_published(),
            Mode::Image => self.session.still().conversions(),
            Mode::Empty => 0,
        };
        Status {
            mode: self.session.mode(),
            state: self.session.loop_state(),
            width: params.output_width,
            invert: params.invert,
            frames,
            message: self.message.clone(),
            show_help: self.show_help,
        }
    }

    /// Applique une config rechargée : paramètres et cadence.
    pub fn apply_config_reload(&mut self) {
        let current = self.config.load_full();
        if Arc::ptr_eq(&current, &self.applied_config) {
            return;
        }
        match current.parameters() {
            Ok(params) => {
                self.session
                    .player_mut()
                    .scheduler_mut()
                    .set_target_fps(current.target_fps);
                let result = self.session.set_params(params, &mut |_: &AsciiFrame| {});
                self.after_recompute(result);
                self.message = Some("config rechargée".to_string());
            }
            Err(e) => log::warn!("Config rechargée ignorée : {e}"),
        }
        self.applied_config = current;
        self.needs_redraw = true;
    }

    /// Dispatch d'un événement terminal.
    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Resize(..) => self.needs_redraw = true,
            _ => {}
        }
    }

    /// Raccourcis clavier.
    pub fn handle_key(&mut self, code: KeyCode) {
        self.message = None;
        self.needs_redraw = true;

        if self.show_help {
            if matches!(code, KeyCode::Char('?' | 'q') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quitting = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('+' | '=') => self.update_params(|p| {
                p.step_width(1);
            }),
            KeyCode::Char('-') => self.update_params(|p| {
                p.step_width(-1);
            }),
            KeyCode::Char('i') => self.update_params(Parameters::toggle_invert),
            KeyCode::Char('r') => {
                let result = self.session.reset_parameters(&mut |_: &AsciiFrame| {});
                self.after_recompute(result);
            }
            KeyCode::Char(' ') => {
                self.session.toggle_pause();
            }
            KeyCode::Left => self.session.seek(-SEEK_STEP),
            KeyCode::Right => self.session.seek(SEEK_STEP),
            KeyCode::Char('s') => self.save_snapshot(),
            _ => self.needs_redraw = false,
        }
    }

    fn update_params(&mut self, f: impl FnOnce(&mut Parameters)) {
        let result = self.session.update_params(f, &mut |_: &AsciiFrame| {});
        self.after_recompute(result);
    }

    fn after_recompute(&mut self, result: Result<bool, CoreError>) {
        if let Err(e) = result {
            log::warn!("Conversion impossible : {e}");
            self.message = Some(e.to_string());
        }
    }

    fn save_snapshot(&mut self) {
        let Some(frame) = self.session.current_frame() else {
            self.message = Some("aucune frame à sauver".to_string());
            return;
        };
        let path = export::snapshot_path(&self.snapshot_dir);
        self.message = Some(match export::save_frame(frame, &path) {
            Ok(()) => format!("sauvé : {}", path.display()),
            Err(e) => {
                log::warn!("{e:#}");
                format!("échec : {e}")
            }
        });
    }
}
