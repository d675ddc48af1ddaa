//! Vidéo via un sous-processus `ffmpeg`.
//!
//! `ffprobe` donne dimensions et cadence ; `ffmpeg` écrit des frames RGBA
//! brutes, à la résolution native, sur son stdout. Un thread dédié les lit
//! dans un pool de buffers recyclés et les pousse dans un canal borné.
//! Le stderr d'ffmpeg est relayé dans les logs.
//! Prérequis runtime : `ffmpeg` et `ffprobe` dans le PATH.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tf_core::frame::FrameBuffer;
use tf_core::traits::{VideoHandle, VideoPoll};

/// Capacité du canal de frames décodées.
const FRAME_CHANNEL_CAP: usize = 3;
/// Canal plein + frame en cours de conversion + une en lecture.
const POOL_SIZE: usize = FRAME_CHANNEL_CAP + 3;
/// Cadence supposée quand ffprobe n'en donne pas d'exploitable.
const FALLBACK_FPS: f64 = 30.0;
/// Cadence max demandée à ffmpeg.
const MAX_DECODE_FPS: f64 = 60.0;
/// Réveil du thread en pause pour relire les commandes.
const PAUSED_WAKEUP: Duration = Duration::from_millis(50);

/// Commandes envoyées au thread de décodage.
///
/// # Example
/// ```
/// use tf_source::video::VideoCommand;
/// let back = VideoCommand::Seek(-5.0);
/// assert_ne!(back, VideoCommand::Seek(5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    Play,
    Pause,
    /// Déplacement relatif en secondes ; la position ne descend pas sous 0.
    Seek(f64),
    /// Tue ffmpeg et termine le thread.
    Quit,
}

/// Dimensions et cadence du flux vidéo principal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde, éventuellement fractionnaire (29.97…).
    pub fps: f64,
}

impl VideoInfo {
    /// Cadence de décodage : fps arrondi, borné à `[1, 60]`.
    ///
    /// # Example
    /// ```
    /// use tf_source::video::VideoInfo;
    /// let info = VideoInfo { width: 1, height: 1, fps: 29.97 };
    /// assert_eq!(info.decode_fps(), 30);
    /// let fast = VideoInfo { fps: 120.0, ..info };
    /// assert_eq!(fast.decode_fps(), 60);
    /// ```
    #[must_use]
    pub fn decode_fps(&self) -> u32 {
        self.fps.clamp(1.0, MAX_DECODE_FPS).round() as u32
    }
}

/// Parse la sortie `clé=valeur` de ffprobe.
///
/// Une rotation de ±90° (matrice d'affichage ou tag `rotate`) échange
/// largeur et hauteur : ffmpeg applique la rotation en décodant.
///
/// # Errors
/// Fails when no positive width and height are present.
///
/// # Example
/// ```
/// use tf_source::video::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let (mut width, mut height, mut fps) = (None, None, None);
    let mut quarter_turn = false;

    for (key, value) in text.lines().filter_map(|l| l.split_once('=')) {
        let value = value.trim();
        match key.trim() {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "r_frame_rate" => fps = parse_rate(value),
            "rotation" | "TAG:rotate" => {
                if let Ok(degrees) = value.parse::<f64>() {
                    quarter_turn = (degrees.round() as i64).rem_euclid(180) == 90;
                }
            }
            _ => {}
        }
    }
    if quarter_turn {
        std::mem::swap(&mut width, &mut height);
    }

    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(VideoInfo {
            width,
            height,
            fps: fps.unwrap_or(FALLBACK_FPS),
        }),
        _ => bail!("aucun flux vidéo exploitable ({width:?}x{height:?})"),
    }
}

/// `"24"`, `"24/1"`, `"30000/1001"` → fps ; `None` si nul ou indéfini.
fn parse_rate(value: &str) -> Option<f64> {
    let (num, den) = value.split_once('/').unwrap_or((value, "1"));
    let rate = num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?;
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Interroge `ffprobe` sur le premier flux vidéo de `path`.
///
/// # Errors
/// Fails if `ffprobe` cannot be run or reports no usable video stream.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=width,height,r_frame_rate:stream_tags=rotate:stream_side_data=rotation",
        ])
        .args(["-of", "default=noprint_wrappers=1"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .context("ffprobe introuvable : installez ffmpeg et vérifiez le PATH")?;

    if !output.status.success() {
        bail!(
            "ffprobe a échoué sur {} : {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe : {}", path.display()))?;
    log::info!(
        "Vidéo {} : {}x{} @ {:.3} fps",
        path.display(),
        info.width,
        info.height,
        info.fps
    );
    Ok(info)
}

/// Commande `ffmpeg` : RGBA brut sur stdout, sans audio, depuis `start_secs`.
fn ffmpeg_command(path: &Path, start_secs: f64, fps: u32) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error", "-nostdin"])
        .args(["-ss", &format!("{start_secs:.3}")])
        .arg("-i")
        .arg(path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba"])
        .args(["-r", &fps.to_string()])
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Relaie chaque ligne de `stderr` en warning jusqu'à sa fermeture.
/// Retourne le nombre de lignes relayées.
fn forward_stderr<R: Read>(stderr: R) -> usize {
    let mut count = 0;
    for line in BufReader::new(stderr).lines().map_while(io::Result::ok) {
        let line = line.trim();
        if !line.is_empty() {
            log::warn!("ffmpeg : {line}");
            count += 1;
        }
    }
    count
}

/// Buffers recyclés entre le thread de décodage et le consommateur.
///
/// Un slot est libre quand le pool en détient la seule référence.
struct FramePool {
    slots: Vec<Arc<FrameBuffer>>,
    width: u32,
    height: u32,
}

impl FramePool {
    fn new(width: u32, height: u32, size: usize) -> Self {
        Self {
            slots: (0..size)
                .map(|_| Arc::new(FrameBuffer::new(width, height)))
                .collect(),
            width,
            height,
        }
    }

    /// Slot libre ; alloue un slot de plus si tous sont en vol.
    fn acquire(&mut self) -> &mut Arc<FrameBuffer> {
        let idx = if let Some(i) = self.slots.iter().position(|s| Arc::strong_count(s) == 1) {
            i
        } else {
            log::debug!("Pool vidéo épuisé, {} slots", self.slots.len() + 1);
            self.slots
                .push(Arc::new(FrameBuffer::new(self.width, self.height)));
            self.slots.len() - 1
        };
        &mut self.slots[idx]
    }
}

/// État du thread de décodage.
struct Decoder {
    path: PathBuf,
    fps: u32,
    /// Position de lecture estimée, en secondes.
    position: f64,
    paused: bool,
    child: Option<Child>,
    pool: FramePool,
}

impl Decoder {
    fn new(path: &Path, info: VideoInfo) -> Self {
        Self {
            path: path.to_path_buf(),
            fps: info.decode_fps(),
            position: 0.0,
            paused: false,
            child: None,
            pool: FramePool::new(info.width, info.height, POOL_SIZE),
        }
    }

    /// (Re)lance ffmpeg à la position courante.
    fn restart(&mut self) {
        self.kill();
        match ffmpeg_command(&self.path, self.position, self.fps).spawn() {
            Ok(mut child) => {
                log::debug!("ffmpeg lancé à {:.1}s ({} fps)", self.position, self.fps);
                if let Some(stderr) = child.stderr.take()
                    && let Err(e) = thread::Builder::new()
                        .name("ffmpeg-stderr".into())
                        .spawn(move || forward_stderr(stderr))
                {
                    log::debug!("stderr ffmpeg non relayé : {e}");
                }
                self.child = Some(child);
            }
            Err(e) => log::warn!("Impossible de lancer ffmpeg : {e}"),
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                log::debug!("ffmpeg déjà terminé : {e}");
            }
            let _ = child.wait();
        }
    }

    /// Attend ffmpeg une fois son stdout fermé ; un code non nul est
    /// signalé en warning.
    fn reap(&mut self) -> Option<ExitStatus> {
        let mut child = self.child.take()?;
        match child.wait() {
            Ok(status) => {
                if !status.success() {
                    log::warn!("ffmpeg a échoué ({status}) à {:.1}s", self.position);
                }
                Some(status)
            }
            Err(e) => {
                log::warn!("ffmpeg : attente impossible : {e}");
                None
            }
        }
    }

    /// Applique une commande. Retourne `false` pour arrêter le thread.
    fn apply(&mut self, cmd: VideoCommand) -> bool {
        match cmd {
            VideoCommand::Play => self.paused = false,
            VideoCommand::Pause => self.paused = true,
            VideoCommand::Seek(delta) => {
                self.position = (self.position + delta).max(0.0);
                self.restart();
            }
            VideoCommand::Quit => return false,
        }
        log::debug!("Décodeur : {cmd:?}, position {:.1}s", self.position);
        true
    }

    /// Lit la frame suivante dans un slot du pool ; `None` en fin de flux.
    fn read_frame(&mut self) -> io::Result<Option<Arc<FrameBuffer>>> {
        let Some(stdout) = self.child.as_mut().and_then(|c| c.stdout.as_mut()) else {
            return Ok(None);
        };
        let slot = self.pool.acquire();
        let Some(frame) = Arc::get_mut(slot) else {
            return Err(io::Error::other("slot du pool encore partagé"));
        };
        match stdout.read_exact(&mut frame.data) {
            Ok(()) => Ok(Some(Arc::clone(slot))),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Boucle du thread : commandes, cadence, lecture, envoi.
    fn run(mut self, frame_tx: &Sender<Arc<FrameBuffer>>, cmd_rx: &Receiver<VideoCommand>) {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.fps));
        let mut next_due = Instant::now();
        self.restart();

        loop {
            let wait = if self.paused {
                PAUSED_WAKEUP
            } else {
                next_due.saturating_duration_since(Instant::now())
            };
            match cmd_rx.recv_timeout(wait) {
                Ok(cmd) => {
                    if self.apply(cmd) {
                        continue;
                    }
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) if self.paused => continue,
                Err(RecvTimeoutError::Timeout) => {}
            }

            // Reste sur la grille de cadence, sans rattrapage en rafale.
            next_due = (next_due + period).max(Instant::now());

            match self.read_frame() {
                Ok(Some(frame)) => {
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                    self.position += period.as_secs_f64();
                }
                Ok(None) => {
                    if self.reap().is_none_or(|status| status.success()) {
                        log::info!("Fin du flux vidéo à {:.1}s", self.position);
                    }
                    break;
                }
                Err(e) => {
                    log::warn!("Lecture ffmpeg interrompue : {e}");
                    break;
                }
            }
        }

        self.kill();
        log::debug!("Thread vidéo terminé");
    }
}

/// Vidéo décodée par un thread `ffmpeg` dédié.
///
/// Dropper la source envoie `Quit` : c'est ainsi que le contrôleur de
/// boucle libère la vidéo.
///
/// # Example
/// ```no_run
/// use tf_source::video::VideoSource;
/// use tf_core::traits::VideoHandle;
/// let mut video = VideoSource::open("clip.mp4".as_ref()).unwrap();
/// let _ = video.poll_frame();
/// ```
pub struct VideoSource {
    frame_rx: Receiver<Arc<FrameBuffer>>,
    cmd_tx: Sender<VideoCommand>,
    info: VideoInfo,
    paused: bool,
}

impl VideoSource {
    /// Sonde le fichier puis démarre le thread de décodage.
    ///
    /// # Errors
    /// Retourne une erreur si `ffprobe` est introuvable, si le fichier est
    /// invalide, ou si le thread ne peut être créé.
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe_video(path)?;
        let (frame_tx, frame_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::bounded(16);
        let decoder = Decoder::new(path, info);

        thread::Builder::new()
            .name("tf-video".to_string())
            .spawn(move || decoder.run(&frame_tx, &cmd_rx))
            .context("Impossible de spawner le thread vidéo")?;

        Ok(Self::from_channels(frame_rx, cmd_tx, info))
    }

    /// Assemble une source à partir de canaux existants (tests, sources synthétiques).
    #[must_use]
    pub fn from_channels(
        frame_rx: Receiver<Arc<FrameBuffer>>,
        cmd_tx: Sender<VideoCommand>,
        info: VideoInfo,
    ) -> Self {
        Self {
            frame_rx,
            cmd_tx,
            info,
            paused: false,
        }
    }

    /// Métadonnées du flux.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    fn send(&self, cmd: VideoCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::debug!("Thread vidéo déjà terminé, commande {cmd:?} ignorée");
        }
    }
}

impl VideoHandle for VideoSource {
    fn poll_frame(&mut self) -> VideoPoll {
        if self.paused {
            return VideoPoll::Paused;
        }
        // Ne garder que la plus récente : la frame affichée est la frame courante.
        let mut latest = None;
        loop {
            match self.frame_rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() {
                        return VideoPoll::Ended;
                    }
                    break;
                }
            }
        }
        latest.map_or(VideoPoll::Pending, VideoPoll::Frame)
    }

    fn play(&mut self) {
        self.paused = false;
        self.send(VideoCommand::Play);
    }

    fn pause(&mut self) {
        self.paused = true;
        self.send(VideoCommand::Pause);
    }

    fn seek(&mut self, delta: f64) {
        self.send(VideoCommand::Seek(delta));
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(VideoCommand::Quit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> (VideoSource, Sender<Arc<FrameBuffer>>, Receiver<VideoCommand>) {
        let (frame_tx, frame_rx) = flume::bounded(FRAME_CHANNEL_CAP);
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let info = VideoInfo {
            width: 4,
            height: 2,
            fps: 30.0,
        };
        (VideoSource::from_channels(frame_rx, cmd_tx, info), frame_tx, cmd_rx)
    }

    #[test]
    fn probe_output_parsing() {
        let info = parse_probe_output("width=1920\nheight=1080\nr_frame_rate=24/1\n").unwrap();
        assert_eq!(
            info,
            VideoInfo {
                width: 1920,
                height: 1080,
                fps: 24.0
            }
        );
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("width=0\nheight=10\n").is_err());
        assert!(parse_probe_output("width=abc\nheight=10\n").is_err());
    }

    #[test]
    fn rotated_stream_swaps_dimensions() {
        let side_data = "width=1920\nheight=1080\nr_frame_rate=30/1\nrotation=-90\n";
        let info = parse_probe_output(side_data).unwrap();
        assert_eq!((info.width, info.height), (1080, 1920));

        let tag = parse_probe_output("width=640\nheight=360\nTAG:rotate=270\n").unwrap();
        assert_eq!((tag.width, tag.height), (360, 640));

        let upside_down = parse_probe_output("width=640\nheight=360\nrotation=180\n").unwrap();
        assert_eq!((upside_down.width, upside_down.height), (640, 360));
    }

    #[test]
    fn degenerate_rate_falls_back() {
        let info = parse_probe_output("width=2\nheight=2\nr_frame_rate=0/0\n").unwrap();
        assert!((info.fps - FALLBACK_FPS).abs() < f64::EPSILON);
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("1/0"), None);
        assert_eq!(parse_rate("-5/1"), None);
    }

    #[test]
    fn ffmpeg_args_keep_native_size() {
        let cmd = ffmpeg_command(Path::new("clip.mp4"), 12.5, 24);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w == ["-ss", "12.500"]));
        assert!(args.windows(2).any(|w| w == ["-i", "clip.mp4"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgba"]));
        assert!(args.windows(2).any(|w| w == ["-r", "24"]));
        assert!(!args.iter().any(|a| a.starts_with("scale=")));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn stderr_lines_are_forwarded() {
        let stderr = io::Cursor::new("[h264] corrupt slice\n\n  \nError while decoding\n");
        assert_eq!(forward_stderr(stderr), 2);
        assert_eq!(forward_stderr(io::empty()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn failed_exit_is_reaped() {
        let info = VideoInfo {
            width: 2,
            height: 2,
            fps: 25.0,
        };
        let mut decoder = Decoder::new(Path::new("absent.mp4"), info);
        assert!(decoder.reap().is_none());

        decoder.child = Some(Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap());
        let status = decoder.reap().unwrap();
        assert_eq!(status.code(), Some(3));
        assert!(decoder.child.is_none());
    }

    #[test]
    fn pool_reuses_free_slots() {
        let mut pool = FramePool::new(1, 1, 2);
        let first = Arc::clone(pool.acquire());
        let second = Arc::clone(pool.acquire());
        assert!(!Arc::ptr_eq(&first, &second));
        // Les deux slots sont en vol : un troisième est alloué.
        let third = Arc::clone(pool.acquire());
        assert_eq!(pool.slots.len(), 3);
        drop(first);
        let again = Arc::clone(pool.acquire());
        assert!(Arc::ptr_eq(&again, &pool.slots[0]));
        assert_eq!(pool.slots.len(), 3);
        drop((second, third));
    }

    #[test]
    fn decoder_commands() {
        let info = VideoInfo {
            width: 2,
            height: 2,
            fps: 25.0,
        };
        let mut decoder = Decoder::new(Path::new("absent.mp4"), info);
        assert!(decoder.apply(VideoCommand::Pause));
        assert!(decoder.paused);
        assert!(decoder.apply(VideoCommand::Play));
        assert!(!decoder.paused);
        assert!(!decoder.apply(VideoCommand::Quit));
        // Sans ffmpeg lancé, il n'y a rien à lire.
        assert!(decoder.read_frame().unwrap().is_none());
    }

    #[test]
    fn poll_returns_latest_frame() {
        let (mut video, tx, _cmd) = synthetic();
        assert!(matches!(video.poll_frame(), VideoPoll::Pending));
        tx.send(Arc::new(FrameBuffer::filled(4, 2, [1, 1, 1]))).unwrap();
        tx.send(Arc::new(FrameBuffer::filled(4, 2, [2, 2, 2]))).unwrap();
        match video.poll_frame() {
            VideoPoll::Frame(fb) => assert_eq!(fb.pixel(0, 0), (2, 2, 2, 255)),
            other => panic!("frame attendue, reçu {other:?}"),
        }
        assert!(matches!(video.poll_frame(), VideoPoll::Pending));
    }

    #[test]
    fn ended_after_drain() {
        let (mut video, tx, _cmd) = synthetic();
        tx.send(Arc::new(FrameBuffer::new(4, 2))).unwrap();
        drop(tx);
        assert!(matches!(video.poll_frame(), VideoPoll::Frame(_)));
        assert!(matches!(video.poll_frame(), VideoPoll::Ended));
    }

    #[test]
    fn commands_forwarded_and_quit_on_drop() {
        let (mut video, _tx, cmd_rx) = synthetic();
        video.pause();
        assert!(matches!(video.poll_frame(), VideoPoll::Paused));
        video.play();
        video.seek(-5.0);
        drop(video);
        let cmds: Vec<VideoCommand> = cmd_rx.try_iter().collect();
        assert_eq!(
            cmds,
            vec![
                VideoCommand::Pause,
                VideoCommand::Play,
                VideoCommand::Seek(-5.0),
                VideoCommand::Quit
            ]
        );
    }
}
