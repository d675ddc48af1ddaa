//! Doublures de test partagées par les modules de la boucle.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tf_core::frame::FrameBuffer;
use tf_core::traits::{VideoHandle, VideoPoll};

/// Vidéo scriptée : rejoue une suite de `VideoPoll`, puis `Pending`.
pub struct ScriptedVideo {
    script: VecDeque<VideoPoll>,
    probe: Probe,
}

/// Observe une `ScriptedVideo` après qu'elle a été déplacée dans la boucle.
#[derive(Clone, Default)]
pub struct Probe {
    plays: Rc<Cell<u32>>,
    pauses: Rc<Cell<u32>>,
    seeks: Rc<Cell<u32>>,
    dropped: Rc<Cell<bool>>,
}

impl Probe {
    pub fn plays(&self) -> u32 {
        self.plays.get()
    }

    pub fn pauses(&self) -> u32 {
        self.pauses.get()
    }

    pub fn seeks(&self) -> u32 {
        self.seeks.get()
    }

    pub fn dropped(&self) -> bool {
        self.dropped.get()
    }
}

impl ScriptedVideo {
    pub fn new(script: Vec<VideoPoll>) -> (Self, Probe) {
        let probe = Probe::default();
        let video = Self {
            script: script.into(),
            probe: probe.clone(),
        };
        (video, probe)
    }
}

impl VideoHandle for ScriptedVideo {
    fn poll_frame(&mut self) -> VideoPoll {
        self.script.pop_front().unwrap_or(VideoPoll::Pending)
    }

    fn play(&mut self) {
        self.probe.plays.set(self.probe.plays.get() + 1);
    }

    fn pause(&mut self) {
        self.probe.pauses.set(self.probe.pauses.get() + 1);
    }

    fn seek(&mut self, _delta: f64) {
        self.probe.seeks.set(self.probe.seeks.get() + 1);
    }
}

impl Drop for ScriptedVideo {
    fn drop(&mut self) {
        self.probe.dropped.set(true);
    }
}

/// Instant où tout tick programmé est échu.
pub fn far() -> Instant {
    Instant::now() + Duration::from_secs(3600)
}

/// Frame unie en niveaux de gris.
pub fn frame(width: u32, height: u32, value: u8) -> Arc<FrameBuffer> {
    Arc::new(FrameBuffer::filled(width, height, [value; 3]))
}
