//! Helper fakes and utilities for tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use whack_a_monkey::{
    app::Clock,
    config::Config,
    game::SessionCommand,
    target::MarkerId,
    vision::{Detection, FrameSource, Hud, MarkerDetector, RenderSink},
    Error, Result,
};

/// Build a marker id set from raw ids
pub fn ids(raw: &[u32]) -> BTreeSet<MarkerId> {
    raw.iter().copied().map(MarkerId).collect()
}

/// Every tracked id except `excluded`
pub fn all_but(tracked: &[MarkerId], excluded: MarkerId) -> BTreeSet<MarkerId> {
    tracked.iter().copied().filter(|id| *id != excluded).collect()
}

/// One scripted camera read
#[derive(Debug, Clone)]
pub enum Shot {
    /// A frame showing these markers
    Frame(Vec<u32>),
    /// A failed read
    Fail,
}

/// Shared fake time, advanced by the frame source
#[derive(Clone)]
pub struct FakeClock {
    now: Rc<Cell<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Frame source replaying a script; each successful frame advances the clock
pub struct ScriptedSource {
    shots: VecDeque<Shot>,
    clock: FakeClock,
    interval: Duration,
}

impl ScriptedSource {
    pub fn new(shots: Vec<Shot>, clock: FakeClock, interval: Duration) -> Self {
        Self {
            shots: shots.into(),
            clock,
            interval,
        }
    }
}

impl FrameSource for ScriptedSource {
    type Frame = Vec<MarkerId>;

    fn next_frame(&mut self) -> Result<Vec<MarkerId>> {
        match self.shots.pop_front() {
            Some(Shot::Frame(raw)) => {
                self.clock.advance(self.interval);
                Ok(raw.into_iter().map(MarkerId).collect())
            }
            Some(Shot::Fail) => Err(Error::FrameCapture("scripted failure".to_string())),
            None => Err(Error::FrameCapture("script exhausted".to_string())),
        }
    }
}

/// Detector that reports exactly the markers a scripted frame contains
pub struct ScriptedDetector;

impl MarkerDetector<Vec<MarkerId>> for ScriptedDetector {
    fn detect(&mut self, frame: &Vec<MarkerId>) -> Result<Vec<Detection>> {
        Ok(frame
            .iter()
            .map(|id| Detection::new(*id, [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]))
            .collect())
    }
}

/// What the renderer was asked to draw
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub target: Option<MarkerId>,
    pub visible: Vec<MarkerId>,
    pub hud: Hud,
}

/// Renderer recording every call; can send a command after a number of frames
pub struct RecordingRenderer {
    pub frames: Rc<RefCell<Vec<RenderedFrame>>>,
    scheduled: Option<(usize, SessionCommand, Sender<SessionCommand>)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            frames: Rc::new(RefCell::new(Vec::new())),
            scheduled: None,
        }
    }

    /// Send `command` once `after` frames have been rendered
    pub fn send_after(mut self, after: usize, command: SessionCommand, sender: Sender<SessionCommand>) -> Self {
        self.scheduled = Some((after, command, sender));
        self
    }
}

impl RenderSink<Vec<MarkerId>> for RecordingRenderer {
    fn render(&mut self, _frame: &Vec<MarkerId>, target: Option<MarkerId>, detections: &[Detection], hud: &Hud) -> Result<()> {
        self.frames.borrow_mut().push(RenderedFrame {
            target,
            visible: detections.iter().map(|d| d.id).collect(),
            hud: *hud,
        });

        let rendered = self.frames.borrow().len();
        if let Some((after, command, sender)) = &self.scheduled {
            if rendered == *after {
                sender.send(*command).expect("session control dropped");
            }
        }
        Ok(())
    }
}

/// Default config with no preparation delay and a fast lifetime
pub fn quick_config(monkey_visible: f64, chances: u32) -> Config {
    let mut config = Config::default();
    config.game.preparation_delay = 0.0;
    config.game.monkey_visible = monkey_visible;
    config.game.chances = chances;
    config
}
