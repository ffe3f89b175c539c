//! Camera, marker detection and overlay rendering.
//!
//! The game core only needs three capabilities from the outside world: a
//! stream of frames, the marker ids visible in a frame, and somewhere to draw
//! the monkey. Each is a trait so the frame loop can run against `OpenCV`
//! in production and against scripted fakes in tests.

use crate::{
    config::MarkerDictionary,
    constants::{KEY_ENTER, KEY_ESCAPE, KEY_Q, KEY_SPACE},
    game::{GamePhase, SessionCommand},
    scoring::ScoreBoard,
    target::MarkerId,
    Error, Result,
};
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Point, Point2f, Scalar, Vector},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    objdetect::{self, ArucoDetector, DetectorParameters, PredefinedDictionaryType, RefineParameters},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// A marker found in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Decoded marker id
    pub id: MarkerId,
    /// Image-space corners, clockwise from top-left
    pub corners: [(f32, f32); 4],
}

impl Detection {
    /// Create a detection
    #[must_use]
    pub fn new(id: MarkerId, corners: [(f32, f32); 4]) -> Self {
        Self { id, corners }
    }
}

/// Status line drawn over the camera image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    /// Current game phase
    pub phase: GamePhase,
    /// Scoreboard, once a session started
    pub board: Option<ScoreBoard>,
    /// Time before the current monkey runs away
    pub time_left: Option<Duration>,
}

impl Hud {
    /// One-line summary of the game state
    #[must_use]
    pub fn status_line(&self) -> String {
        match (self.phase, self.board) {
            (GamePhase::Idle, _) => "Press SPACE to start".to_string(),
            (GamePhase::Active, None) => "Get ready".to_string(),
            (GamePhase::Active, Some(board)) => {
                let mut line = format!(
                    "Caught: {}  Penalties: {}  Missed: {}",
                    board.hits, board.penalties, board.missed
                );
                if let Some(left) = self.time_left {
                    line.push_str(&format!("  Time: {:.1}s", left.as_secs_f64()));
                }
                line
            }
            (GamePhase::Ended, _) => "Game over".to_string(),
        }
    }
}

/// Source of camera frames
pub trait FrameSource {
    /// Frame type handed to the detector and renderer
    type Frame;

    /// Pull the next frame
    fn next_frame(&mut self) -> Result<Self::Frame>;
}

/// Finds markers in a frame
pub trait MarkerDetector<F> {
    /// Detect all markers visible in `frame`
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

/// Draws the monkey over the frame
pub trait RenderSink<F> {
    /// Draw the frame, with the monkey on `target` if that marker is detected
    fn render(&mut self, frame: &F, target: Option<MarkerId>, detections: &[Detection], hud: &Hud) -> Result<()>;
}

/// Webcam frame source
pub struct CameraSource {
    capture: VideoCapture,
}

impl CameraSource {
    /// Open the camera at `index`
    pub fn open(index: i32) -> Result<Self> {
        info!("Opening camera {}", index);
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::FrameCapture(format!("camera {index} could not be opened")));
        }

        // Reduce buffer size for lower latency
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;
        Ok(Self { capture })
    }
}

impl FrameSource for CameraSource {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Err(Error::FrameCapture("image not captured properly".to_string()));
        }
        Ok(frame)
    }
}

/// ArUco marker detector
pub struct ArucoMarkerDetector {
    detector: ArucoDetector,
}

impl ArucoMarkerDetector {
    /// Create a detector for markers printed from `dictionary`
    pub fn new(dictionary: MarkerDictionary) -> Result<Self> {
        info!("Initializing ArUco detector with dictionary {:?}", dictionary);
        let dictionary = objdetect::get_predefined_dictionary(predefined(dictionary))?;
        let parameters = DetectorParameters::default()?;
        let refine = RefineParameters::new(10.0, 3.0, true)?;
        let detector = ArucoDetector::new(&dictionary, &parameters, refine)?;
        Ok(Self { detector })
    }
}

fn predefined(dictionary: MarkerDictionary) -> PredefinedDictionaryType {
    match dictionary {
        MarkerDictionary::Dict4x4_50 => PredefinedDictionaryType::DICT_4X4_50,
        MarkerDictionary::Dict4x4_250 => PredefinedDictionaryType::DICT_4X4_250,
        MarkerDictionary::Dict5x5_50 => PredefinedDictionaryType::DICT_5X5_50,
        MarkerDictionary::Dict5x5_250 => PredefinedDictionaryType::DICT_5X5_250,
        MarkerDictionary::Dict6x6_250 => PredefinedDictionaryType::DICT_6X6_250,
    }
}

impl MarkerDetector<Mat> for ArucoMarkerDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        // ArUco detection works better on grayscale
        let mut gray = Mat::default();
        imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut corners: Vector<Vector<Point2f>> = Vector::new();
        let mut ids: Vector<i32> = Vector::new();
        let mut rejected: Vector<Vector<Point2f>> = Vector::new();
        self.detector.detect_markers(&gray, &mut corners, &mut ids, &mut rejected)?;

        let mut detections = Vec::with_capacity(ids.len());
        for (raw_id, quad) in ids.iter().zip(corners.iter()) {
            let Ok(id) = MarkerId::try_from(raw_id) else {
                debug!("Skipping marker with invalid id {}", raw_id);
                continue;
            };
            let points = quad.to_vec();
            let [a, b, c, d] = points.as_slice() else {
                warn!("Marker {} has {} corners, expected 4", id, points.len());
                continue;
            };
            detections.push(Detection::new(
                id,
                [(a.x, a.y), (b.x, b.y), (c.x, c.y), (d.x, d.y)],
            ));
        }
        Ok(detections)
    }
}

/// Map a `highgui` key code to a session command
#[must_use]
pub fn command_for_key(key: i32) -> Option<SessionCommand> {
    match key {
        KEY_SPACE | KEY_ENTER => Some(SessionCommand::Begin),
        KEY_ESCAPE | KEY_Q => Some(SessionCommand::Abort),
        _ => None,
    }
}

/// Camera window that draws the monkey and forwards key presses
pub struct OverlayRenderer {
    window_title: String,
    draw_all_markers: bool,
    commands: Option<Sender<SessionCommand>>,
}

impl OverlayRenderer {
    /// Create the window
    pub fn new(window_title: &str, draw_all_markers: bool, commands: Option<Sender<SessionCommand>>) -> Result<Self> {
        highgui::named_window(window_title, WINDOW_NORMAL)?;
        Ok(Self {
            window_title: window_title.to_string(),
            draw_all_markers,
            commands,
        })
    }

    fn poll_keyboard(&mut self) -> Result<()> {
        let key = highgui::wait_key(1)?;
        let Some(command) = command_for_key(key) else {
            return Ok(());
        };
        if let Some(sender) = &self.commands {
            if sender.send(command).is_err() {
                debug!("Session control closed, dropping {:?}", command);
                self.commands = None;
            }
        }
        Ok(())
    }
}

fn outline(frame: &mut Mat, corners: &[(f32, f32); 4], color: Scalar, thickness: i32) -> Result<()> {
    let quad: Vector<Point> = corners
        .iter()
        .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    let mut polygons: Vector<Vector<Point>> = Vector::new();
    polygons.push(quad);
    imgproc::polylines(frame, &polygons, true, color, thickness, LINE_8, 0)?;
    Ok(())
}

impl RenderSink<Mat> for OverlayRenderer {
    fn render(&mut self, frame: &Mat, target: Option<MarkerId>, detections: &[Detection], hud: &Hud) -> Result<()> {
        let mut display_frame = frame.clone();

        if self.draw_all_markers {
            for detection in detections {
                outline(&mut display_frame, &detection.corners, Scalar::new(255.0, 0.0, 0.0, 0.0), 1)?;
            }
        }

        if let Some(detection) = target.and_then(|id| detections.iter().find(|d| d.id == id)) {
            outline(&mut display_frame, &detection.corners, Scalar::new(0.0, 255.0, 255.0, 0.0), 4)?;
            let (x, y) = detection.corners[0];
            imgproc::put_text(
                &mut display_frame,
                "MONKEY",
                Point::new(x as i32, y as i32 - 10),
                FONT_HERSHEY_SIMPLEX,
                0.8,
                Scalar::new(0.0, 255.0, 255.0, 0.0),
                2,
                LINE_8,
                false,
            )?;
        }

        imgproc::put_text(
            &mut display_frame,
            &hud.status_line(),
            Point::new(10, 30),
            FONT_HERSHEY_SIMPLEX,
            0.7,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            LINE_8,
            false,
        )?;

        highgui::imshow(&self.window_title, &display_frame)?;
        self.poll_keyboard()
    }
}

/// Renderer for runs without a window
#[derive(Debug, Default)]
pub struct HeadlessRenderer;

impl<F> RenderSink<F> for HeadlessRenderer {
    fn render(&mut self, _frame: &F, _target: Option<MarkerId>, _detections: &[Detection], _hud: &Hud) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(command_for_key(KEY_SPACE), Some(SessionCommand::Begin));
        assert_eq!(command_for_key(KEY_ENTER), Some(SessionCommand::Begin));
        assert_eq!(command_for_key(KEY_Q), Some(SessionCommand::Abort));
        assert_eq!(command_for_key(KEY_ESCAPE), Some(SessionCommand::Abort));
        assert_eq!(command_for_key(-1), None);
    }

    #[test]
    fn test_status_line() {
        let idle = Hud {
            phase: GamePhase::Idle,
            board: None,
            time_left: None,
        };
        assert!(idle.status_line().contains("SPACE"));

        let active = Hud {
            phase: GamePhase::Active,
            board: Some(ScoreBoard {
                hits: 2,
                penalties: 1,
                missed: 0,
            }),
            time_left: Some(Duration::from_millis(2500)),
        };
        let line = active.status_line();
        assert!(line.contains("Caught: 2"));
        assert!(line.contains("Time: 2.5s"));
    }

    #[test]
    fn test_headless_renderer_accepts_any_frame() {
        let mut renderer = HeadlessRenderer;
        let hud = Hud {
            phase: GamePhase::Ended,
            board: None,
            time_left: None,
        };
        assert!(renderer.render(&(), Some(MarkerId(1)), &[], &hud).is_ok());
    }
}
