//! Whack-A-Monkey: an augmented-reality whack-a-mole played with ArUco markers.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use whack_a_monkey::{
    app::{SystemClock, WhackApp},
    config::{Config, EXAMPLE_CONFIG},
    session,
    vision::{ArucoMarkerDetector, CameraSource, HeadlessRenderer, OverlayRenderer, RenderSink},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML or JSON)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Camera index to use (overrides the config file)
    #[arg(long)]
    cam: Option<i32>,

    /// Run without a window; control the session from the terminal
    #[arg(long)]
    headless: bool,

    /// Skip the check that every tracked marker is visible
    #[arg(long)]
    skip_setup_check: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Whack-A-Monkey");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::from_file(path).with_context(|| format!("failed to load {path}"))?
        }
        None => Config::default(),
    };
    if let Some(cam) = args.cam {
        config.camera.index = cam;
    }
    if args.headless {
        config.display.enabled = false;
    }
    config.validate().context("invalid configuration")?;

    let result = if config.display.enabled {
        let (sender, control) = session::channel();
        let renderer = OverlayRenderer::new(
            &config.display.window_title,
            config.display.draw_all_markers,
            Some(sender.clone()),
        )?;
        session::spawn_stdin_reader(sender);
        play(&config, renderer, control, args.skip_setup_check)
    } else {
        let (sender, control) = session::channel();
        session::spawn_stdin_reader(sender);
        play(&config, HeadlessRenderer, control, args.skip_setup_check)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Sorry! The game encountered an error: {e:#}");
            Err(e)
        }
    }
}

fn play<R>(config: &Config, renderer: R, control: session::SessionControl, skip_setup_check: bool) -> Result<()>
where
    R: RenderSink<opencv::core::Mat>,
{
    let source = CameraSource::open(config.camera.index)?;
    let detector = ArucoMarkerDetector::new(config.markers.dictionary)?;
    let mut app = WhackApp::new(
        config,
        source,
        detector,
        renderer,
        control,
        StdRng::from_entropy(),
        SystemClock,
    )?;

    if !skip_setup_check {
        app.verify_setup().context("setup verification failed")?;
    }

    info!("Waiting for the operator to start the session");
    let summary = app.run()?;

    if let Some(report) = summary.report {
        println!("{report}");
    } else {
        println!("Session ended before it began");
    }
    Ok(())
}
