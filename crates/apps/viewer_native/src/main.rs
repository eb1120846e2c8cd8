mod config;

use std::path::PathBuf;

use clap::Parser;
use foundation::math::Vec2;
use overlay::{Element, FeatureInspector, MemoryDocument, MountedViewer, OverlayError, SceneHost};
use scene::{PickOptions, SceneView, Tileset, TilesetError, Viewer};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ViewerConfig};

/// Point features around the demo camera target.
const DEMO_TILESET: &str = r#"{
  "name": "demo-campus",
  "features": [
    {"id": "bldg-101", "position": {"lon_deg": 120.7235, "lat_deg": 31.0184, "height_m": 12.0},
     "properties": {"name": "Main Hall", "floors": 4, "heritage": false}},
    {"id": "bldg-102", "position": {"lon_deg": 120.7262, "lat_deg": 31.0199, "height_m": 8.0},
     "properties": {"name": "Library", "floors": 3, "heritage": true}},
    {"id": "pump-7", "position": {"lon_deg": 120.7211, "lat_deg": 31.0168},
     "properties": {"name": "Pump Station 7", "capacity_m3h": 420.5, "operator": null}}
  ]
}"#;

#[derive(Parser, Debug)]
#[command(name = "viewer_native", about = "Headless globe viewer with a feature popup")]
struct Args {
    /// Tileset JSON; the built-in demo tileset is used when omitted.
    #[arg(long)]
    tileset: Option<PathBuf>,
    /// Viewer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames to render after the clicks.
    #[arg(long, default_value_t = 120)]
    frames: u64,
    /// Canvas click as `x,y`; repeatable. Defaults to the first feature's position.
    #[arg(long = "click", value_parser = parse_click)]
    clicks: Vec<Vec2>,
    /// Camera rotation about the polar axis per frame.
    #[arg(long, default_value_t = 1.5)]
    orbit_deg_per_frame: f64,
}

fn parse_click(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Vec2::new(x, y))
}

#[derive(Debug)]
enum AppError {
    Config(ConfigError),
    Tileset(TilesetError),
    Overlay(OverlayError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Tileset(e) => write!(f, "tileset: {e}"),
            AppError::Overlay(e) => write!(f, "overlay: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<TilesetError> for AppError {
    fn from(e: TilesetError) -> Self {
        AppError::Tileset(e)
    }
}

impl From<OverlayError> for AppError {
    fn from(e: OverlayError) -> Self {
        AppError::Overlay(e)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    picked: usize,
    visible_frames: u64,
    hidden_frames: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match args.config.as_deref().map(ViewerConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    match run(&args, &config) {
        Ok(summary) => info!(
            picked = summary.picked,
            visible_frames = summary.visible_frames,
            hidden_frames = summary.hidden_frames,
            "done"
        ),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn load_tileset(path: Option<&std::path::Path>) -> Result<Tileset, TilesetError> {
    match path {
        Some(path) => Tileset::from_path(path),
        None => Tileset::from_json_str(DEMO_TILESET),
    }
}

fn build_scene(
    config: &ViewerConfig,
    tileset: Tileset,
) -> Result<MountedViewer<MemoryDocument>, OverlayError> {
    let [width, height] = config.canvas;
    let mut viewer = Viewer::new(width, height);
    let cam = config.camera;
    viewer.fly_to(
        cam.lon_deg,
        cam.lat_deg,
        cam.height_m,
        cam.heading_deg.to_radians(),
        cam.pitch_deg.to_radians(),
    );
    info!(
        tileset = %tileset.name,
        features = tileset.len(),
        "tileset loaded"
    );
    viewer.add_tileset(tileset);

    let [pw, ph] = config.popup_size;
    let document = MemoryDocument::with_element_size(pw, ph);
    Ok(MountedViewer::new(viewer, document)?)
}

/// Screen position of the first feature, used when no click is given.
fn default_click(scene: &MountedViewer<MemoryDocument>) -> Option<Vec2> {
    let viewer = scene.viewer();
    let feature = viewer.tilesets().first()?.features.first()?;
    scene.world_to_window(feature.world_position(viewer.ellipsoid()))
}

fn run(args: &Args, config: &ViewerConfig) -> Result<RunSummary, AppError> {
    let tileset = load_tileset(args.tileset.as_deref())?;
    let mut scene = build_scene(config, tileset)?;

    let mut inspector = FeatureInspector::new(*scene.document(), &config.popup);
    inspector.set_pick_options(PickOptions {
        tolerance_px: config.pick_tolerance_px,
    });

    let clicks = if args.clicks.is_empty() {
        default_click(&scene).into_iter().collect()
    } else {
        args.clicks.clone()
    };
    if clicks.is_empty() {
        warn!("no click given and no feature in view");
    }

    let mut summary = RunSummary::default();
    for click in clicks {
        match inspector.handle_click(&scene, click) {
            Ok(Some(id)) => {
                summary.picked += 1;
                info!(feature = %id, x = click.x, y = click.y, "feature picked");
            }
            Ok(None) => info!(x = click.x, y = click.y, "nothing under cursor"),
            Err(e) => return Err(e.into()),
        }
    }

    let step = args.orbit_deg_per_frame.to_radians();
    for _ in 0..args.frames {
        let frame = scene.render();
        if let Some(panel) = inspector.popup().panel() {
            if inspector.popup().is_visible() {
                summary.visible_frames += 1;
            } else {
                summary.hidden_frames += 1;
            }
            debug!(
                frame = frame.index,
                left = panel.style("left").as_deref().unwrap_or("-"),
                top = panel.style("top").as_deref().unwrap_or("-"),
                visible = inspector.popup().is_visible(),
                "popup placement"
            );
        }
        scene.viewer_mut().camera.orbit_z(step);
    }

    if let Some(content) = inspector.popup().content_element() {
        debug!(html = %content.inner_html(), "popup content");
    }
    inspector.close();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(frames: u64, clicks: Vec<Vec2>, orbit: f64) -> Args {
        Args {
            tileset: None,
            config: None,
            frames,
            clicks,
            orbit_deg_per_frame: orbit,
        }
    }

    #[test]
    fn click_parser_accepts_pairs() {
        assert_eq!(parse_click("10,20.5"), Ok(Vec2::new(10.0, 20.5)));
        assert_eq!(parse_click(" 3 , 4 "), Ok(Vec2::new(3.0, 4.0)));
        assert!(parse_click("10").is_err());
        assert!(parse_click("a,1").is_err());
    }

    #[test]
    fn cli_collects_repeated_clicks() {
        let args = Args::try_parse_from([
            "viewer_native",
            "--click",
            "1,2",
            "--click",
            "3,4",
            "--frames",
            "5",
        ])
        .expect("parse");
        assert_eq!(args.clicks, vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(args.frames, 5);
        assert_eq!(args.orbit_deg_per_frame, 1.5);
    }

    #[test]
    fn demo_tileset_parses() {
        let tileset = load_tileset(None).expect("demo tileset");
        assert_eq!(tileset.name, "demo-campus");
        assert_eq!(tileset.len(), 3);
    }

    #[test]
    fn default_click_picks_and_tracks_without_orbit() {
        let summary = run(&args(10, Vec::new(), 0.0), &ViewerConfig::default()).expect("run");
        assert_eq!(
            summary,
            RunSummary {
                picked: 1,
                visible_frames: 10,
                hidden_frames: 0,
            }
        );
    }

    #[test]
    fn orbiting_to_the_far_side_hides_the_popup() {
        let summary = run(&args(120, Vec::new(), 1.5), &ViewerConfig::default()).expect("run");
        assert_eq!(summary.picked, 1);
        assert!(summary.visible_frames > 0);
        assert!(summary.hidden_frames > 0);
    }

    #[test]
    fn click_on_empty_sky_picks_nothing() {
        let summary = run(&args(3, vec![Vec2::new(0.0, 0.0)], 0.0), &ViewerConfig::default())
            .expect("run");
        assert_eq!(summary, RunSummary::default());
    }
}
