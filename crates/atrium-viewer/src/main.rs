// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! atrium-viewer: renders the door scene with live cube-map reflections.
//! Main parses flags, loads prefs and wires App into winit.

use anyhow::{Context, Result};
use atrium_app_core::{ConfigPort, PrefsStore, ViewerPrefs};
use atrium_config_fs::FsConfigStore;
use clap::Parser;
use egui_winit::winit::event_loop::EventLoop;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod app;
mod app_frame;
mod gpu;
mod input;
mod mesh;
mod perf;
mod render;
mod render_port;
mod ui;
mod viewport;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Paneled door and two mirrored shapes with real-time cube-map reflections"
)]
struct Args {
    /// Door width in world units (overrides saved prefs)
    #[arg(long)]
    door_width: Option<f32>,
    /// Door height in world units (overrides saved prefs)
    #[arg(long)]
    door_height: Option<f32>,
    /// Reflection cube map resolution per face, in pixels
    #[arg(long)]
    capture_resolution: Option<u32>,
    /// Present without vsync
    #[arg(long)]
    no_vsync: bool,
    /// Directory holding viewer_prefs.json (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Neither read nor write saved prefs
    #[arg(long)]
    ephemeral: bool,
}

impl Args {
    fn apply(&self, prefs: &mut ViewerPrefs) {
        if let Some(width) = self.door_width {
            prefs.scene.door.width = width;
        }
        if let Some(height) = self.door_height {
            prefs.scene.door.height = height;
        }
        if let Some(resolution) = self.capture_resolution {
            prefs.scene.capture.resolution = resolution;
        }
        if self.no_vsync {
            prefs.hud.vsync = false;
        }
    }

    fn config_port(&self) -> Option<Box<dyn ConfigPort>> {
        if self.ephemeral {
            return None;
        }
        let store = match &self.config_dir {
            Some(dir) => FsConfigStore::at(dir),
            None => FsConfigStore::new(),
        };
        match store {
            Ok(store) => Some(Box::new(PrefsStore::new(store))),
            Err(err) => {
                warn!(error = %err, "config store unavailable; prefs won't persist this session");
                None
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();
    let args = Args::parse();
    let config = args.config_port();
    let mut prefs = config
        .as_ref()
        .map(|c| c.load_prefs())
        .unwrap_or_default();
    args.apply(&mut prefs);
    prefs
        .validate()
        .context("command-line overrides describe an invalid scene")?;

    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(prefs, config);
    event_loop.run_app(&mut app)?;
    app.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_prefs() {
        let args = Args::try_parse_from([
            "atrium-viewer",
            "--door-width",
            "2.5",
            "--capture-resolution",
            "512",
            "--no-vsync",
        ])
        .unwrap();
        let mut prefs = ViewerPrefs::default();
        args.apply(&mut prefs);
        assert_eq!(prefs.scene.door.width, 2.5);
        assert_eq!(prefs.scene.door.height, ViewerPrefs::default().scene.door.height);
        assert_eq!(prefs.scene.capture.resolution, 512);
        assert!(!prefs.hud.vsync);
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn invalid_override_fails_validation() {
        let args = Args::try_parse_from(["atrium-viewer", "--door-height", "0"]).unwrap();
        let mut prefs = ViewerPrefs::default();
        args.apply(&mut prefs);
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn ephemeral_skips_the_store() {
        let args = Args::try_parse_from(["atrium-viewer", "--ephemeral"]).unwrap();
        assert!(args.config_port().is_none());
    }
}
