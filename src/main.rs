use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;

use objview::app::ViewerApp;
use objview::config::ViewerConfig;
use objview::gfx::rendering::HeadlessBackend;
use objview::viewer::Viewer;

/// Interactive OBJ scene viewer.
#[derive(Debug, Parser)]
#[command(
    name = "objview",
    version,
    after_help = "Models given on the command line are imported one at a time with the O key."
)]
struct Args {
    /// Viewer settings (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scene description to load at startup
    #[arg(long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Import the models, bake them and write OUT.obj without opening a window
    #[arg(long, value_name = "OUT.obj", requires = "models")]
    export: Option<PathBuf>,

    #[arg(value_name = "MODEL.obj")]
    models: Vec<PathBuf>,
}

/// Imports every model, bakes the scene and writes it out without a window.
fn batch_export(config: ViewerConfig, models: &[PathBuf], out: &Path) -> anyhow::Result<()> {
    if models.is_empty() {
        bail!("--export needs at least one model");
    }

    let mut backend = HeadlessBackend::new();
    let mut viewer = Viewer::new(config);
    for model in models {
        viewer
            .import(model, &mut backend)
            .with_context(|| format!("failed to import {}", model.display()))?;
    }
    viewer.scene.resolve_collisions(viewer.config.platform_height);
    let written = viewer
        .bake_and_export(out, &mut backend)
        .with_context(|| format!("failed to export {}", out.display()))?;
    log::info!("Baked {} objects into {}", written, out.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    if let Some(out) = &args.export {
        return batch_export(config, &args.models, out);
    }

    let mut viewer = Viewer::new(config);
    for model in args.models {
        viewer.queue_import(model);
    }
    log::info!(
        "{} models queued; O imports the next one",
        viewer.pending_imports()
    );

    let mut app = ViewerApp::new(viewer)?;
    if let Some(scene) = args.scene {
        app.load_scene_on_start(scene);
    }
    app.run()
}
