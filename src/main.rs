use anyhow::{bail, Context};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

use rect_annotate::app::AnnotateApp;
use rect_annotate::store::{self, DirImageStore};
use rect_annotate::Config;

const USAGE: &str = "Usage: rect-annotate [--config <config.json>] [image.png|jpg]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    image: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a path\n{USAGE}");
                };
                parsed.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => bail!(USAGE),
            flag if flag.starts_with('-') => bail!("Unknown option {flag}\n{USAGE}"),
            _ if parsed.image.is_some() => bail!("Only one image may be given\n{USAGE}"),
            _ => parsed.image = Some(PathBuf::from(arg)),
        }
    }
    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default()?,
    };
    let store = DirImageStore::open(&config.store_dir)?;
    let background = args.image.as_deref().map(store::load_image).transpose()?;

    let title = match &args.image {
        Some(path) => format!(
            "rect-annotate — {}",
            path.file_name()
                .unwrap_or_default()
                .to_str()
                .unwrap_or("")
        ),
        None => "rect-annotate".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(AnnotateApp::new(&config, Arc::new(store), background)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run eframe: {e}"))
}
