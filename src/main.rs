//! # story-render CLI
//!
//! Command-line interface for the story renderer.
//!
//! ## Usage
//!
//! ```bash
//! # Run the template and render API
//! story-render serve --listen 0.0.0.0:8080 --patterns-dir ./patterns
//!
//! # Render a saved template to PNG
//! story-render render --template lenina.json --floor-plan plan.png --output story.png
//!
//! # Same, over a procedural background, with editing handles
//! story-render render --template lenina.json --geometric circles --handles --output story.png
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use story_render::{
    StoryEditor, StoryError,
    assets::{DecodeOutcome, decode_image_async},
    canvas::{Color, FontSet},
    geometry::PlacementKind,
    render::{BitmapPattern, GeometricKind, PatternLibrary},
    server::{self, DEFAULT_MAX_UPLOAD_BYTES, ServerConfig},
    template::{ImageRefs, StoryTemplate, TemplateDraft},
};

/// story-render - Real-estate story image renderer
#[derive(Parser, Debug)]
#[command(name = "story-render")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "STORY_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Largest accepted attachment in bytes
        #[arg(long, env = "STORY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,

        #[command(flatten)]
        assets: AssetArgs,
    },

    /// Render a template JSON file to PNG
    Render {
        /// Template or draft JSON
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Background photo
        #[arg(long, value_name = "IMG")]
        background: Option<PathBuf>,

        /// Floor-plan image
        #[arg(long, value_name = "IMG")]
        floor_plan: Option<PathBuf>,

        /// Flat background color (#rrggbb); tints --geometric when both are set
        #[arg(long, value_name = "HEX")]
        color: Option<Color>,

        /// Bitmap background pattern key
        #[arg(long, value_name = "KEY", conflicts_with_all = ["color", "geometric"])]
        pattern: Option<BitmapPattern>,

        /// Procedural background (circles, triangles)
        #[arg(long, value_name = "KIND")]
        geometric: Option<GeometricKind>,

        /// Draw editing handles around the images
        #[arg(long)]
        handles: bool,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        assets: AssetArgs,
    },
}

/// Fonts and pattern images, shared by both commands.
#[derive(clap::Args, Debug)]
struct AssetArgs {
    /// TrueType font for regular text
    #[arg(long, env = "STORY_FONT_REGULAR", value_name = "PATH")]
    font_regular: Option<PathBuf>,

    /// TrueType font for bold text
    #[arg(long, env = "STORY_FONT_BOLD", value_name = "PATH")]
    font_bold: Option<PathBuf>,

    /// Directory with the bitmap pattern PNGs
    #[arg(long, env = "STORY_PATTERNS_DIR", value_name = "DIR")]
    patterns_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StoryError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            max_upload_bytes,
            assets,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                max_upload_bytes,
                font_regular: assets.font_regular,
                font_bold: assets.font_bold,
                patterns_dir: assets.patterns_dir,
            };
            server::serve(config).await
        }
        Commands::Render {
            template,
            background,
            floor_plan,
            color,
            pattern,
            geometric,
            handles,
            output,
            assets,
        } => {
            let fonts = FontSet::discover(assets.font_regular.as_deref(), assets.font_bold.as_deref());
            if fonts.is_none() {
                warn!("no usable font found, text will be left out");
            }
            let patterns = assets
                .patterns_dir
                .as_deref()
                .map(PatternLibrary::load_dir)
                .unwrap_or_default();

            let draft: TemplateDraft = serde_json::from_slice(&std::fs::read(&template)?)
                .map_err(|e| StoryError::invalid("template", e.to_string()))?;

            let now = Instant::now();
            let mut editor = StoryEditor::new(fonts, Arc::new(patterns));
            editor.apply_template(&StoryTemplate::create(draft, ImageRefs::default()), now);

            if let Some(path) = background {
                load_layer(&mut editor, PlacementKind::Background, &path, now).await?;
            }
            if let Some(path) = floor_plan {
                load_layer(&mut editor, PlacementKind::FloorPlan, &path, now).await?;
            }

            editor.style_mut().apply_choices(color, pattern, geometric);

            let png = if handles {
                editor.preview_png()?
            } else {
                editor.export_png()?
            };
            std::fs::write(&output, png)?;
            info!(path = %output.display(), "story saved");
            Ok(())
        }
    }
}

/// Read an image file into the editor; a corrupt file only loses its layer.
async fn load_layer(
    editor: &mut StoryEditor,
    kind: PlacementKind,
    path: &Path,
    now: Instant,
) -> Result<(), StoryError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ticket = editor.begin_decode(kind, &name);
    let decoded = decode_image_async(bytes, name).await;
    if editor.complete_decode(kind, ticket, decoded, now) == DecodeOutcome::Failed {
        warn!(path = %path.display(), "image could not be decoded, layer skipped");
    }
    Ok(())
}
