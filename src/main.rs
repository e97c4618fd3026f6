use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use svg_sprite_bundler::config::SpriteConfig;
use svg_sprite_bundler::selection::{AssetSelection, DEFAULT_SELECTION_FILE};
use svg_sprite_bundler::{SpriteBuildContext, SpriteBuilder, SpritePlugin};

/// Collect SVG references from HTML pages into one injected sprite.
#[derive(Debug, Parser)]
#[command(name = "svg-sprite", version, about)]
struct Cli {
  /// Log debug output.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Emit every page of the project with the sprite injected.
  Build {
    /// Project root.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Configuration file, defaults to `sprite.config.json` in the root.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory, overriding the configuration.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Selection override file, defaults to `sprite.local.json` in the root when present.
    #[arg(long)]
    selection: Option<PathBuf>,
    /// Write pages without a sprite when composition fails.
    #[arg(long)]
    keep_going: bool,
  },
  /// Print the location of the companion loader module.
  LoaderPath,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Command::Build {
      root,
      config,
      out,
      selection,
      keep_going,
    } => {
      let mut config = match config {
        Some(path) => SpriteConfig::from_path(&path)
          .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => SpriteConfig::discover(&root),
      };
      if let Some(out) = out {
        config.output_dir = out.to_string_lossy().into_owned();
      }

      let selection = match selection {
        Some(path) => AssetSelection::load_from_path(&path)?,
        None => {
          let local = AssetSelection::load_from_path(root.join(DEFAULT_SELECTION_FILE))?;
          if local.is_unfiltered() { config.selection() } else { local }
        }
      };

      let builder = SpriteBuilder::new(SpriteBuildContext {
        root: &root,
        config: &config,
        keep_going,
      });
      let artifacts = builder.build(&selection).await?;
      println!(
        "wrote {} page(s) with {} symbol(s), composed {} time(s); manifest at {}",
        artifacts.pages.len(),
        artifacts.symbols,
        artifacts.compositions,
        artifacts.manifest_path.display()
      );
    }
    Command::LoaderPath => {
      println!("{}", SpritePlugin::loader_path().display());
    }
  }

  Ok(())
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}
