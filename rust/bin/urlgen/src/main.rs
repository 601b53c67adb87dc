use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pmp_urlgen::{GenConfig, Target};
use tracing::info;

#[derive(Parser)]
#[command(name = "generate-url")]
#[command(about = "Generate the typed URL table from the pages directory")]
struct Args {
    /// Pages directory to scan
    #[arg(long, default_value = "src/pages")]
    pages: PathBuf,

    /// Output file [default: src/url/url.g.ts, or src/url/url_g.rs for rust]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output target (typescript, rust)
    #[arg(short, long, default_value = "typescript")]
    target: Target,

    /// Page file extension
    #[arg(long, default_value = "tsx")]
    ext: String,

    /// Path of the decoder module referenced by the rust target
    #[arg(long, default_value = "crate::decoders")]
    decoders: String,

    /// Fail instead of writing when the output is stale
    #[arg(long)]
    check: bool,

    /// Print the scanned page tree as JSON and exit
    #[arg(long)]
    print_tree: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = GenConfig {
        output: args
            .output
            .unwrap_or_else(|| args.target.default_output()),
        pages_dir: args.pages,
        target: args.target,
        extension: args.ext,
        decoders_path: args.decoders,
        ..GenConfig::default()
    };

    if args.print_tree {
        let pages = pmp_urlgen::scan_pages(&config.pages_dir, &config.extension)?;
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    let file = pmp_urlgen::generate(&config)
        .with_context(|| format!("failed to generate from {}", config.pages_dir.display()))?;

    if args.check {
        if !pmp_urlgen::is_up_to_date(&file)? {
            anyhow::bail!("{} is out of date, rerun generate-url", file.path.display());
        }
        info!(path = %file.path.display(), "url table is up to date");
        return Ok(());
    }

    pmp_urlgen::write_if_changed(&file)?;
    Ok(())
}
