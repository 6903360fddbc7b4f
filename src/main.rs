use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod media;
mod resolver;

use resolver::{MediaReference, Resolver};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TikTok share link to resolve
    url: String,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Where to write the downloaded video
    #[arg(short, long, default_value = "tiktok.mp4")]
    output: PathBuf,

    /// Print the resolved metadata instead of downloading
    #[arg(long)]
    info: bool,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/ttgrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/ttgrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn print_info(reference: &MediaReference) {
    println!("Author: {}", reference.author);
    if let Some(description) = &reference.description {
        println!("Description: {}", description);
    }
    if let Some(music) = &reference.music {
        println!("Music: {}", music);
    }
    if let Some(likes) = reference.engagement.likes {
        println!("Likes: {}", likes);
    }
    if let Some(comments) = reference.engagement.comments {
        println!("Comments: {}", comments);
    }
    if let Some(shares) = reference.engagement.shares {
        println!("Shares: {}", shares);
    }
    if let Some(views) = reference.engagement.views {
        println!("Views: {}", views);
    }
    if let Some(duration) = reference.duration_secs {
        println!("Duration: {}s", duration);
    }
    println!("Media URL: {}", reference.media_url);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = get_config_path(&args) {
        config::Config::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?
    } else {
        config::Config::default()
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let resolver = Resolver::new(
        &config.resolver.providers,
        config.resolver.attempt_timeout(),
    )?;

    if !resolver.is_supported_url(&args.url) {
        anyhow::bail!(
            "Unsupported URL; expected a link from vm.tiktok.com, vt.tiktok.com, www.tiktok.com or tiktok.com"
        );
    }

    let reference = match resolver.resolve(&args.url).await {
        Some(reference) => reference,
        None => anyhow::bail!("Could not retrieve the video, try another link"),
    };

    if args.info {
        print_info(&reference);
        return Ok(());
    }

    let data = media::download(
        &reference.media_url,
        config.download.max_bytes,
        config.download.timeout(),
    )
    .await?;

    tokio::fs::write(&args.output, &data)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!("Saved {} bytes to {}", data.len(), args.output.display());
    println!("Saved {}", args.output.display());

    Ok(())
}
