//! Besticon command-line entry point.

mod output;

use std::io::Write;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use besticon::{main_color_for_icons, parse_size_range, FinderConfig, Icon, IconFinder, SizeRange};

#[derive(Parser, Debug)]
#[command(
    name = "besticon",
    about = "Find, fetch and rank the icons a website advertises",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Per-request timeout in milliseconds.
    /// Defaults to HTTP_CLIENT_TIMEOUT, then 5000.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Icon fetches in flight per lookup.
    /// Defaults to BESTICON_CONCURRENCY, then 4.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Domain whose lookups always start at the site root (repeatable).
    /// Adds to HOST_ONLY_DOMAINS.
    #[arg(long = "host-only-domain", value_name = "DOMAIN", global = true)]
    host_only_domains: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every icon found for a site, largest first.
    Fetch {
        url: String,

        /// Only list icons whose width falls in this range ("N" or "min..perfect..max").
        #[arg(long, value_parser = parse_size_arg)]
        size: Option<SizeRange>,

        /// Print icons as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the icon closest to the preferred size.
    Best {
        url: String,

        /// Acceptable sizes ("N" or "min..perfect..max").
        #[arg(long, value_parser = parse_size_arg)]
        size: SizeRange,

        /// Print the icon as JSON instead of its URL.
        #[arg(long)]
        json: bool,
    },

    /// Print the dominant color of a site's icons as #rrggbb.
    Color { url: String },

    /// Validate a size range and print its expanded form.
    ParseSize { range: String },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   besticon completions bash > ~/.local/share/bash-completion/completions/besticon
    ///   besticon completions zsh > ~/.zfunc/_besticon
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn parse_size_arg(raw: &str) -> Result<SizeRange, String> {
    parse_size_range(raw).map_err(|e| format!("{e}: {raw:?}"))
}

impl Cli {
    /// Environment and defaults, with command-line flags on top.
    fn finder_config(&self) -> FinderConfig {
        let mut config = FinderConfig::from_env();
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if let Some(n) = self.concurrency.filter(|n| *n > 0) {
            config.concurrency = n;
        }
        for domain in &self.host_only_domains {
            let domain = domain.trim().to_ascii_lowercase();
            if !domain.is_empty() && !config.host_only_domains.contains(&domain) {
                config.host_only_domains.push(domain);
            }
        }
        config
    }
}

async fn lookup(config: &FinderConfig, url: &str) -> anyhow::Result<(IconFinder, Vec<Icon>)> {
    let mut finder = IconFinder::from_config(config)?;
    let icons = finder
        .fetch_icons(url)
        .await
        .with_context(|| format!("icon lookup for {url} failed"))?;
    Ok((finder, icons))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.finder_config();
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Commands::Fetch { url, size, json } => {
            let (_, mut icons) = lookup(&config, url).await?;
            if let Some(range) = size {
                icons.retain(|icon| range.contains(icon.width));
            }
            if *json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&icons)?)?;
            } else {
                output::write_icon_table(&mut stdout, &icons)?;
            }
        }

        Commands::Best { url, size, json } => {
            let (finder, _) = lookup(&config, url).await?;
            let Some(icon) = finder.icon_in_size_range(*size) else {
                anyhow::bail!("no icon for {url} in size range {size}");
            };
            if *json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(icon)?)?;
            } else {
                writeln!(stdout, "{}", icon.url)?;
            }
        }

        Commands::Color { url } => {
            let config = FinderConfig {
                keep_image_bytes: true,
                ..config
            };
            let (_, icons) = lookup(&config, url).await?;
            let Some(color) = main_color_for_icons(&icons) else {
                anyhow::bail!("could not determine a main color for {url}");
            };
            let [r, g, b, _] = color.0;
            writeln!(stdout, "{}", output::hex_color([r, g, b]))?;
        }

        Commands::ParseSize { range } => {
            let parsed = parse_size_range(range).with_context(|| format!("invalid size range {range:?}"))?;
            writeln!(stdout, "{parsed}")?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "besticon", &mut stdout);
        }
    }

    Ok(())
}
