//! bionic - Bionic reading for HTML files

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use url::Url;

use bionic::dom::{parse_html_bytes, serialize_document};
use bionic::{Classifier, IntensityLevel, JsonFileStore, PageContext, SettingsStore, Walker};

#[derive(Parser)]
#[command(name = "bionic")]
#[command(version, about = "Bionic reading for HTML files", long_about = None)]
#[command(after_help = "EXAMPLES:
    bionic article.html out.html           Emphasize at the default level
    bionic -l deep article.html            Write the result to stdout
    bionic --strip out.html article.html   Undo a previous run")]
struct Cli {
    /// Input HTML file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (stdout when omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<String>,

    /// Intensity: glance, focus or deep
    #[arg(short, long, value_parser = parse_level)]
    level: Option<IntensityLevel>,

    /// Address the document was fetched from
    #[arg(short, long)]
    url: Option<String>,

    /// Settings file to take the level from when --level is absent
    #[arg(short, long, value_name = "FILE")]
    settings: Option<String>,

    /// Remove emphasis instead of adding it
    #[arg(long)]
    strip: bool,

    /// Suppress output messages
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log each pass
    #[arg(short, long)]
    verbose: bool,
}

fn parse_level(s: &str) -> Result<IntensityLevel, String> {
    s.parse().map_err(|e: bionic::Error| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if cli.quiet {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet {
        "off"
    } else if cli.verbose {
        "bionic=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let bytes = fs::read(&cli.input).map_err(|e| format!("{}: {e}", cli.input))?;
    let mut dom = parse_html_bytes(&bytes);
    let root = dom.document();

    if cli.strip {
        let removed = Walker::remove_effects(&mut dom, root);
        debug!(removed, "stripped");
    } else {
        let level = resolve_level(cli)?;
        let context = match &cli.url {
            Some(url) => PageContext::from_url(url).map_err(|e| e.to_string())?,
            None => PageContext::default(),
        };
        let classifier = Classifier::new(context).map_err(|e| e.to_string())?;
        let wrapped = Walker::new(classifier, level).apply(&mut dom, root);
        debug!(wrapped, %level, "emphasized");
    }

    let html = serialize_document(&dom);
    match &cli.output {
        Some(path) => fs::write(path, html).map_err(|e| format!("{path}: {e}"))?,
        None => io::stdout()
            .write_all(html.as_bytes())
            .map_err(|e| e.to_string())?,
    }
    Ok(())
}

/// `--level`, else the level stored for the `--url` host, else the default.
fn resolve_level(cli: &Cli) -> Result<IntensityLevel, String> {
    if let Some(level) = cli.level {
        return Ok(level);
    }
    let Some(path) = &cli.settings else {
        return Ok(IntensityLevel::default());
    };
    let settings = JsonFileStore::new(path).load();
    let host = match &cli.url {
        Some(url) => Url::parse(url)
            .map_err(|e| format!("{url}: {e}"))?
            .host_str()
            .unwrap_or_default()
            .to_string(),
        None => String::new(),
    };
    Ok(settings.seed(&host, cli.url.as_deref().unwrap_or_default()).level)
}
