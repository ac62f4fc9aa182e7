use anyhow::{Context, Result, bail};
use clap::Parser;
use curl_sections::{ParsedRequest, SectionSettings, looks_like_curl, parse, render_sections};
use serde_json::{Map, Value};
use std::{
    io::{self, Read},
    path::PathBuf,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Split a curl command into labeled sections.
#[derive(Debug, Parser)]
#[command(name = "curl-sections", version, about)]
struct Cli {
    /// The curl command. Read from stdin when omitted.
    command: Option<String>,

    /// Print the parsed request as JSON instead of sections.
    #[arg(long)]
    json: bool,

    /// TOML file choosing which sections to print.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Template variable for `{{ name }}` placeholders, as NAME=VALUE.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))
}

fn load_settings(path: Option<&PathBuf>) -> Result<SectionSettings> {
    let Some(path) = path else {
        return Ok(SectionSettings::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref())?;

    let input = match cli.command {
        Some(command) => command,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read curl command from stdin")?;
            buf
        }
    };
    let input = input.trim();
    if input.is_empty() {
        bail!("no curl command given");
    }
    if !looks_like_curl(input) {
        bail!("this doesn't look like a cURL command");
    }

    let parsed = if cli.vars.is_empty() {
        parse(input)
    } else {
        let context: Map<String, Value> = cli
            .vars
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        debug!(vars = context.len(), "rendering curl template");
        ParsedRequest::load(input, context)?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    let sections = render_sections(&parsed, &settings)?;
    if sections.is_empty() {
        bail!("no sections extracted, check the cURL syntax");
    }
    for section in sections {
        println!("{section}\n");
    }
    Ok(())
}
