use crate::{
    config::{self, AppConfig},
    filter::FilterData,
    gear::{match_pattern, GearGroups, GearTable},
    item::{self, extract_number, ItemProperty},
    logging::Log,
};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum CliCommand {
    Groups,
    Scan(ScanOptions),
    Match { pattern: String, text: String },
    Paths,
    Help,
    Version,
}

#[derive(Debug, PartialEq)]
struct ScanOptions {
    path: PathBuf,
    filters: Vec<String>,
}

#[derive(Serialize)]
struct ScanRow<'a> {
    item: &'a str,
    gear: GearTable,
}

#[derive(Serialize)]
struct MatchRow<'a> {
    pattern: &'a str,
    matched: bool,
    value: f64,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, format) = parse_args(&args)?;
    match command {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("gearsum v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let config = AppConfig::load_or_create()?;
            let mut log = Log::new(config::log_path().ok());
            let result = run_command(&config, &mut log, command, format);
            if let Err(err) = &result {
                log.error(format!("{err:#}"));
            }
            result
        }
    }
}

fn run_command(
    config: &AppConfig,
    log: &mut Log,
    command: CliCommand,
    format: OutputFormat,
) -> Result<()> {
    let groups = config.gear_groups()?;
    if config.gear_groups.is_some() {
        log.info(format!("Using {} configured gear group(s)", groups.groups().len()));
    }

    match command {
        CliCommand::Groups => {
            let names: Vec<&str> = groups.names().collect();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                OutputFormat::Text => {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
        }
        CliCommand::Scan(options) => scan(&groups, log, options, format)?,
        CliCommand::Match { pattern, text } => {
            let property = ItemProperty::named(text);
            let value = match_pattern(&pattern, &property, extract_number);
            let row = MatchRow {
                pattern: &pattern,
                matched: value.is_some(),
                value: value.unwrap_or(0.0),
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&row)?),
                OutputFormat::Text if row.matched => println!("matched: {}", row.value),
                OutputFormat::Text => println!("no match"),
            }
        }
        CliCommand::Paths => {
            println!("Config: {}", config::config_path()?.display());
            println!("Log: {}", config::log_path()?.display());
        }
        CliCommand::Help | CliCommand::Version => {}
    }
    Ok(())
}

fn scan(
    groups: &GearGroups,
    log: &mut Log,
    options: ScanOptions,
    format: OutputFormat,
) -> Result<()> {
    let items = item::load_items(&options.path)?;
    let filter = FilterData::from_names(options.filters);
    log.info(format!(
        "Scanning {} item(s) from {}",
        items.len(),
        options.path.display()
    ));

    let rows: Vec<ScanRow> = items
        .iter()
        .filter(|item| filter.matches(item, groups))
        .map(|item| ScanRow {
            item: item.display_name(),
            gear: groups.table_for(item),
        })
        .collect();
    if rows.is_empty() {
        log.warn("Scan matched no items".to_string());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for row in &rows {
                let gear = row
                    .gear
                    .iter()
                    .map(|(name, total)| format!("{name}={total}"))
                    .collect::<Vec<String>>()
                    .join(", ");
                if gear.is_empty() {
                    println!("{}: (no gear type)", row.item);
                } else {
                    println!("{}: {gear}", row.item);
                }
            }
        }
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<(CliCommand, OutputFormat)> {
    let mut format = OutputFormat::Text;
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--format=") {
            format = parse_format(value)?;
            continue;
        }
        if arg == "--format" {
            let Some(value) = iter.next() else {
                bail!("--format requires a value");
            };
            format = parse_format(value)?;
            continue;
        }
        tokens.push(arg.as_str());
    }

    let command = match tokens.as_slice() {
        [] | ["--help" | "-h" | "help", ..] => CliCommand::Help,
        ["--version" | "-V" | "version", ..] => CliCommand::Version,
        ["groups"] => CliCommand::Groups,
        ["paths"] => CliCommand::Paths,
        ["match", pattern, text] => CliCommand::Match {
            pattern: pattern.to_string(),
            text: text.to_string(),
        },
        ["match", ..] => bail!("match requires a pattern and a property text"),
        ["scan", rest @ ..] => CliCommand::Scan(parse_scan(rest)?),
        [other, ..] => bail!("Unknown command: {other} (see --help)"),
    };
    Ok((command, format))
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match OutputFormat::parse(value) {
        Some(format) => Ok(format),
        None => bail!("Unknown format: {value} (use 'text' or 'json')"),
    }
}

fn parse_scan(args: &[&str]) -> Result<ScanOptions> {
    let mut path = None;
    let mut filters = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--filter" => {
                if let Some(value) = iter.next() {
                    filters.push(value.to_string());
                } else {
                    bail!("--filter requires a value");
                }
            }
            value if value.starts_with("--filter=") => {
                filters.push(value.trim_start_matches("--filter=").to_string());
            }
            value if path.is_none() => path = Some(PathBuf::from(value)),
            value => bail!("Unexpected argument: {value}"),
        }
    }

    let Some(path) = path else {
        bail!("scan requires an items file");
    };
    Ok(ScanOptions { path, filters })
}

fn print_help() {
    println!("gearsum");
    println!("  groups                          List gear types");
    println!("  scan <items.json> [--filter X]  Print gear sums per item");
    println!("  match <pattern> <text>          Test one pattern against a property");
    println!("  paths                           Show config and log locations");
    println!("  --format text|json              Output format");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn empty_args_show_help() {
        let (command, format) = parse_args(&[]).expect("parse");
        assert_eq!(command, CliCommand::Help);
        assert_eq!(format, OutputFormat::Text);
    }

    #[test]
    fn format_flag_anywhere() {
        let (command, format) = parse_args(&args(&["groups", "--format", "json"])).expect("parse");
        assert_eq!(command, CliCommand::Groups);
        assert_eq!(format, OutputFormat::Json);
        assert!(parse_args(&args(&["groups", "--format=xml"])).is_err());
    }

    #[test]
    fn scan_collects_filters() {
        let (command, _) = parse_args(&args(&[
            "scan",
            "stash.json",
            "--filter",
            "Ring",
            "--filter=Amulet",
        ]))
        .expect("parse");
        assert_eq!(
            command,
            CliCommand::Scan(ScanOptions {
                path: PathBuf::from("stash.json"),
                filters: vec!["Ring".to_string(), "Amulet".to_string()],
            })
        );
    }

    #[test]
    fn scan_requires_path() {
        assert!(parse_args(&args(&["scan", "--filter", "Ring"])).is_err());
        assert!(parse_args(&args(&["scan", "a.json", "b.json"])).is_err());
    }

    #[test]
    fn match_takes_two_arguments() {
        let (command, _) =
            parse_args(&args(&["match", "Sword", "12% increased Sword Damage"])).expect("parse");
        assert_eq!(
            command,
            CliCommand::Match {
                pattern: "Sword".to_string(),
                text: "12% increased Sword Damage".to_string(),
            }
        );
        assert!(parse_args(&args(&["match", "Sword"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
