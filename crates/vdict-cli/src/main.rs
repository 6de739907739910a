//! `vdict`: inspect dictionary catalogs from the command line

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vdict_item::DictItem;
use vdict_manager::{
    CatalogConfig, DictManager, DirectoryFetcher, FetchOptions, ManagerOptions, UseDictOptions,
};

fn cli() -> Command {
    let catalog = Arg::new("catalog")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Catalog file (.toml, .json, .yaml)");

    Command::new("vdict")
        .version(vdict_manager::VERSION)
        .about("Dictionary catalog inspector")
        .subcommand_required(true)
        .subcommand(
            Command::new("codes")
                .about("List the codes a catalog defines")
                .arg(catalog.clone()),
        )
        .subcommand(
            Command::new("show")
                .about("Load one dictionary and print its items")
                .arg(catalog)
                .arg(Arg::new("code").required(true).help("Dictionary code"))
                .arg(
                    Arg::new("remote-dir")
                        .long("remote-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory holding <CODE>.json item lists for remote dictionaries"),
                )
                .arg(
                    Arg::new("option")
                        .long("option")
                        .short('o')
                        .action(ArgAction::Append)
                        .help("Fetch option as key=value"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output items as JSON"),
                ),
        )
}

fn parse_option(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("fetch option '{raw}' is not key=value");
    };
    // Values that parse as JSON keep their type; everything else is a string.
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

fn render_table(items: &[DictItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}\t{}", item.value, item.label().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn codes(args: &ArgMatches) -> Result<()> {
    let path = args.get_one::<PathBuf>("catalog").context("missing catalog")?;
    let catalog = CatalogConfig::from_path(path)?;
    for (code, config) in &catalog.dictionaries {
        match &config.extends {
            Some(base) => println!("{code}\t(extends {base})"),
            None if config.remote => println!("{code}\t(remote)"),
            None => println!("{code}"),
        }
    }
    Ok(())
}

async fn show(args: &ArgMatches) -> Result<()> {
    let path = args.get_one::<PathBuf>("catalog").context("missing catalog")?;
    let code = args.get_one::<String>("code").context("missing code")?;

    let mut options = ManagerOptions::new();
    if let Some(dir) = args.get_one::<PathBuf>("remote-dir") {
        options = options.with_fetch(DirectoryFetcher::new(dir));
    }
    let manager = DictManager::new(options);
    CatalogConfig::from_path(path)?.install(&manager)?;

    let mut fetch_options = FetchOptions::new();
    for raw in args.get_many::<String>("option").into_iter().flatten() {
        let (key, value) = parse_option(raw)?;
        fetch_options.insert(key, value);
    }

    let binding = manager.handle(code)?.use_dict(UseDictOptions {
        fetch_options,
        ..UseDictOptions::default()
    })?;
    binding
        .load_promise()
        .await
        .with_context(|| format!("loading dictionary '{code}'"))?;

    let items = binding.list();
    info!(code = %code, items = items.len(), "dictionary loaded");
    if args.get_flag("json") {
        let json: Vec<Value> = items.iter().map(DictItem::to_json).collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", render_table(&items));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("codes", args)) => codes(args),
        Some(("show", args)) => show(args).await,
        _ => unreachable!("subcommand is required"),
    }
}
