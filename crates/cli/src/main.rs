mod input;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use formchoice_api::HttpOptionFetcher;
use formchoice_engine::{ComponentOptions, EngineSettings, OptionComponent, SubmissionMetadata};
use serde_json::{Value, json};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    match matches.subcommand() {
        Some(("render", sub)) => run_render(sub).await,
        Some(("select", sub)) => run_select(sub).await,
        _ => anyhow::bail!("expected a subcommand: render or select"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let shared_args = [
        Arg::new("component")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Component definition (JSON or YAML)"),
        Arg::new("data")
            .long("data")
            .value_parser(value_parser!(PathBuf))
            .help("Submission data exposed to request templates"),
        Arg::new("metadata")
            .long("metadata")
            .value_parser(value_parser!(PathBuf))
            .help("Submission metadata holding listData/selectData"),
        Arg::new("value")
            .long("value")
            .help("Initial data value as JSON"),
        Arg::new("read-only")
            .long("read-only")
            .action(ArgAction::SetTrue)
            .help("Render as a read-only form"),
        Arg::new("base-url")
            .long("base-url")
            .help("Base URL for resources and relative URLs (defaults to FORMCHOICE_BASE_URL)"),
        Arg::new("search").long("search").help("Search term passed to the option source"),
    ];

    Command::new("formchoice")
        .about("Render and exercise selectable-option form components")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("render")
                .about("Load options and print the rendered inputs as JSON")
                .args(shared_args.clone()),
        )
        .subcommand(
            Command::new("select")
                .about("Replay option clicks and print the value after each one")
                .args(shared_args)
                .arg(
                    Arg::new("pick")
                        .long("pick")
                        .short('p')
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(usize))
                        .help("Index of the option to click; repeatable"),
                ),
        )
}

async fn run_render(matches: &ArgMatches) -> Result<()> {
    let (mut component, _) = build_component(matches)?;
    let rendered = component.render_when_ready().await;
    info!(key = %rendered.key, option_count = rendered.inputs.len(), "options rendered");
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

async fn run_select(matches: &ArgMatches) -> Result<()> {
    let (mut component, metadata) = build_component(matches)?;
    component.render_when_ready().await;

    let mut steps = Vec::new();
    for index in matches.get_many::<usize>("pick").into_iter().flatten().copied() {
        let outcome = component.select_option(index)?;
        debug!(index, changed = outcome.changed, reset = outcome.reset, "click replayed");
        steps.push(json!({
            "pick": index,
            "value": component.data_value(),
            "label": component.value_as_string(),
            "changed": outcome.changed,
            "reset": outcome.reset,
        }));
    }
    component.before_submit().await;

    let issues: Vec<String> = component.check_validity().iter().map(ToString::to_string).collect();
    let report = json!({
        "steps": steps,
        "value": component.data_value(),
        "validity": issues,
        "metadata": metadata.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_component(matches: &ArgMatches) -> Result<(OptionComponent, SubmissionMetadata)> {
    let path = matches.get_one::<PathBuf>("component").context("component path is required")?;
    let config = input::load_component(path)?;
    let form_data = input::read_optional(matches.get_one::<PathBuf>("data").map(PathBuf::as_path))?;
    let metadata = SubmissionMetadata::from_value(input::read_optional(matches.get_one::<PathBuf>("metadata").map(PathBuf::as_path))?);

    let mut settings = EngineSettings::from_env();
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        settings = settings.with_base_url(base_url.trim_end_matches('/'));
    }
    let fetcher = Arc::new(HttpOptionFetcher::new_from_env()?);
    let options = ComponentOptions {
        read_only: matches.get_flag("read-only"),
        form_data,
    };

    let mut component = OptionComponent::new(config, fetcher, metadata.shared(), &settings, options)?;
    if let Some(raw) = matches.get_one::<String>("value") {
        let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        component.set_value(value);
    }
    if let Some(search) = matches.get_one::<String>("search") {
        component.trigger_update(Some(search.as_str()));
    } else {
        component.attach();
    }
    Ok((component, metadata))
}
