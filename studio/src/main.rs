//! FlowStudio - command line entry point
//!
//! Thin front end over the studio library: inspect the node catalog,
//! validate or publish a draft, run a tag query, or follow a debug session's
//! event stream.

use std::collections::HashMap;
use std::env;

use anyhow::{bail, Context};
use tracing::{error, info, warn};

use flowstudio::app::context::StudioContext;
use flowstudio::app::settings::Settings;
use flowstudio::logs::{init_logging, LogOptions};
use flowstudio::models::debug::SessionStatus;
use flowstudio::tags::TagCondition;
use flowstudio::utils::version_info;

const DEFAULT_CONFIG_FILE: &str = "flowstudio.json";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            cli_args.insert(key.trim_start_matches('-').to_string(), value.to_string());
        } else if arg.starts_with("--") {
            cli_args.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    if let Err(e) = run(&cli_args).await {
        error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli_args: &HashMap<String, String>) -> anyhow::Result<()> {
    let settings = load_settings(cli_args).await?;

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.json_logs,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut context = StudioContext::new(&settings).context("building studio context")?;

    if cli_args.contains_key("templates") {
        return print_templates(&mut context).await;
    }
    if let Some(draft_id) = cli_args.get("validate") {
        return validate(&mut context, draft_id).await;
    }
    if let Some(draft_id) = cli_args.get("publish") {
        return publish(&mut context, draft_id).await;
    }
    if let Some(raw) = cli_args.get("query") {
        return query(&mut context, raw, cli_args.get("page")).await;
    }
    if let Some(session_id) = cli_args.get("watch") {
        return watch(&mut context, session_id).await;
    }

    bail!(
        "nothing to do; use --templates, --validate=<draft>, --publish=<draft>, \
         --query=<condition json> or --watch=<session>"
    )
}

async fn load_settings(cli_args: &HashMap<String, String>) -> anyhow::Result<Settings> {
    let mut settings = match cli_args.get("config") {
        Some(path) => Settings::load(path)
            .await
            .with_context(|| format!("loading {}", path))?,
        None => match Settings::load(DEFAULT_CONFIG_FILE).await {
            Ok(settings) => settings,
            Err(_) => Settings::default(),
        },
    };

    if let Some(base_url) = cli_args.get("base-url") {
        settings.backend.base_url = base_url.clone();
    }
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    Ok(settings)
}

async fn print_templates(context: &mut StudioContext) -> anyhow::Result<()> {
    context.designer.load_templates().await;
    if context.designer.using_builtin_templates() {
        warn!("Backend catalog unavailable, showing built-in templates");
    }
    for template in context.designer.templates() {
        println!(
            "{:<20} {:<20} {:?}",
            template.node_type, template.name, template.category
        );
    }
    Ok(())
}

async fn validate(context: &mut StudioContext, draft_id: &str) -> anyhow::Result<()> {
    context.designer.load_draft(draft_id).await?;
    let result = context.designer.validate().await?;

    for issue in &result.errors {
        println!("error   {:<24} {}", issue.node_id.as_deref().unwrap_or("-"), issue.message);
    }
    for issue in &result.warnings {
        println!("warning {:<24} {}", issue.node_id.as_deref().unwrap_or("-"), issue.message);
    }

    if !result.valid {
        bail!("draft {} has {} errors", draft_id, result.errors.len());
    }
    info!("Draft {} is valid", draft_id);
    Ok(())
}

async fn publish(context: &mut StudioContext, draft_id: &str) -> anyhow::Result<()> {
    context.designer.load_draft(draft_id).await?;
    let published = context.designer.publish().await?;
    println!("{}", published);
    Ok(())
}

async fn query(
    context: &mut StudioContext,
    raw: &str,
    page: Option<&String>,
) -> anyhow::Result<()> {
    let condition: TagCondition =
        serde_json::from_str(raw).context("parsing tag condition")?;
    let page = match page {
        Some(p) => p.parse().context("parsing --page")?,
        None => 1,
    };

    context.tags.query_by_tags(condition, page, 0).await?;
    let query = context.tags.query();
    for user in &query.result.results {
        println!("{:<24} {}", user.user_id, user.username.as_deref().unwrap_or("-"));
    }
    println!(
        "page {}/{} ({} users)",
        query.page,
        query.total_pages(),
        query.result.total
    );
    Ok(())
}

async fn watch(context: &mut StudioContext, session_id: &str) -> anyhow::Result<()> {
    let debugger = &mut context.debugger;
    debugger.attach(session_id).await?;
    debugger.connect(session_id).await?;
    info!("Watching debug session {} (Ctrl+C to stop)", session_id);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, closing event channel...");
                break;
            }
            event = debugger.next_event() => {
                let Some(event) = event else {
                    info!("Event channel closed");
                    break;
                };
                println!("{}", serde_json::to_string(&event)?);
                if matches!(debugger.status(), Some(SessionStatus::Completed | SessionStatus::Error)) {
                    break;
                }
            }
        }
    }

    debugger.disconnect().await;
    Ok(())
}
