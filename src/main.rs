use anyhow::Context;
use tiny_research::cli::output::Output;
use tiny_research::cli::{Cli, Commands};
use tiny_research::utils::config::{LoggingConfig, ResearchConfig};
use tiny_research::{AppError, WorkflowEngine};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match cli.load_config(&output) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Config { validate } => {
            if validate {
                output.success(&format!("{} is valid", cli.config.display()));
                return Ok(());
            }
            show_config(&output, &config);
            Ok(())
        }
        Commands::Research {
            query,
            locale,
            trace,
        } => run_research(&output, &config, &query, locale, trace).await,
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tiny_research=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn show_config(output: &Output, config: &ResearchConfig) {
    output.header("LLM");
    output.kv("base_url", &config.llm.base_url);
    output.kv("model", &config.llm.model);
    output.kv(
        "api key",
        if config.llm.api_key().is_empty() {
            "not set"
        } else {
            "set"
        },
    );

    output.header("Search");
    output.kv(
        "backend",
        if config.search.tavily_api_key().is_some() {
            "tavily"
        } else {
            "duckduckgo"
        },
    );
    output.kv("max_results", &config.search.max_results.to_string());
    output.kv("crawl reader", &config.crawl.reader_url);
    output.kv("python", &config.code.python_bin);

    output.header("Workflow");
    output.kv("locale", &config.workflow.locale);
    output.kv(
        "max_plan_iterations",
        &config.workflow.max_plan_iterations.to_string(),
    );
    output.kv("max_step_num", &config.workflow.max_step_num.to_string());
    output.kv(
        "max_tool_iterations",
        &config.workflow.max_tool_iterations.to_string(),
    );
    output.kv(
        "recover_tool_errors",
        &config.workflow.recover_tool_errors.to_string(),
    );
}

async fn run_research(
    output: &Output,
    config: &ResearchConfig,
    query: &str,
    locale: Option<String>,
    trace: bool,
) -> anyhow::Result<()> {
    let engine = WorkflowEngine::from_config(config).context("failed to build workflow engine")?;
    let locale = locale.unwrap_or_else(|| config.workflow.locale.clone());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    output.banner();
    output.info(&format!("Researching with {}", config.llm.model));

    match engine.run_in_locale(query, &locale, &cancel).await {
        Ok(result) => {
            output.report(&result.final_response);
            if trace {
                output.trace(&result);
            }
            Ok(())
        }
        Err(AppError::Cancelled) => {
            output.warning("Research cancelled");
            std::process::exit(130);
        }
        Err(e) => {
            output.error(&e.to_string());
            if matches!(e, AppError::Configuration(_)) {
                output.hint("Run `tiny-research config` to inspect the active settings");
            }
            std::process::exit(1);
        }
    }
}
