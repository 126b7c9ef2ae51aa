//! mcprobe - smoke-test harness for MCP servers over stdio
//!
//! Main entry point: spawns the server, runs the probe scenario, echoes
//! server output, and prints a per-step summary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcprobe::cli::Cli;
use mcprobe::config::ProbeConfig;
use mcprobe::probe::driver::{ProbeDriver, ProbeReport, StepOutcome};
use mcprobe::probe::transport::stdio::StdioTransport;
use mcprobe::probe::types::Implementation;
use mcprobe::probe::{connect, Connection};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration and fold in CLI overrides
    let mut config = ProbeConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config)?;
    config.validate()?;

    tracing::info!(
        "probing `{} {}` with tool `{}`",
        config.server.command,
        config.server.args.join(" "),
        config.tool.name
    );

    // Spawn the server. A missing executable fails here, immediately.
    let transport = StdioTransport::spawn(
        config.server.command.clone().into(),
        config.server.args.clone(),
        config.server.env.clone(),
        config.server.working_dir.clone(),
    )?;

    let Connection {
        client,
        mut echo_rx,
        cancel,
    } = connect(Arc::new(transport));

    // Printer task: every server stdout line, labeled, in arrival order.
    let printer = tokio::spawn(async move {
        while let Some(line) = echo_rx.recv().await {
            println!("{} {}", "SERVER:".cyan().bold(), line);
        }
    });

    let driver = ProbeDriver::new(
        client,
        Implementation {
            name: config.client.name.clone(),
            version: config.client.version.clone(),
        },
        config.client.protocol_version.clone(),
        Duration::from_secs(config.timeouts.request_seconds),
        Duration::from_secs(config.timeouts.call_seconds),
    );

    let report = driver
        .run(&config.tool.name, config.tool.arguments.clone())
        .await?;

    // Give trailing server output (late notifications, flushed logs) a
    // moment to reach the printer before tearing the connection down.
    tokio::time::sleep(Duration::from_millis(250)).await;
    cancel.cancel();
    printer.abort();

    print_report(&report);

    if !report.passed() {
        anyhow::bail!("probe failed");
    }
    Ok(())
}

/// Print the per-step summary and server identity.
fn print_report(report: &ProbeReport) {
    println!();
    println!("{}", "probe summary".bold());
    if let Some(version) = &report.protocol_version {
        println!("  server protocol: {version}");
    }
    if let Some(info) = &report.server_info {
        let name = info.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        let version = info.get("version").and_then(|v| v.as_str()).unwrap_or("?");
        println!("  server info:     {name} {version}");
    }
    for step in &report.steps {
        let status = match &step.outcome {
            StepOutcome::Ok(_) => "ok".green().to_string(),
            StepOutcome::RpcError { code, message } => {
                format!("{} {code}: {message}", "error".red())
            }
            StepOutcome::Timeout { seconds } => {
                format!("{} after {seconds}s", "timeout".red())
            }
        };
        println!("  {:<18} {}", step.method, status);
    }
    let verdict = if report.passed() {
        "PASS".green().bold()
    } else if report.aborted() {
        "ABORTED".red().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("  {verdict}");
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mcprobe=debug"
    } else {
        "mcprobe=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
