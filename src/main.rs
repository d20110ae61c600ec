use anyhow::Result;
use std::env;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ledger_watchdog::{
    print_report, AppConfig, ControlEngine, ExportDirSource, FileSink, RuleRegistry,
};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "watch" {
        // Watch mode: re-run every check interval
        run_watch(&config)
    } else {
        // Single run (default)
        run_once(&config)
    }
}

fn run_once(config: &AppConfig) -> Result<()> {
    println!("🤖 Ledger Watchdog - mode: {}", config.mode.as_str());

    let Some(export_dir) = config.export_dir.as_deref() else {
        eprintln!("❌ No ERP export directory configured!");
        eprintln!("   Set EXPORT_DIR to a directory containing the JSON exports");
        eprintln!("   (journal_entries.json, invoices.json, products.json, accounts.json).");
        std::process::exit(1);
    };

    let registry = match &config.enabled_rules {
        Some(enabled) => RuleRegistry::from_enabled(enabled, config.invoice_tolerance)?,
        None => RuleRegistry::with_default_rules(config.invoice_tolerance),
    };

    let source = ExportDirSource::new(export_dir, config.fetch_timeout);
    let engine = ControlEngine::new(registry);

    let todo = engine.run(&source);

    print_report(&todo);

    let sink = FileSink::new(&config.reports_dir);
    let path = sink.write(&todo)?;
    println!("\n💾 Report saved: {}", path.display());

    Ok(())
}

fn run_watch(config: &AppConfig) -> Result<()> {
    let interval = Duration::from_secs(config.check_interval_hours * 3600);
    println!(
        "⏱️  Watch mode: running every {} hour(s). Press Ctrl-C to stop.",
        config.check_interval_hours
    );

    loop {
        run_once(config)?;
        thread::sleep(interval);
    }
}
