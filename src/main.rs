mod cli;

use anyhow::{Context, Result};
use cli::{Args, Command};
use finance_dashboard::{
    advise_on, config::DEFAULT_CONFIG_FILE, format_money, normalize_amount, parse_amount, Config,
    DashboardSummary, GeminiClient, GenerativeModel, Importer, Ledger, NewTransaction,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    let mut config = load_config(&args)?;
    config.merge(&args.overrides());

    match args.command {
        Command::Normalize { amounts, strict } => run_normalize(&amounts, strict, &config),
        Command::Session {
            add,
            import,
            text,
            remove,
            transfer,
            advice,
            json,
        } => {
            let plan = SessionPlan {
                add,
                import,
                text,
                remove,
                transfer,
                advice,
                json,
            };
            run_session(plan, &config).await
        }
        Command::InitConfig => Ok(()),
    }
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Write a default .finance-dashboard.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

fn run_normalize(amounts: &[String], strict: bool, config: &Config) -> Result<()> {
    let symbol = &config.display.currency_symbol;

    for raw in amounts {
        if strict {
            match parse_amount(raw) {
                Ok(value) => println!("{:>24}  →  {}", raw, format_money(symbol, value)),
                Err(e) => println!("{:>24}  →  ❌ {}", raw, e),
            }
        } else {
            println!("{:>24}  →  {}", raw, format_money(symbol, normalize_amount(raw)));
        }
    }
    Ok(())
}

struct SessionPlan {
    add: Vec<NewTransaction>,
    import: Vec<PathBuf>,
    text: Option<String>,
    remove: Vec<String>,
    transfer: Option<f64>,
    advice: bool,
    json: bool,
}

fn build_model(config: &Config) -> Option<Arc<dyn GenerativeModel>> {
    match GeminiClient::from_config(&config.ai) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("AI features disabled: {:#}", e);
            None
        }
    }
}

/// One session: this function owns the ledger for its whole lifetime.
async fn run_session(plan: SessionPlan, config: &Config) -> Result<()> {
    let mut ledger = Ledger::new();
    let symbol = &config.display.currency_symbol;

    for record in plan.add {
        ledger.add_transaction(record);
    }

    let needs_model = !plan.import.is_empty() || plan.text.is_some() || plan.advice;
    let model = if needs_model { build_model(config) } else { None };

    if let Some(ref model) = model {
        let importer = Importer::new(model.clone());

        for path in &plan.import {
            println!("📂 Importing {}...", path.display());
            let added = importer.import_file(&mut ledger, path).await;
            println!("✓ {} transaction(s) imported", added.len());
        }

        if let Some(ref text) = plan.text {
            println!("📋 Importing pasted text...");
            let added = importer.import_text(&mut ledger, text).await;
            println!("✓ {} transaction(s) imported", added.len());
        }
    } else if !plan.import.is_empty() || plan.text.is_some() {
        eprintln!("⚠️  No AI model available; nothing imported.");
    }

    for id in &plan.remove {
        if !ledger.remove_transaction(id) {
            debug!("No transaction with id {}", id);
        }
    }

    if let Some(amount) = plan.transfer {
        match ledger.try_transfer_to_savings(amount) {
            Ok(_) => println!("🏦 Moved {} to savings", format_money(symbol, amount)),
            Err(e) => eprintln!("❌ Transfer refused: {}", e),
        }
    }

    let summary = DashboardSummary::from_ledger(&ledger, symbol, config.display.recent_count);
    if plan.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    } else {
        println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        print!("{}", summary.render_text());
    }

    if plan.advice {
        let tips = match model {
            Some(ref model) => advise_on(model.as_ref(), &ledger).await,
            None => finance_dashboard::fallback_tips(),
        };
        if !tips.is_empty() {
            println!("\n💡 Tips:");
            for tip in tips {
                println!("   • {}", tip);
            }
        }
    }

    Ok(())
}
