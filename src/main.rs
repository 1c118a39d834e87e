use catalog_import::utils::error::{ErrorSeverity, ImportError};
use catalog_import::utils::{logger, validation::Validate};
use catalog_import::{
    CliConfig, HttpImportGateway, ImportSession, ImportSummary, LocalFileSource, TomlConfig,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;

#[derive(Serialize)]
struct ImportReport<'a> {
    file: &'a str,
    finished_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a ImportSummary,
}

fn exit_code(error: &ImportError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(error: &ImportError) -> ! {
    tracing::error!(
        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    if let Some(partial) = error.partial_summary() {
        eprintln!(
            "⚠️  Already created before the failure: {} products, {} variants",
            partial.products_created, partial.variants_created
        );
    }
    if error.is_retryable() {
        eprintln!("🔁 The same file can be submitted again");
    }
    std::process::exit(exit_code(error));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config: TomlConfig = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if config.logging.json {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("🚀 Starting catalog-import");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let gateway = match HttpImportGateway::from_config(&config) {
        Ok(gateway) => gateway,
        Err(e) => fail(&e),
    };
    let session = ImportSession::new(gateway, config.validator_options());

    if let Err(e) = session.open(&LocalFileSource::default(), cli.files.as_slice()).await {
        fail(&e);
    }
    let file_name = session.selected_file_name().unwrap_or_default();

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the backend will not be contacted");
        match session.check() {
            Ok(validated) => {
                println!("✅ '{}' is ready to import", file_name);
                println!(
                    "📦 {} products, {} variants from {} rows",
                    validated.groups.len(),
                    validated.variant_count(),
                    validated.rows.len()
                );
            }
            Err(e) => fail(&e),
        }
        return Ok(());
    }

    match session.submit().await {
        Ok(summary) => {
            tracing::info!("✅ Import of '{}' completed", file_name);
            if config.logging.json {
                let report = ImportReport {
                    file: &file_name,
                    finished_at: Utc::now(),
                    summary: &summary,
                };
                println!("{}", serde_json::to_string(&report)?);
            } else {
                if let Some(message) = &summary.message {
                    println!("✅ {}", message);
                }
                println!("📦 Products created: {}", summary.products_created);
                println!("🧩 Variants created: {}", summary.variants_created);
                println!("🔁 Variants updated: {}", summary.updated_variants);
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
