use carms_platform::config::cli::{Cli, Command, EtlArgs};
use carms_platform::domain::ports::Warehouse;
use carms_platform::utils::error::ErrorSeverity;
use carms_platform::utils::{logger, validation::Validate};
use carms_platform::{
    api, dashboard, CarmsError, EtlEngine, LocalStorage, MemoryWarehouse, PgWarehouse,
    ProgramPipeline, Settings,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!(
            "Warehouse: {}, sources: {}",
            settings.masked_database_url(),
            settings.raw_data_dir
        );
    }

    let outcome = match &cli.command {
        Command::Etl(args) => run_etl(&settings, args).await,
        Command::Serve(_) => serve_api(&settings).await,
        Command::Dashboard(_) => dashboard::serve(&settings.dashboard_bind, &settings.api_url).await,
        Command::InitDb => init_db(&settings).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, CarmsError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

async fn run_etl(settings: &Settings, args: &EtlArgs) -> Result<(), CarmsError> {
    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let warehouse: Arc<dyn Warehouse> = if args.dry_run {
        tracing::info!("Dry run: loading into an in-memory warehouse");
        Arc::new(MemoryWarehouse::new())
    } else {
        Arc::new(PgWarehouse::connect(&settings.database_url, settings.max_connections).await?)
    };

    let storage = LocalStorage::new(settings.raw_data_dir.clone());
    let pipeline = ProgramPipeline::new(storage, settings.clone(), warehouse);
    let report = EtlEngine::new_with_monitoring(pipeline, args.monitor)
        .run()
        .await?;

    println!("✅ Load job completed in {:.2?}", report.duration);
    for asset in &report.materializations {
        println!("   {:<30} {:>7} rows  {:.2?}", asset.asset, asset.rows, asset.duration);
    }
    let summary = report.summary;
    println!(
        "📦 {} disciplines, {} schools, {} programs, {} sections{}",
        summary.disciplines_count,
        summary.schools_count,
        summary.programs_count,
        summary.sections_count,
        if args.dry_run { " (dry run, nothing persisted)" } else { "" }
    );
    Ok(())
}

async fn serve_api(settings: &Settings) -> Result<(), CarmsError> {
    let warehouse =
        PgWarehouse::connect(&settings.database_url, settings.max_connections).await?;
    api::serve(&settings.api_bind, Arc::new(warehouse)).await
}

async fn init_db(settings: &Settings) -> Result<(), CarmsError> {
    let warehouse =
        PgWarehouse::connect(&settings.database_url, settings.max_connections).await?;
    warehouse.ensure_schema().await?;
    println!("✅ Warehouse schema ready at {}", settings.masked_database_url());
    Ok(())
}
