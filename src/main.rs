use clap::Parser;
use small_ingest::utils::{logger, validation::Validate};
use small_ingest::{CliConfig, EtlError, IngestPipeline};

fn report_failure(stage: &str, e: &EtlError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, exit code {})",
        stage,
        e,
        e.category(),
        e.exit_code()
    );
    eprintln!("❌ {} failed: {}", stage, e);
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting small-ingest");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => report_failure("Configuration", &e),
    };
    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
    }

    tracing::info!(
        "Importing {} from '{}' into '{}'",
        config.entity,
        config.source,
        config.store
    );

    let pipeline = IngestPipeline::new(config);
    match pipeline.run().await {
        Ok(output) => {
            println!("{}", output.summary.render());
            if cli.show_issues {
                println!("{}", output.summary.render_issues());
            }
            print!("{}", output.stored);
            tracing::info!("✅ Import of {} completed", output.entity);
        }
        Err(e) => report_failure("Import", &e),
    }
}
