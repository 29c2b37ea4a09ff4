use clap::Parser;
use estate_reports::core::ConfigProvider;
use estate_reports::utils::{logger, validation::Validate};
use estate_reports::{
    ChartPipeline, Cli, Command, Engine, EntityKind, LocalStorage, ReportConfig, ReportPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting estate-reports CLI");

    let config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    }
    .merged_with(&cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let storage = LocalStorage::new(config.output_path().to_string());

    let result = match &cli.command {
        Command::Report { kind, id } => {
            let kind: EntityKind = match kind.parse() {
                Ok(kind) => kind,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(2);
                }
            };
            let chains = config.fields.clone();
            let pipeline =
                ReportPipeline::with_chains(storage, config, kind, id.clone(), chains);
            Engine::new(pipeline).run().await
        }
        Command::Chart => {
            let chains = config.fields.clone();
            let pipeline = ChartPipeline::with_chains(storage, config, chains);
            Engine::new(pipeline).run().await
        }
    };

    match result {
        Ok(output_path) => {
            tracing::info!("✅ Pipeline completed successfully");
            println!("✅ Pipeline completed successfully");
            println!("📁 Output: {}", output_path);
        }
        Err(e) => {
            tracing::error!("❌ Pipeline failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
