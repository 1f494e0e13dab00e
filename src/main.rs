use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cyphersynth::answer_synthesis::AnswerSynthesizer;
use cyphersynth::config::{ConfigOverrides, DatasetConfig};
use cyphersynth::generation::PromptMode;
use cyphersynth::graph_catalog::SchemaCatalog;
use cyphersynth::graph_db::Neo4jConnector;
use cyphersynth::llm::{HttpLanguageModel, LanguageModel, LlmConfig};
use cyphersynth::pipeline::{write_dataset, BatchOrchestrator, DatasetRunner, DatasetSummary};

/// CypherSynth - text-to-Cypher evaluation dataset generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML file with settings (overridden by flags)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Neo4j Bolt URI
    #[arg(long)]
    neo4j_uri: Option<String>,

    /// Database to generate for (repeatable)
    #[arg(long = "database")]
    databases: Vec<String>,

    /// Generate-and-verify rounds per database
    #[arg(long)]
    iterations: Option<usize>,

    /// Prompt mode: multi-hop or simple
    #[arg(long)]
    mode: Option<PromptMode>,

    /// Maximum answer requests in flight
    #[arg(long)]
    max_concurrent_answers: Option<usize>,

    /// Skip answer synthesis
    #[arg(long)]
    no_answers: bool,

    /// Output file (defaults to a timestamped name)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        ConfigOverrides {
            neo4j_uri: cli.neo4j_uri,
            databases: (!cli.databases.is_empty()).then_some(cli.databases),
            iterations: cli.iterations,
            prompt_mode: cli.mode,
            max_concurrent_answers: cli.max_concurrent_answers,
            synthesize_answers: cli.no_answers.then_some(false),
            output: cli.output,
            ..Default::default()
        }
    }
}

fn load_config(mut cli: Cli) -> anyhow::Result<DatasetConfig> {
    let file_overrides = match cli.config.take() {
        Some(path) => Some(
            ConfigOverrides::from_yaml_file(&path)
                .with_context(|| format!("loading {}", path.display()))?,
        ),
        None => None,
    };
    Ok(DatasetConfig::load(file_overrides, cli.into())?)
}

fn default_output_path() -> PathBuf {
    PathBuf::from(
        chrono::Local::now()
            .format("text2cypher_dataset_%Y%m%d_%H%M%S.json")
            .to_string(),
    )
}

async fn run(config: DatasetConfig) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let llm_config = LlmConfig::from_env()?;
    let answer_config = match std::env::var("CYPHERSYNTH_ANSWER_LLM_MODEL") {
        Ok(model) => llm_config.clone().with_model(model),
        Err(_) => llm_config.clone(),
    };
    let generator: Arc<dyn LanguageModel> = Arc::new(HttpLanguageModel::new(http.clone(), llm_config));

    log::info!(
        "Generating with {} over {} database(s), {} iteration(s) each",
        generator.model_id(),
        config.databases.len(),
        config.iterations
    );

    let catalog = Arc::new(SchemaCatalog::new());
    let orchestrator = BatchOrchestrator::new(generator, catalog.clone(), config.batch_settings());
    let synthesizer = config.synthesize_answers.then(|| {
        AnswerSynthesizer::new(
            Arc::new(HttpLanguageModel::new(http, answer_config)),
            config.max_concurrent_answers,
            config.answer_max_tokens,
        )
    });
    let connector = Arc::new(Neo4jConnector::new(config.neo4j_settings()));
    let runner = DatasetRunner::new(connector, catalog, orchestrator, synthesizer);

    let run = runner.run(&config.databases).await;

    let output = config.output.clone().unwrap_or_else(default_output_path);
    write_dataset(&output, &run.records)?;
    log::info!("\n{}", DatasetSummary::from_records(&run.records));

    if !run.is_complete() {
        for failure in &run.failures {
            log::error!("{}: {}", failure.database, failure.error);
        }
        anyhow::bail!(
            "{} of {} database(s) failed",
            run.failures.len(),
            config.databases.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    // Defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    println!("\nCypherSynth v{}\n", env!("CARGO_PKG_VERSION"));

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
