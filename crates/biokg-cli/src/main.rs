//! biokg CLI - Command-line interface
//!
//! Usage:
//!   biokg build <chunks.json> [--skip-refine]
//!   biokg schema
//!   biokg extract <text>

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use biokg_core::AppConfig;
use biokg_extractor::{extraction_prompt, parse_triples, TripleValidator};
use biokg_graph::SurrealSink;
use biokg_pipeline::{create_proposer, KgBuilder};

#[derive(Parser)]
#[command(name = "biokg")]
#[command(about = "Biomedical knowledge graph builder")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file; falls back to environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge graph from a JSON array of text chunks
    Build {
        /// Path to the chunks file
        chunks: PathBuf,

        /// Persist the rule-validated set without adversarial refinement
        #[arg(long)]
        skip_refine: bool,
    },
    /// Initialize the graph database schema
    Schema,
    /// Extract triples from one text span without persisting them
    Extract {
        /// Text to extract from
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Build {
            chunks,
            skip_refine,
        } => {
            let raw = std::fs::read_to_string(&chunks)?;
            let chunks: Vec<String> = serde_json::from_str(&raw)?;

            let mut refine_config = config.refine.clone();
            if skip_refine {
                refine_config.train_gan = false;
            }

            let proposer = create_proposer(&config.llm)?;
            let sink = Arc::new(SurrealSink::new(&config.database).await?);
            let builder = KgBuilder::new(proposer, sink, refine_config);

            let summary = builder.build(&chunks).await?;

            println!(
                "run {}: {} chunks, {} candidates, {} persisted",
                summary.run_id,
                summary.chunk_count,
                summary.candidate_count,
                summary.persisted_count
            );
            if let Some(report) = &summary.refinement {
                println!("{}", report.summary());
            }
        }
        Commands::Schema => {
            let sink = SurrealSink::new(&config.database).await?;
            sink.init_schema().await?;
            println!("schema initialized");
        }
        Commands::Extract { text } => {
            let proposer = create_proposer(&config.llm)?;
            let reply = proposer.propose(&extraction_prompt(&text)).await?;

            let validator = TripleValidator::new();
            for raw in parse_triples(&reply) {
                if validator.validate(&raw.subject, &raw.predicate, &raw.object) {
                    println!("{}", raw.trimmed());
                }
            }
        }
    }

    Ok(())
}
