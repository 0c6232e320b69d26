mod logging;
mod render;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docqa_core::{Config, ModelRegistry, Pipeline};
use session::SessionState;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a document using a local LLM", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Generation model commands")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    #[command(about = "List known embedding models")]
    Models,

    #[command(about = "Index a document")]
    Ingest {
        #[arg(help = "Path to a text or PDF document")]
        document: PathBuf,
    },

    #[command(about = "Index a document and ask questions about it")]
    Ask {
        #[arg(help = "Path to a text or PDF document")]
        document: PathBuf,

        #[arg(help = "Question to ask; starts an interactive session when omitted")]
        question: Option<String>,

        #[arg(short, long, help = "Number of passages to retrieve")]
        k: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    #[command(about = "Show current model")]
    Show,

    #[command(about = "Set the LLM model")]
    Set {
        #[arg(help = "Model name (e.g., 'llama3' or 'mistral:7b')")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show => show_config(&cli.config),
        Commands::Model { command } => match command {
            ModelCommands::Show => show_model(&cli.config),
            ModelCommands::Set { model } => set_model(&cli.config, &model),
        },
        Commands::Models => list_embedding_models(&cli.config),
        Commands::Ingest { document } => {
            let config = load_config(&cli.config)?;
            let _guard = logging::init(&config.logging)?;
            let mut pipeline = Pipeline::new(config).context("Failed to create pipeline")?;
            ingest(&mut pipeline, &document).await?;
            pipeline.close();
            Ok(())
        }
        Commands::Ask { document, question, k } => {
            let config = load_config(&cli.config)?;
            let _guard = logging::init(&config.logging)?;
            let k = k.unwrap_or(config.rag.top_k);
            let mut pipeline = Pipeline::new(config).context("Failed to create pipeline")?;
            ingest(&mut pipeline, &document).await?;

            match question {
                Some(question) => {
                    let answer = pipeline.ask_with_k(&question, k).await?;
                    render::print_answer(&answer);
                }
                None => interactive(&pipeline, k).await?,
            }

            pipeline.close();
            Ok(())
        }
    }
}

/// Loads the config file, falling back to defaults when it does not exist.
fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }
    Config::load(config_path).context("Failed to load config")
}

async fn ingest(pipeline: &mut Pipeline, document: &Path) -> Result<()> {
    println!("{} Processing {}...", "→".blue(), document.display());

    let result = pipeline
        .ingest(document)
        .await
        .with_context(|| format!("Failed to process {}", document.display()))?;

    println!(
        "{} Indexed {} passages into {}",
        "✓".green().bold(),
        result.passage_count,
        result.index_path.display()
    );
    Ok(())
}

async fn interactive(pipeline: &Pipeline, k: usize) -> Result<()> {
    let mut session = SessionState::new();
    let stdin = io::stdin();

    println!(
        "Ask a question, {} to list previous answers, {} to leave.",
        "history".bold(),
        "exit".bold()
    );

    loop {
        print!("{} ", "?".cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        match question {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                render::print_history(&session);
                continue;
            }
            _ => {}
        }

        println!("{} Generating answer...", "→".blue());
        match pipeline.ask_with_k(question, k).await {
            Ok(answer) => {
                render::print_answer(&answer);
                session.record(question, answer);
            }
            Err(e) => {
                tracing::error!(error = %e, "Answering failed");
                eprintln!("{} {}", "✗ Error generating answer:".red().bold(), e);
            }
        }
    }

    Ok(())
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "LLM:".bold());
    println!("  Model:           {}", config.llm.model.cyan());
    println!("  Base URL:        {}", config.llm.base_url);
    println!("  Temperature:     {}", config.llm.temperature);
    println!("  Timeout (s):     {}", config.llm.timeout_secs);
    println!();
    println!("{}", "RAG:".bold());
    println!("  Embedding Model: {}", config.rag.embedding_model.cyan());
    println!("  Chunk Size:      {}", config.rag.chunk_size);
    println!("  Chunk Overlap:   {}", config.rag.chunk_overlap);
    println!("  Top K:           {}", config.rag.top_k);
    println!("  Batch Size:      {}", config.rag.batch_size);
    println!("  Metric:          {:?}", config.rag.metric);
    println!();
    println!("{}", "Storage:".bold());
    println!("  Index Path:      {}", config.storage.index_path);
    println!();
    println!("{}", "Logging:".bold());
    println!("  Level:           {}", config.logging.level);
    println!(
        "  File:            {}",
        config.logging.file.as_deref().unwrap_or("(stderr)")
    );

    Ok(())
}

fn show_model(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}: {}", "Current model".bold(), config.llm.model.cyan());
    Ok(())
}

fn set_model(config_path: &Path, model: &str) -> Result<()> {
    let content = std::fs::read_to_string(config_path)
        .context("Failed to read config file")?;

    let updated_content = with_llm_model(&content, model)?;

    std::fs::write(config_path, updated_content)
        .context("Failed to write config file")?;

    println!(
        "{} Model updated to: {}",
        "✓".green().bold(),
        model.cyan()
    );

    Ok(())
}

/// Rewrites `llm.model` in a YAML document, leaving every other key alone.
fn with_llm_model(content: &str, model: &str) -> Result<String> {
    let mut config: serde_yaml::Value = serde_yaml::from_str(content)
        .context("Failed to parse config")?;

    let root = config
        .as_mapping_mut()
        .context("Config file is not a YAML mapping")?;
    let llm = root
        .entry(serde_yaml::Value::String("llm".to_string()))
        .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));

    let llm_map = llm
        .as_mapping_mut()
        .context("'llm' section is not a YAML mapping")?;
    llm_map.insert(
        serde_yaml::Value::String("model".to_string()),
        serde_yaml::Value::String(model.to_string()),
    );

    serde_yaml::to_string(&config).context("Failed to serialize config")
}

fn list_embedding_models(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = ModelRegistry::new();
    let configured = registry.get(&config.rag.embedding_model);

    println!("{}", "Known embedding models:".bold().green());
    println!();

    for model in registry.all_models() {
        let marker = if configured.is_some_and(|m| m.id == model.id) {
            "*".green().bold()
        } else {
            "•".cyan()
        };
        println!(
            "  {} {} ({} dims) {}",
            marker,
            model.id.bold(),
            model.embedding_dim,
            model.description
        );
    }

    if configured.is_none() {
        println!();
        println!(
            "{} '{}' is not in the registry; its dimension is taken from the first embedding.",
            "!".yellow(),
            config.rag.embedding_model
        );
    }

    Ok(())
}
