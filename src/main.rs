use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use medirag_lib::{
    application::{AskResponse, DomainListResponse},
    build_environment,
    domain::QueryResult,
    infrastructure::build_dense_index,
    AppHandles,
};

/// Ask medical questions answered from domain knowledge bases.
#[derive(Parser, Debug)]
#[command(name = "medirag", version, about)]
struct Cli {
    /// Without a subcommand, questions are read interactively from stdin.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question and exit.
    Ask {
        question: String,
        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the catalog domains and whether their indexes are loaded.
    Domains,
    /// Embed domain document collections and write their dense indexes.
    Index {
        /// Only index this domain.
        #[arg(long)]
        domain: Option<String>,
    },
}

fn main() {
    medirag_lib::init_tracing();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("[medirag] {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let handles = build_environment().context("failed to bootstrap medirag environment")?;
    match cli.command {
        Some(Command::Ask { question, json }) => ask(&handles, &question, json),
        Some(Command::Domains) => list_domains(&handles),
        Some(Command::Index { domain }) => index(&handles, domain.as_deref()),
        None => interactive(&handles),
    }
}

fn ask(handles: &AppHandles, question: &str, json: bool) -> Result<()> {
    let result = handles.orchestrator.run_query(question);
    if json {
        let payload = serde_json::to_string_pretty(&AskResponse::from(result))?;
        println!("{payload}");
    } else {
        print_result(&result);
    }
    Ok(())
}

fn list_domains(handles: &AppHandles) -> Result<()> {
    let listing = DomainListResponse::from(handles.catalog.as_ref());
    for info in &listing.domains {
        let status = if handles.store.contains(&info.name) {
            "loaded"
        } else if info.has_index {
            "index present, not loaded"
        } else {
            "no index"
        };
        println!("{:<28} {:<32} {status}", info.name, info.dataset);
    }
    println!("{} domains", listing.total);
    Ok(())
}

fn index(handles: &AppHandles, only: Option<&str>) -> Result<()> {
    let configs = match only {
        Some(name) => vec![handles.catalog.get(name)?],
        None => handles.catalog.configs().iter().collect(),
    };
    for config in configs {
        if !config.docs_path.exists() {
            println!("{}: skipped, {} not found", config.name, config.docs_path.display());
            continue;
        }
        let rows = build_dense_index(config, handles.embedder.as_ref())
            .with_context(|| format!("failed to index {}", config.name))?;
        println!("{}: {rows} rows written to {}", config.name, config.index_path.display());
    }
    Ok(())
}

fn interactive(handles: &AppHandles) -> Result<()> {
    println!("Medical assistant ready. Type 'exit' or 'quit' to stop.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nQuestion: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let question = line?;
        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        print_result(&handles.orchestrator.run_query(question));
    }
    Ok(())
}

fn print_result(result: &QueryResult) {
    println!("\n{}", result.answer);
    println!(
        "\nDomains: {} | Confidence: {:.2} | Time: {:.2}s",
        result.domains.join(", "),
        result.confidence,
        result.processing_time
    );
    for (rank, source) in result.sources.iter().enumerate() {
        println!(
            "  [{}] {} ({:.2}): {}",
            rank + 1,
            source.domain,
            source.score,
            source.chunk
        );
    }
}
