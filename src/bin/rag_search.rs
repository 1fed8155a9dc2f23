//! rag-search: query a JSON corpus with the retrieval pipeline
//!
//! Usage:
//!   rag-search search <query> [--top-k N] [--rerank]    Vector search
//!   rag-search hybrid <query> [--top-k N] [--weight W]  Hybrid BM25 + vector search
//!   rag-search sources                                  List document sources
//!   rag-search stats                                    Index counts and service stats

use anyhow::{bail, Context};
use rag_retrieval::config::RetrievalConfig;
use rag_retrieval::embeddings::HashingEmbedder;
use rag_retrieval::service::RetrievalService;
use rag_retrieval::store::{Document, MemoryDocumentStore, MemoryVectorIndex};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIMENSIONS: usize = 256;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "search" => cmd_search(&args[2..]).await,
        "hybrid" => cmd_hybrid(&args[2..]).await,
        "sources" => cmd_sources(&args[2..]).await,
        "stats" => cmd_stats(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("rag-search {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"rag-search: hybrid retrieval over a JSON corpus

USAGE:
    rag-search <COMMAND> [OPTIONS]

COMMANDS:
    search <query>      Vector similarity search
    hybrid <query>      Weighted BM25 + vector search
    sources             List document sources
    stats               Show index counts and service statistics
    version             Show version information
    help                Show this help message

OPTIONS:
    --corpus <path>     JSON array of documents (or RAG_CORPUS)
    --config <path>     YAML/JSON retrieval configuration (or RAG_CONFIG)
    --top-k <n>         Number of results (default 5)
    --weight <w>        Vector weight in [0, 1] for hybrid search
    --rerank            Rerank vector search results
    --dims <n>          Hashing embedder dimensions (default 256)

ENVIRONMENT:
    RUST_LOG            Log filter (default warn)
    RAG_*               Configuration overrides"#
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip = false;
    for a in args {
        if skip {
            skip = false;
            continue;
        }
        if a == "--rerank" {
            continue;
        }
        if a.starts_with("--") {
            skip = true;
            continue;
        }
        return Some(a);
    }
    None
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match flag_value(args, name) {
        Some(v) => v.parse().with_context(|| format!("invalid value for {name}: {v}")),
        None => Ok(default),
    }
}

fn resolve_path(args: &[String], flag: &str, env: &str) -> Option<PathBuf> {
    flag_value(args, flag)
        .map(PathBuf::from)
        .or_else(|| std::env::var(env).ok().map(PathBuf::from))
}

async fn load_service(args: &[String]) -> anyhow::Result<RetrievalService> {
    let corpus_path = resolve_path(args, "--corpus", "RAG_CORPUS")
        .context("no corpus given; use --corpus or set RAG_CORPUS")?;
    let raw = std::fs::read_to_string(&corpus_path)
        .with_context(|| format!("reading {}", corpus_path.display()))?;
    let docs: Vec<Document> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", corpus_path.display()))?;

    let config = match resolve_path(args, "--config", "RAG_CONFIG") {
        Some(p) => RetrievalConfig::from_path(&p)
            .with_context(|| format!("loading config {}", p.display()))?,
        None => {
            let cfg = RetrievalConfig::default().apply_env_overrides();
            cfg.validate()?;
            cfg
        }
    };

    let dims: usize = parse_flag(args, "--dims", DEFAULT_DIMENSIONS)?;
    let embedder = HashingEmbedder::new(dims);
    let vectors = MemoryVectorIndex::new(dims);
    for doc in &docs {
        vectors.insert(doc.id, embedder.embed_sync(&doc.content))?;
    }

    let service = RetrievalService::builder()
        .config(config)
        .embedding_model(Arc::new(embedder))
        .vector_index(Arc::new(vectors))
        .document_store(Arc::new(MemoryDocumentStore::with_documents(docs)))
        .build()
        .await?;
    Ok(service)
}

async fn cmd_search(args: &[String]) -> anyhow::Result<()> {
    let Some(query) = positional(args) else {
        bail!("search requires a query");
    };
    let top_k: usize = parse_flag(args, "--top-k", 5)?;
    let service = load_service(args).await?;
    let resp = service
        .search_documents(query, top_k, has_flag(args, "--rerank"))
        .await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

async fn cmd_hybrid(args: &[String]) -> anyhow::Result<()> {
    let Some(query) = positional(args) else {
        bail!("hybrid requires a query");
    };
    let top_k: usize = parse_flag(args, "--top-k", 5)?;
    let weight = match flag_value(args, "--weight") {
        Some(w) => Some(
            w.parse::<f32>()
                .with_context(|| format!("invalid value for --weight: {w}"))?,
        ),
        None => None,
    };
    let service = load_service(args).await?;
    let resp = service.search_hybrid(query, top_k, weight).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

async fn cmd_sources(args: &[String]) -> anyhow::Result<()> {
    let service = load_service(args).await?;
    for s in service.list_sources().await? {
        println!("{:>6}  {:<8} {:>8}  {}", s.id, s.doc_type, s.length, s.source);
    }
    Ok(())
}

async fn cmd_stats(args: &[String]) -> anyhow::Result<()> {
    let service = load_service(args).await?;
    let counts = service.count_documents().await?;
    let report = serde_json::json!({
        "index": counts,
        "service": service.get_stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
