//! intentgraph CLI: apply patches and reconcile motifs over JSON snapshots.
//!
//! Usage:
//!   intentgraph apply --graph g.json --patch p.json [--allow-delete] [--out g2.json]
//!   intentgraph reconcile --graph g.json [--concepts c.json] [--motifs m.json] [--out r.json]
//!   intentgraph summary --graph g.json [--concepts c.json] [--motifs m.json]
//!   intentgraph resolve --motifs m.json --id m_.. --status active --actor alice [--out m2.json]

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};

use intentgraph::ir::{load_json, save_json_pretty, to_json_pretty};
use intentgraph::{
    Concept, EngineConfig, GraphPatch, IntentEngine, IntentGraph, IntentResult, Motif, MotifId, MotifStatus,
};

#[derive(Parser)]
#[command(
    name = "intentgraph",
    version,
    about = "Intent graph consistency engine with motif mining"
)]
struct Cli {
    /// Engine configuration file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a patch to a graph snapshot
    Apply {
        /// Graph snapshot to patch
        #[arg(long)]
        graph: PathBuf,
        /// Patch to apply
        #[arg(long)]
        patch: PathBuf,
        /// Permit remove_node / remove_edge ops
        #[arg(long)]
        allow_delete: bool,
        /// Write the patched graph here instead of printing the full outcome
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Derive concepts and motifs, reconciling with prior state
    Reconcile {
        /// Graph snapshot
        #[arg(long)]
        graph: PathBuf,
        /// Prior concepts
        #[arg(long)]
        concepts: Option<PathBuf>,
        /// Prior motifs
        #[arg(long)]
        motifs: Option<PathBuf>,
        /// Write the reconciliation here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the structured intent summary
    Summary {
        /// Graph snapshot
        #[arg(long)]
        graph: PathBuf,
        /// Prior concepts
        #[arg(long)]
        concepts: Option<PathBuf>,
        /// Prior motifs
        #[arg(long)]
        motifs: Option<PathBuf>,
    },
    /// Record a user resolution on a motif
    Resolve {
        /// Motif set to update
        #[arg(long)]
        motifs: PathBuf,
        /// Motif id
        #[arg(long)]
        id: String,
        /// Target status: active, disabled or cancelled
        #[arg(long)]
        status: String,
        /// Who resolved it
        #[arg(long)]
        actor: String,
        /// Write the updated motifs here instead of overwriting the input
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>, allow_delete: bool) -> IntentResult<EngineConfig> {
    let mut config = match path {
        Some(path) => load_json::<EngineConfig>(path)?,
        None => EngineConfig::default(),
    };
    if allow_delete {
        config.allow_delete = true;
    }
    Ok(config)
}

fn load_or_default<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> IntentResult<T> {
    match path {
        Some(path) => Ok(load_json(path)?),
        None => Ok(T::default()),
    }
}

fn emit<T: serde::Serialize>(value: &T, out: Option<&Path>) -> IntentResult<()> {
    match out {
        Some(path) => {
            save_json_pretty(path, value)?;
            tracing::info!(path = %path.display(), "written");
        }
        None => println!("{}", to_json_pretty(value)?),
    }
    Ok(())
}

fn cmd_apply(config: EngineConfig, graph: &Path, patch: &Path, out: Option<&Path>) -> IntentResult<()> {
    let engine = IntentEngine::new(config)?;
    let graph: IntentGraph = load_json(graph)?;
    let patch: GraphPatch = load_json(patch)?;
    let outcome = engine.apply_patch(&graph, &patch);
    tracing::info!(
        applied = outcome.applied.len(),
        version = outcome.graph.version(),
        "patch applied"
    );
    match out {
        Some(path) => {
            save_json_pretty(path, &outcome.graph)?;
            println!("{}", to_json_pretty(&outcome.applied)?);
            Ok(())
        }
        None => emit(&outcome, None),
    }
}

fn reconcile(
    config: EngineConfig,
    graph: &Path,
    concepts: Option<&Path>,
    motifs: Option<&Path>,
) -> IntentResult<intentgraph::Reconciliation> {
    let engine = IntentEngine::new(config)?;
    let graph: IntentGraph = load_json(graph)?;
    let prior_concepts: Vec<Concept> = load_or_default(concepts)?;
    let prior_motifs: Vec<Motif> = load_or_default(motifs)?;
    Ok(engine.reconcile(&graph, &prior_concepts, &prior_motifs, Utc::now()))
}

fn cmd_resolve(
    config: EngineConfig,
    motifs_path: &Path,
    id: &str,
    status: &str,
    actor: &str,
    out: Option<&Path>,
) -> IntentResult<()> {
    let engine = IntentEngine::new(config)?;
    let status = MotifStatus::parse(status)?;
    let mut motifs: Vec<Motif> = load_json(motifs_path)?;
    engine.resolve_motif(&mut motifs, &MotifId::new(id), status, actor, Utc::now())?;
    save_json_pretty(out.unwrap_or(motifs_path), &motifs)?;
    Ok(())
}

fn run(cli: Cli) -> IntentResult<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Apply {
            graph,
            patch,
            allow_delete,
            out,
        } => cmd_apply(load_config(config_path, allow_delete)?, &graph, &patch, out.as_deref()),
        Commands::Reconcile {
            graph,
            concepts,
            motifs,
            out,
        } => {
            let rec = reconcile(
                load_config(config_path, false)?,
                &graph,
                concepts.as_deref(),
                motifs.as_deref(),
            )?;
            emit(&rec, out.as_deref())
        }
        Commands::Summary {
            graph,
            concepts,
            motifs,
        } => {
            let rec = reconcile(
                load_config(config_path, false)?,
                &graph,
                concepts.as_deref(),
                motifs.as_deref(),
            )?;
            emit(&rec.summary(), None)
        }
        Commands::Resolve {
            motifs,
            id,
            status,
            actor,
            out,
        } => cmd_resolve(
            load_config(config_path, false)?,
            &motifs,
            &id,
            &status,
            &actor,
            out.as_deref(),
        ),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

