//! CLI entrypoint for Prudence Ensemble
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use ensemble_application::{
    BackendAdapter, ConversationLogger, EnsembleSession, RunTurnError, TranscriptStore,
    TurnProgressNotifier,
};
use ensemble_domain::{
    ModelRegistry, OutputFormat, ProviderKind, SessionContext, SessionKey, TurnId,
};
use ensemble_infrastructure::{
    CerebrasAdapter, ConfigLoader, FileConfig, GeminiAdapter, InMemoryTranscriptStore,
    JsonFileTranscriptStore, JsonlConversationLogger, PolicyRoutedStore, RoutingBackend,
};
use ensemble_presentation::{Cli, ConsoleFormatter, ProgressReporter, TurnFormatter};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Session id used for the process-local (anonymous) transcript
const DEVICE_SESSION: &str = "local";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    info!("Starting Prudence Ensemble");

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("{}", e))?
    };

    let registry = Arc::new(ModelRegistry::builtin());

    let errors = config.validate(&registry);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("config error: {}", e);
        }
        bail!("invalid configuration ({} problem(s))", errors.len());
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    if cli.list_models {
        print!("{}", ConsoleFormatter::format_models(&registry));
        return Ok(());
    }

    // === Dependency Injection ===
    let backend = build_backend(&config, registry.clone());
    let store = build_store(&config);

    let key = match &cli.user {
        Some(user) => SessionKey::identity(user.trim()),
        None => SessionKey::device(DEVICE_SESSION),
    };
    info!("Session {}", key);

    let mut session = EnsembleSession::new(
        SessionContext::new(key),
        backend,
        store,
        registry.clone(),
    )
    .with_config(config.to_ensemble_config());

    if let Some(selection) = config.ensemble.parse_selection() {
        session.set_selection(selection)?;
    }
    if !cli.model.is_empty() {
        session.set_selection(cli.model.iter().map(|m| m.trim().into()).collect())?;
    }
    for (model, &value) in &config.ensemble.temperatures {
        session.set_temperature(model, value)?;
    }
    for t in &cli.temperature {
        session.set_temperature(&t.model, t.value)?;
    }
    if let Some(model) = &cli.synthesis_model {
        match registry.describe(model.trim()) {
            Some(d) if d.is_synthesis() => {}
            Some(_) => bail!("'{}' is not a synthesis model", model),
            None => bail!("unknown model '{}'", model),
        }
        let mut ensemble = session.config().clone();
        ensemble.fusion = ensemble.fusion.with_synthesis_model(model.trim());
        session = session.with_config(ensemble);
    }

    if let Some(dir) = &cli.log_dir
        && let Some(logger) = JsonlConversationLogger::in_dir(dir)
    {
        info!("Conversation log: {}", logger.path().display());
        session = session.with_logger(Arc::new(logger) as Arc<dyn ConversationLogger>);
    }

    // === Transcript commands ===
    if cli.history {
        let turns = session.turn_history().await?;
        print!("{}", ConsoleFormatter::format_history(&turns));
        return Ok(());
    }

    if let Some(id) = &cli.delete {
        let turn_id: TurnId = id
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a turn id", id))?;
        if session.delete_turn(&turn_id).await? {
            println!("Deleted turn {}", turn_id);
        } else {
            println!("No turn {} in this transcript", turn_id);
        }
        return Ok(());
    }

    // === Ask ===
    let message = match cli.message {
        Some(m) => m,
        None => bail!("A message is required. Use --history or --list-models to browse instead."),
    };

    if !cli.quiet && config.output.show_progress {
        session = session.with_progress(Arc::new(ProgressReporter::new()) as Arc<dyn TurnProgressNotifier>);
    }

    let format: OutputFormat = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();

    match session.ask(&message).await {
        Ok(turn) => {
            println!("{}", ConsoleFormatter.render(&turn, format));
            Ok(())
        }
        Err(e @ RunTurnError::PersistenceFailed { .. }) => {
            if let Some(turn) = e.unpersisted_turn() {
                println!("{}", ConsoleFormatter.render(turn, format));
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Stderr logging filtered by verbosity, plus a trace file under `log_dir`
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "prudence-ensemble.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// One adapter per provider that has an API key
fn build_backend(config: &FileConfig, registry: Arc<ModelRegistry>) -> Arc<dyn BackendAdapter> {
    let providers = config.providers.to_provider_config();
    let mut backend = RoutingBackend::new(registry);

    match CerebrasAdapter::from_config(&providers.cerebras) {
        Ok(adapter) => backend = backend.with_adapter(ProviderKind::Cerebras, Arc::new(adapter)),
        Err(e) => warn!("Cerebras models unavailable: {}", e),
    }
    match GeminiAdapter::from_config(&providers.gemini) {
        Ok(adapter) => backend = backend.with_adapter(ProviderKind::Gemini, Arc::new(adapter)),
        Err(e) => warn!("Gemini models unavailable: {}", e),
    }

    info!("Configured providers: {:?}", backend.providers());
    Arc::new(backend)
}

/// Identity sessions go to disk, device sessions stay in memory
fn build_store(config: &FileConfig) -> Arc<dyn TranscriptStore> {
    let capacity = config.transcript.capacity;
    let dir = config.transcript.data_dir();
    info!("Durable transcripts: {}", dir.display());

    Arc::new(PolicyRoutedStore::new(
        Arc::new(JsonFileTranscriptStore::with_capacity(dir, capacity)),
        Arc::new(InMemoryTranscriptStore::with_capacity(capacity)),
    ))
}
