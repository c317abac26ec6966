//! CLI command implementations
//!
//! Boot order for `serve`:
//! 1. Configuration load (file, environment, flags)
//! 2. Logging
//! 3. Schema load; any failure aborts before the listener binds
//! 4. Engine and API activation

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::engine::EntityEngine;
use crate::observability::init_logging;
use crate::rest_api::{build_app, RestServer};
use crate::schema::{SchemaLoader, SchemaRegistry};
use crate::storage::{InMemoryStore, RecordStore};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            schemas,
            port,
        } => serve(load_config(config, schemas, port)?),
        Command::Schemas { config, schemas } => {
            let config = load_config(config, schemas, None)?;
            let summary = self::schemas(&config)?;
            let rendered = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::boot_failed(e.to_string()))?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

fn load_config(
    path: Option<PathBuf>,
    schemas: Option<PathBuf>,
    port: Option<u16>,
) -> CliResult<AppConfig> {
    let mut config = AppConfig::load(path.as_deref())?;
    if let Some(schemas) = schemas {
        config.schema_dir = schemas;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create runtime: {}", e)))
}

/// Loads the registry, then serves the REST API until the listener fails.
pub fn serve(config: AppConfig) -> CliResult<()> {
    init_logging(config.log_format).map_err(CliError::boot_failed)?;

    runtime()?.block_on(async move {
        let loader = SchemaLoader::new(config.loader_config());
        let registry = loader.load().await?;

        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
        let engine = Arc::new(
            EntityEngine::new(registry, store).with_default_collection(&config.collection),
        );

        let server = RestServer::new(engine, config.serializer(), Arc::new(config.access_policy()))
            .with_limits(config.limits());
        let app = build_app(server.router(), &config.cors_origins);
        let addr = config.listen_addr()?;

        tracing::info!(
            event = "BOOT_COMPLETE",
            schema_dir = %config.schema_dir.display(),
            addr = %addr,
            "Schema registry loaded, starting HTTP API"
        );
        crate::rest_api::serve(app, addr).await?;
        Ok::<(), CliError>(())
    })
}

/// Loads the registry and describes every registered type.
pub fn schemas(config: &AppConfig) -> CliResult<Value> {
    let registry = runtime()?.block_on(SchemaLoader::new(config.loader_config()).load())?;
    Ok(describe(&registry))
}

fn describe(registry: &SchemaRegistry) -> Value {
    let types: Vec<Value> = registry
        .type_names()
        .into_iter()
        .filter_map(|name| registry.get(name))
        .map(|definition| {
            json!({
                "type": definition.type_name(),
                "source": definition.source().display().to_string(),
                "collection": definition.storage_collection(),
                "replaced_references": definition.replaced_reference_paths(),
            })
        })
        .collect();

    json!({ "schemas": types })
}
