//! CLI command implementations
//!
//! Each command loads the configuration, applies its log level, opens the
//! file store when it needs one and closes it before returning.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{json, Value};

use crate::config::FormConfig;
use crate::observability::Logger;
use crate::renderer::{RendererController, SubmitOutcome};
use crate::schema::{can_save, EntityId, Field, FormId, IdGenerator, StructuralValidator};
use crate::storage::{FileFormStore, FormStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a command on a fresh single-threaded runtime. Log lines go to
/// stderr so stdout carries only the response.
pub fn run_command(cmd: Command) -> CliResult<()> {
    Logger::set_stderr_only(true);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime_error(e.to_string()))?;

    runtime.block_on(async move {
        match cmd {
            Command::Init { config } => init(&config).await,
            Command::Forms { config } => forms(&config).await,
            Command::Check => check(),
            Command::Save { config } => save(&config).await,
            Command::Submit { config } => submit(&config).await,
        }
    })
}

/// Create the store file if it does not exist yet
pub async fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = FileFormStore::open(config.store_path()).await?;
    let forms = store.get_all_forms().await?;
    store.close().await?;

    write_response(json!({
        "store_path": config.store_path,
        "forms": forms.len(),
    }))
}

/// Print every stored form
pub async fn forms(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = FileFormStore::open(config.store_path()).await?;
    let forms = store.get_all_forms().await?;
    store.close().await?;

    write_response(json!({ "forms": serde_json::to_value(&forms)? }))
}

/// Structurally validate a field list without touching the store
pub fn check() -> CliResult<()> {
    let fields = read_fields()?;
    let validated = StructuralValidator::new().validate(&fields);

    write_response(json!({
        "saveable": can_save(&validated),
        "fields": serde_json::to_value(&validated)?,
    }))
}

/// Validate a field list read from stdin and store it as the form
pub async fn save(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let fields = read_fields()?;
    write_response(save_fields(&config, fields).await?)
}

/// Validate values read from stdin against the stored form
pub async fn submit(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let values = read_values()?;
    write_response(submit_values(&config, values).await?)
}

/// The store holds one form: a save replaces the stored form's fields and
/// keeps its id. A fresh id is drawn only when the store is empty.
async fn save_fields(config: &FormConfig, fields: Vec<Field>) -> CliResult<Value> {
    let validated = StructuralValidator::new().validate(&fields);

    if !can_save(&validated) {
        Logger::warn(
            "FORM_SAVE_BLOCKED",
            &[("fields", validated.len().to_string().as_str())],
        );
        return Ok(json!({
            "saved": false,
            "fields": serde_json::to_value(&validated)?,
        }));
    }

    let clean: Vec<Field> = validated.iter().map(Field::without_errors).collect();
    let store = FileFormStore::open(config.store_path()).await?;
    let written = replace_stored_form(&store, &clean).await;
    store.close().await?;
    let form_id = written?;

    Logger::info(
        "FORM_SAVED",
        &[
            ("fields", clean.len().to_string().as_str()),
            ("form_id", form_id.to_string().as_str()),
        ],
    );

    Ok(json!({
        "saved": true,
        "formId": form_id,
        "fields": serde_json::to_value(&clean)?,
    }))
}

async fn replace_stored_form(store: &FileFormStore, fields: &[Field]) -> CliResult<FormId> {
    let existing = store.get_all_forms().await?;

    let form_id = match existing.first() {
        Some(record) => record.form_id,
        None => {
            let mut ids = IdGenerator::new();
            ids.reserve_fields(fields);
            ids.next_id()
        }
    };

    store.create_or_replace_form(form_id, fields).await?;
    Ok(form_id)
}

async fn submit_values(
    config: &FormConfig,
    values: BTreeMap<EntityId, Value>,
) -> CliResult<Value> {
    let store = FileFormStore::open(config.store_path()).await?;
    let loaded = RendererController::load(&store).await;
    store.close().await?;
    let mut renderer = loaded?;

    if renderer.form_id().is_none() {
        return Err(CliError::invalid_input("No stored form to submit against"));
    }

    for (field_id, value) in values {
        renderer.set_value(field_id, value)?;
    }

    Ok(match renderer.submit() {
        SubmitOutcome::Accepted(values) => json!({
            "accepted": true,
            "values": serde_json::to_value(&values)?,
        }),
        SubmitOutcome::Rejected(errors) => json!({
            "accepted": false,
            "errors": serde_json::to_value(&errors)?,
        }),
    })
}

fn load_config(path: &Path) -> CliResult<FormConfig> {
    let config = FormConfig::load(path)?;
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

fn read_fields() -> CliResult<Vec<Field>> {
    parse_fields(read_request()?)
}

fn parse_fields(request: Value) -> CliResult<Vec<Field>> {
    if !request.is_array() {
        return Err(CliError::invalid_input("Expected a JSON array of fields"));
    }
    Ok(serde_json::from_value(request)?)
}

fn read_values() -> CliResult<BTreeMap<EntityId, Value>> {
    parse_values(read_request()?)
}

fn parse_values(request: Value) -> CliResult<BTreeMap<EntityId, Value>> {
    let Value::Object(map) = request else {
        return Err(CliError::invalid_input("Expected a JSON object of field values"));
    };

    map.into_iter()
        .map(|(key, value)| {
            key.parse::<EntityId>()
                .map(|id| (id, value))
                .map_err(|_| CliError::invalid_input(format!("Invalid field id: {}", key)))
        })
        .collect()
}
