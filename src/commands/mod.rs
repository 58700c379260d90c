//! Command dispatch and handlers.

pub mod run;
pub mod status;

use std::sync::Arc;

use crate::adapters::memory::InMemoryWarehouse;
use crate::cli::{Cli, Command};
use crate::config::WizardConfig;
use crate::logging;
use crate::validators::{FinalActionsValidator, InitialActionsValidator, OrderDependencies};

/// Dispatch a parsed command to its handler.
///
/// Configuration comes from the environment (and `.env`) with CLI flags on
/// top. When a record cassette is configured, clock, id and validation
/// calls are written to it once the command finishes, even on error.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = cli.apply(WizardConfig::from_env());
    logging::init(&config.log_filter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;

    runtime.block_on(dispatch_with_config(&cli.command, &config))
}

async fn dispatch_with_config(command: &Command, config: &WizardConfig) -> Result<(), String> {
    match command {
        Command::Status { data, task } => status::run(data, task).await,
        Command::Run { data, task, action, script, json, save_to } => {
            let options = run::RunOptions {
                action_id: action.as_deref(),
                json: *json,
                save_to: save_to.as_deref(),
            };
            run::run(config, data, task, script, &options).await
        }
    }
}

fn load_warehouse(path: &std::path::Path) -> Result<Arc<InMemoryWarehouse>, String> {
    InMemoryWarehouse::load(path).map(Arc::new)
}

fn order_validator() -> Arc<FinalActionsValidator> {
    Arc::new(FinalActionsValidator::new(
        Arc::new(InitialActionsValidator::new()),
        Arc::new(OrderDependencies),
    ))
}
