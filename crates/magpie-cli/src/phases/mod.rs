//! Phase implementations and dispatch.
//!
//! Each phase runs against injected collaborators (config, service client,
//! archiver, state store, output) so the orchestration logic is testable
//! without a real runner or cache service. [`run`] wires the production
//! collaborators from the environment.

use magpie_archive::ZstdPipeline;
use magpie_config::{chunk_size_from_env, ActionConfig, RunnerPaths};
use magpie_core::error::MagpieResult;
use magpie_core::RunnerStateStore;
use magpie_service::CacheServiceClient;

use crate::output::OutputHandler;
use crate::Phase;

pub mod restore;
pub mod save;


/// Run one phase with collaborators built from the environment
pub async fn run(phase: Phase) -> MagpieResult<()> {
    let paths = RunnerPaths::from_env();
    let output = OutputHandler::new(paths.output_file);
    let state = RunnerStateStore::new(paths.state_file);
    let archiver = ZstdPipeline::new();
    let client = CacheServiceClient::from_env()?;

    match phase {
        Phase::Main => {
            let config = ActionConfig::from_env()?;
            restore::execute(&config, client.as_ref(), &archiver, &state, &output).await?;
            Ok(())
        },
        Phase::Post => {
            save::execute(
                client.as_ref(),
                &archiver,
                &state,
                &output,
                chunk_size_from_env(),
            )
            .await
        },
    }
}
