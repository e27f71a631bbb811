use clap::Args;
use serde::Serialize;
use shipwright::pipeline::{self, PlannedStage};
use shipwright::PipelineContext;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ContextArgs {}

/// Resolved configuration plus the stage plan it implies. Credentials are
/// masked by the context's own serialization.
#[derive(Serialize)]
pub struct ContextOutput {
    pub context: PipelineContext,
    pub plan: Vec<PlannedStage>,
}

pub fn run(_args: ContextArgs, global: &GlobalArgs) -> CmdResult<ContextOutput> {
    let plan = pipeline::plan(&global.ctx);
    Ok((
        ContextOutput {
            context: global.ctx.clone(),
            plan,
        },
        0,
    ))
}
