use clap::Args;
use shipwright::pipeline::{self, PipelineReport, ProcessStageRunner};

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct RunArgs {}

pub fn run(_args: RunArgs, global: &GlobalArgs) -> CmdResult<PipelineReport> {
    let report = pipeline::run(&global.ctx, &ProcessStageRunner)?;
    Ok((report, 0))
}
