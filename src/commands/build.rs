use clap::Args;
use shipwright::build;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args, Default)]
pub struct BuildArgs {}

pub fn run(_args: BuildArgs, global: &GlobalArgs) -> CmdResult<build::BuildOutput> {
    let output = build::run(&global.ctx)?;
    Ok((output, 0))
}
