use clap::Args;
use shipwright::release;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ReleaseArgs {}

pub fn run(_args: ReleaseArgs, global: &GlobalArgs) -> CmdResult<release::ReleaseOutput> {
    let output = release::run(&global.ctx)?;
    Ok((output, 0))
}
