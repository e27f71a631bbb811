use clap::Args;
use shipwright::clean;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct CleanArgs {}

pub fn run(_args: CleanArgs, global: &GlobalArgs) -> CmdResult<clean::CleanOutput> {
    let output = clean::run(&global.ctx)?;
    Ok((output, 0))
}
