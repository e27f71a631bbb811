use clap::Args;
use shipwright::install;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct InstallArgs {}

pub fn run(_args: InstallArgs, global: &GlobalArgs) -> CmdResult<install::InstallOutput> {
    let output = install::run(&global.ctx)?;
    Ok((output, 0))
}
