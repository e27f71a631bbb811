use clap::Args;
use shipwright::test;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct TestArgs {}

pub fn run(_args: TestArgs, global: &GlobalArgs) -> CmdResult<test::TestOutput> {
    let output = test::run_standalone(&global.ctx)?;
    Ok((output, 0))
}
