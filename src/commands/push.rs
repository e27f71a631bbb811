use clap::Args;
use shipwright::publish;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct PushArgs {}

/// Publish is tag-gated even when invoked directly: a branch or manual run
/// reports the stage skipped and exits zero instead of uploading.
pub fn run(_args: PushArgs, global: &GlobalArgs) -> CmdResult<publish::PublishOutput> {
    if !global.ctx.trigger.is_tag() {
        return Ok((
            publish::PublishOutput::skipped("not a tag-triggered run"),
            0,
        ));
    }
    let output = publish::run(&global.ctx)?;
    Ok((output, 0))
}
