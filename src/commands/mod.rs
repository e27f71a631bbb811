//! CLI command handlers.
//!
//! Each handler adapts parsed arguments to a library call and returns the
//! payload plus an exit code; the JSON envelope and exit-code mapping live in
//! `output`.

pub mod build;
pub mod clean;
pub mod context;
pub mod install;
pub mod push;
pub mod release;
pub mod run;
pub mod test;

pub type CmdResult<T> = shipwright::Result<(T, i32)>;

/// Context shared by every command, resolved once at startup.
pub(crate) struct GlobalArgs {
    pub ctx: shipwright::PipelineContext,
}

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (shipwright::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Build(args) => dispatch!(args, global, build),
        crate::Commands::Install(args) => dispatch!(args, global, install),
        crate::Commands::Test(args) => dispatch!(args, global, test),
        crate::Commands::Push(args) => dispatch!(args, global, push),
        crate::Commands::Release(args) => dispatch!(args, global, release),
        crate::Commands::Clean(args) => dispatch!(args, global, clean),
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Context(args) => dispatch!(args, global, context),
    }
}
