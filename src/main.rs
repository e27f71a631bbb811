use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::GlobalArgs;
use shipwright::env::EnvSnapshot;
use shipwright::PipelineContext;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version = VERSION)]
#[command(about = "CLI for package build, test, and publish pipeline automation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build distributable artifacts into dist/
    Build(commands::build::BuildArgs),
    /// Install the package in editable mode
    Install(commands::install::InstallArgs),
    /// Run the package test suite
    Test(commands::test::TestArgs),
    /// Upload built artifacts to the package repository
    Push(commands::push::PushArgs),
    /// Create a source-control release with built artifacts
    Release(commands::release::ReleaseArgs),
    /// Remove build byproducts
    Clean(commands::clean::CleanArgs),
    /// Run the full pipeline
    Run(commands::run::RunArgs),
    /// Show the resolved pipeline context and stage plan
    Context(commands::context::ContextArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Configuration is read exactly once; every command sees the same
    // resolved context.
    let env = EnvSnapshot::capture();
    let workdir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            let err = shipwright::Error::internal_io(
                format!("Failed to resolve working directory: {}", e),
                Some("startup".to_string()),
            );
            let _ = output::print_json_result(Err(err));
            return std::process::ExitCode::from(1);
        }
    };

    let ctx = match PipelineContext::resolve(&env, &workdir) {
        Ok(ctx) => ctx,
        Err(err) => {
            let _ = output::print_json_result(Err(err));
            return std::process::ExitCode::from(2);
        }
    };

    let global = GlobalArgs { ctx };
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Build(commands::build::BuildArgs::default()));

    let (json_result, exit_code) = commands::run_json(command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        let _ = output::print_json_result(Err(err));
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
