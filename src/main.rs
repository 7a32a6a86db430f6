use clap::Parser;
use snapcull::cli::{Cli, Command, PinArgs, RunArgs};
use snapcull::config::Config;
use snapcull::engine::{self, RunMode};
use snapcull::report;
use snapcull::source::nix::{NixDeleter, NixProfileSource};
use snapcull::state::StateDocument;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => run(&args, RunMode::Plan),
        Command::Apply(args) => run(&args, RunMode::Apply),
        Command::Pin(args) => pin(&args, true),
        Command::Unpin(args) => pin(&args, false),
    }
}

fn run(args: &RunArgs, mode: RunMode) {
    let config = match Config::load(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let source = NixProfileSource::new(config.profile.clone(), config.repo.clone());
    let deleter = NixDeleter {
        profile: config.profile.clone(),
    };

    match engine::run(
        &source,
        &deleter,
        &config.state_path,
        &config.engine_params(),
        mode,
    ) {
        Ok(outcome) => {
            if outcome.snapshots.is_empty() {
                println!("No snapshots found.");
                if config.verbose {
                    for diagnostic in &outcome.diagnostics {
                        eprintln!("  {diagnostic}");
                    }
                }
                return;
            }

            report::print(&outcome, &config);

            if mode == RunMode::Plan && !outcome.plan.delete.is_empty() && !config.json_output {
                println!("\nplan only; run 'snapcull apply' to execute deletions");
            }

            if !outcome.errors.is_empty() {
                eprintln!("\nerrors encountered:");
                for error in &outcome.errors {
                    eprintln!("  {error}");
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn pin(args: &PinArgs, add: bool) {
    // same resolution chain as plan/apply, so pins land where runs look
    let state_path = Config::resolve_state_path(args.state.clone());

    let (mut state, diagnostic) = StateDocument::load(&state_path);
    if let Some(diagnostic) = diagnostic {
        eprintln!("warning: {diagnostic}");
    }

    let changed = if add {
        state.pinned.insert(args.id)
    } else {
        state.pinned.remove(&args.id)
    };

    if let Err(e) = state.save(&state_path) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match (add, changed) {
        (true, true) => println!("pinned snapshot {}", args.id),
        (true, false) => println!("snapshot {} already pinned", args.id),
        (false, true) => println!("unpinned snapshot {}", args.id),
        (false, false) => println!("snapshot {} was not pinned", args.id),
    }
}
