use colored::Colorize;
use linkrank::command_argument_builder;
use linkrank::handlers::{handle_analyze, handle_init, print_banner};
use tracing::Level;

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    let sub_flag = |name: &str| {
        chosen_command
            .subcommand()
            .is_some_and(|(_, sub)| sub.get_flag(name))
    };
    let quiet = chosen_command.get_flag("quiet") || sub_flag("quiet");
    let verbose = chosen_command.get_flag("verbose") || sub_flag("verbose");

    init_tracing(quiet, verbose);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command, quiet),
        Some(("analyze", primary_command)) => handle_analyze(primary_command, quiet),
        None => Ok(()),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so reports on stdout stay clean.
fn init_tracing(quiet: bool, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

