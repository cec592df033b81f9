use crate::handlers::parse_weight_override;
use clap::{ArgAction, arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkrank")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkrank")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress spinner and log output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output (per-iteration PageRank deltas) to stderr")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default analysis configuration as TOML")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the configuration file")
                        .default_value("~/.config/linkrank/linkrank.toml"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing configuration file at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Build the internal link graph from a crawl export, rank pages with \
                location-weighted PageRank and report orphans, leaks and link suggestions.",
                )
                .arg(
                    arg!(-p --"pages" <PATH>)
                        .required(true)
                        .help("Page records: JSON array or JSON Lines"),
                )
                .arg(
                    arg!(-l --"links" <PATH>)
                        .required(true)
                        .help("Link records: JSON array or JSON Lines"),
                )
                .arg(
                    arg!(-s --"sitemap" <PATH>)
                        .required(false)
                        .help("Sitemap XML allowlist; repeat for several files")
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("TOML configuration file (see `linkrank init`)"),
                )
                .arg(
                    arg!(--"damping" <FACTOR>)
                        .required(false)
                        .help("PageRank damping factor, strictly between 0 and 1")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"epsilon" <DELTA>)
                        .required(false)
                        .help("Convergence threshold on the L1 change between iterations")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"max-iterations" <NUM>)
                        .required(false)
                        .help("Iteration cap for the PageRank loop")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"min-inlinks" <NUM>)
                        .required(false)
                        .help("Pages with fewer inbound links from other pages are orphans")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"threshold" <FRACTION>)
                        .required(false)
                        .help("Top fraction of pages by score checked for authority leaks")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(-w --"weight" <LOCATION_EQ_VALUE>)
                        .required(false)
                        .help("Override a location weight, e.g. footer=0.2; repeatable")
                        .value_parser(parse_weight_override)
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Worker threads for scoring (0 = one per CPU, 1 = sequential)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"location" <LOCATION>)
                        .required(false)
                        .help("Page location assumed for recommended links (default: body)"),
                )
                .arg(
                    arg!(--"max-recommendations" <NUM>)
                        .required(false)
                        .help("Suggestions kept per orphan (0 = all)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: print to stdout)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"rows" <NUM>)
                        .required(false)
                        .help("Rows per report section (0 = all)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("25"),
                ),
        )
}
