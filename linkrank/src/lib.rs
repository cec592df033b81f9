pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    AnalyzeOptions, ConfigOverrides, load_config, parse_weight_override, run_analysis,
    write_default_config,
};
