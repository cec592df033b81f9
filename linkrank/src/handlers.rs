use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkrank_core::config::AnalysisConfig;
use linkrank_core::model::LinkLocation;
use linkrank_core::pipeline::{Analysis, Analyzer};
use linkrank_core::report::{ReportFormat, ReportOptions, render, save_report};
use linkrank_loader::CrawlExport;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Printed on stderr; stdout carries only command output.
pub fn print_banner() {
    eprintln!(
        "{} {}",
        "linkrank".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    eprintln!("{}", "internal link graph analysis".bright_black());
    eprintln!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Expand `~` in a path argument.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Parse a `location=value` weight override.
pub fn parse_weight_override(raw: &str) -> Result<(String, f64), String> {
    let (location, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LOCATION=VALUE, got '{}'", raw))?;
    let location = location.trim();
    if location.is_empty() {
        return Err(format!("missing location name in '{}'", raw));
    }
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((location.to_string(), weight))
}

/// Defaults, or the TOML file at `path` layered over them.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Explicit command-line values that win over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub damping: Option<f64>,
    pub epsilon: Option<f64>,
    pub max_iterations: Option<usize>,
    pub min_inlinks: Option<usize>,
    pub threshold: Option<f64>,
    pub threads: Option<usize>,
    pub location: Option<String>,
    pub max_recommendations: Option<usize>,
    pub weights: Vec<(String, f64)>,
}

impl ConfigOverrides {
    pub fn from_matches(args: &ArgMatches) -> Self {
        Self {
            damping: args.get_one::<f64>("damping").copied(),
            epsilon: args.get_one::<f64>("epsilon").copied(),
            max_iterations: args.get_one::<usize>("max-iterations").copied(),
            min_inlinks: args.get_one::<usize>("min-inlinks").copied(),
            threshold: args.get_one::<f64>("threshold").copied(),
            threads: args.get_one::<usize>("threads").copied(),
            location: args.get_one::<String>("location").cloned(),
            max_recommendations: args.get_one::<usize>("max-recommendations").copied(),
            weights: args
                .get_many::<(String, f64)>("weight")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }

    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(damping) = self.damping {
            config.damping = damping;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(min_inlinks) = self.min_inlinks {
            config.min_inlinks = min_inlinks;
        }
        if let Some(threshold) = self.threshold {
            config.pagerank_threshold = threshold;
        }
        if let Some(threads) = self.threads {
            config.workers = threads;
        }
        if let Some(ref location) = self.location {
            config.recommendation_location = LinkLocation::parse(location);
        }
        if let Some(max) = self.max_recommendations {
            config.max_recommendations_per_orphan = max;
        }
        for (location, weight) in &self.weights {
            config.weights.set(location, *weight);
        }
    }
}

/// Everything `linkrank analyze` was asked to do.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub pages: PathBuf,
    pub links: PathBuf,
    pub sitemaps: Vec<PathBuf>,
    pub config: AnalysisConfig,
    pub format: ReportFormat,
    pub rows: usize,
    pub output: Option<PathBuf>,
}

impl AnalyzeOptions {
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let pages = args
            .get_one::<String>("pages")
            .map(|p| expand_path(p))
            .context("--pages is required")?;
        let links = args
            .get_one::<String>("links")
            .map(|p| expand_path(p))
            .context("--links is required")?;
        let sitemaps = args
            .get_many::<String>("sitemap")
            .map(|values| values.map(|p| expand_path(p)).collect())
            .unwrap_or_default();

        let config_path = args.get_one::<String>("config").map(|p| expand_path(p));
        let mut config = load_config(config_path.as_deref())?;
        ConfigOverrides::from_matches(args).apply(&mut config);

        let format_name = args
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text");
        let Some(format) = ReportFormat::from_str(format_name) else {
            bail!("Unknown report format '{}'", format_name);
        };

        Ok(Self {
            pages,
            links,
            sitemaps,
            config,
            format,
            rows: args.get_one::<usize>("rows").copied().unwrap_or(25),
            output: args.get_one::<String>("output").map(|p| expand_path(p)),
        })
    }
}

/// Load the export, run the analysis and render the report.
pub fn run_analysis(
    options: &AnalyzeOptions,
    progress: Option<&ProgressBar>,
) -> Result<(Analysis, String)> {
    let set_message = |msg: String| {
        if let Some(pb) = progress {
            pb.set_message(msg);
        }
    };

    let analyzer = Analyzer::new(options.config.clone()).context("Invalid analysis configuration")?;

    set_message(format!("Loading {}", options.pages.display()));
    let export = CrawlExport::load(&options.pages, &options.links, &options.sitemaps)
        .context("Failed to load crawl export")?;

    let analyzer = match export.sitemap {
        Some(ref urls) => analyzer.with_sitemap(urls),
        None => analyzer,
    };

    set_message(format!(
        "Analyzing {} pages and {} links",
        export.pages.len(),
        export.links.len()
    ));
    let analysis = analyzer
        .run(&export.pages, &export.links)
        .context("Analysis failed")?;

    let report = render(
        &analysis,
        options.format,
        ReportOptions {
            max_rows: options.rows,
        },
    )
    .context("Failed to render report")?;

    Ok((analysis, report))
}

pub fn handle_analyze(args: &ArgMatches, quiet: bool) -> Result<()> {
    let options = AnalyzeOptions::from_matches(args)?;
    debug!("Analysis configuration: {:?}", options.config);

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Invalid spinner template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let outcome = run_analysis(&options, spinner.as_ref());
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }
    let (analysis, report) = outcome?;

    deliver_report(
        &analysis,
        &report,
        options.output.as_deref(),
        quiet,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Save the report to `output`, or write it to `out`. Without an output file
/// the report is the only thing written to `out` and the run summary goes to
/// `status`, so piped JSON stays parseable.
pub fn deliver_report(
    analysis: &Analysis,
    report: &str,
    output: Option<&Path>,
    quiet: bool,
    out: &mut dyn Write,
    status: &mut dyn Write,
) -> Result<()> {
    match output {
        Some(path) => {
            if !quiet {
                write_summary(analysis, out)?;
            }
            save_report(report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                writeln!(
                    out,
                    "{} Report written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                )?;
            }
        }
        None => {
            if !quiet {
                write_summary(analysis, status)?;
            }
            write!(out, "{}", report)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn write_summary(analysis: &Analysis, w: &mut dyn Write) -> io::Result<()> {
    let Some(result) = analysis.result() else {
        writeln!(
            w,
            "{} No analyzable pages: none of {} page records is an indexable 200 page",
            "⚠".yellow().bold(),
            analysis.build_summary().pages_seen
        )?;
        return Ok(());
    };

    let meta = &result.metadata;
    writeln!(
        w,
        "{} Ranked {} pages over {} links",
        "✓".green().bold(),
        meta.nodes_kept,
        meta.edges_kept
    )?;
    for warning in &meta.warnings {
        writeln!(w, "{} {}: {}", "⚠".yellow().bold(), warning.stage, warning.message)?;
    }
    writeln!(
        w,
        "{} {} orphans, {} leaks, {} broken links, {} recommendations",
        "→".blue(),
        result.orphans.len(),
        result.leaks.len(),
        result.broken_links.len(),
        result.recommendations.len()
    )?;
    writeln!(w)
}

/// Write the default configuration to `path`, refusing to replace an
/// existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let body = toml::to_string_pretty(&AnalysisConfig::default())
        .context("Failed to serialize default configuration")?;
    let content = format!("# linkrank analysis configuration\n\n{}", body);
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn handle_init(args: &ArgMatches, quiet: bool) -> Result<()> {
    let raw = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/linkrank/linkrank.toml");
    let path = expand_path(raw);
    let force = args.get_flag("force");

    if !quiet {
        print_divider();
        println!("{}", "  LINKRANK INITIALIZATION".bright_white().bold());
        print_divider();
        println!();
    }

    write_default_config(&path, force)?;

    if !quiet {
        println!(
            "{} Configuration written to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
        println!(
            "{} Use it with: linkrank analyze --config {} ...",
            "→".blue(),
            path.display()
        );
    }
    Ok(())
}
