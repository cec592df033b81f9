// Report rendering for analysis results

use crate::pipeline::{Analysis, AnalysisResult, EmptyGraph, Warning};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str = "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

/// Rows shown per section in the text and markdown reports. 0 shows everything.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub max_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { max_rows: 25 }
    }
}

impl ReportOptions {
    fn limit<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        if self.max_rows == 0 || rows.len() <= self.max_rows {
            rows
        } else {
            &rows[..self.max_rows]
        }
    }
}

pub fn render(analysis: &Analysis, format: ReportFormat, options: ReportOptions) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(analysis, options)),
        ReportFormat::Json => generate_json_report(analysis),
        ReportFormat::Markdown => Ok(generate_markdown_report(analysis, options)),
    }
}

pub fn generate_text_report(analysis: &Analysis, options: ReportOptions) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                      LINKRANK INTERNAL LINK ANALYSIS REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    let result = match analysis {
        Analysis::Empty(empty) => {
            push_empty_text(&mut report, empty);
            push_footer(&mut report);
            return report;
        }
        Analysis::Complete(result) => result,
    };

    let meta = &result.metadata;
    report.push_str(&format!("Pages analyzed:   {}\n", meta.nodes_kept));
    report.push_str(&format!("Links analyzed:   {}\n", meta.edges_kept));
    report.push_str(&format!("Links dropped:    {}\n", meta.edges_dropped));
    report.push_str(&format!(
        "Pages excluded:   {} (non-200: {}, non-indexable: {}, not in sitemap: {})\n",
        meta.build.pages_excluded.total(),
        meta.build.pages_excluded.non_ok,
        meta.build.pages_excluded.non_indexable,
        meta.build.pages_excluded.not_in_sitemap
    ));
    report.push_str(&format!(
        "PageRank:         {} after {} iterations (delta {:.2e})\n",
        if meta.converged { "converged" } else { "NOT converged" },
        meta.iterations_run,
        meta.final_delta
    ));
    report.push_str(&format!("Median score:     {}\n", format_score(meta.median_score)));
    push_warnings_text(&mut report, &meta.warnings);
    report.push('\n');

    push_section_header(&mut report, "TOP PAGES BY PAGERANK");
    for (idx, node) in options.limit(&result.ranked_nodes).iter().enumerate() {
        report.push_str(&format!(
            "{:>4}. {}  in:{:<4} out:{:<4} {}\n",
            idx + 1,
            format_score(node.score),
            node.inbound_count,
            node.outbound_count,
            display_url(&node.url)
        ));
    }
    push_truncation_note(&mut report, result.ranked_nodes.len(), options);
    report.push('\n');

    push_section_header(&mut report, "ORPHANED CONTENT");
    if result.orphans.is_empty() {
        report.push_str("  (none)\n");
    }
    for orphan in options.limit(&result.orphans) {
        report.push_str(&format!(
            "  {}  inlinks:{:<3} lost:{:>6.1}%  {}\n",
            format_score(orphan.score),
            orphan.inbound_count,
            orphan.lost_authority * 100.0,
            display_url(&orphan.url)
        ));
    }
    push_truncation_note(&mut report, result.orphans.len(), options);
    report.push('\n');

    push_section_header(&mut report, "AUTHORITY LEAKS");
    if result.leaks.is_empty() {
        report.push_str("  (none)\n");
    }
    for leak in options.limit(&result.leaks) {
        report.push_str(&format!(
            "{}  {}  leaked weight {:.2} ({:.0}% of outgoing)\n",
            format_score(leak.score),
            display_url(&leak.url),
            leak.leaked_weight,
            leak.leaked_share * 100.0
        ));
        for target in &leak.leaked_targets {
            let detail = match (target.score, target.status_code) {
                (Some(score), _) => format_score(score),
                (None, Some(status)) => format!("excluded ({})", status),
                (None, None) => "unknown page".to_string(),
            };
            report.push_str(&format!("    → {}  [{}]\n", display_url(&target.url), detail));
        }
        report.push_str(LIGHT_RULE);
    }
    push_truncation_note(&mut report, result.leaks.len(), options);
    report.push('\n');

    push_section_header(&mut report, "BROKEN AND REDIRECTED LINKS");
    if result.broken_links.is_empty() {
        report.push_str("  (none)\n");
    }
    for link in options.limit(&result.broken_links) {
        report.push_str(&format!(
            "  {} → {}\n    {}\n",
            display_url(&link.source_url),
            display_url(&link.target_url),
            link.recommendation()
        ));
    }
    push_truncation_note(&mut report, result.broken_links.len(), options);
    report.push('\n');

    push_section_header(&mut report, "LINK RECOMMENDATIONS");
    if result.recommendations.is_empty() {
        report.push_str("  (none)\n");
    }
    for (idx, rec) in options.limit(&result.recommendations).iter().enumerate() {
        report.push_str(&format!("[{}] {} → {}\n", idx + 1, rec.source_url, rec.target_url));
        report.push_str(&format!("    Anchor:        \"{}\"\n", rec.suggested_anchor));
        report.push_str(&format!("    Location:      {}\n", rec.location));
        report.push_str(&format!("    Expected gain: {}\n", format_score(rec.expected_gain)));
    }
    push_truncation_note(&mut report, result.recommendations.len(), options);
    report.push('\n');

    push_footer(&mut report);
    report
}

pub fn generate_json_report(analysis: &Analysis) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkrank",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "analysis": analysis
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(analysis: &Analysis, options: ReportOptions) -> String {
    let mut md = String::from("# Internal Link Analysis\n\n");

    let result = match analysis {
        Analysis::Empty(empty) => {
            md.push_str("**No analyzable pages.** ");
            md.push_str(&format!(
                "{} page records were read; none is an indexable 200 page.\n",
                empty.build.pages_seen
            ));
            return md;
        }
        Analysis::Complete(result) => result,
    };

    push_markdown_summary(&mut md, result);

    md.push_str("## Top pages\n\n| # | URL | Score | Inlinks | Outlinks |\n|---|---|---|---|---|\n");
    for (idx, node) in options.limit(&result.ranked_nodes).iter().enumerate() {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            idx + 1,
            escape_cell(&node.url),
            format_score(node.score),
            node.inbound_count,
            node.outbound_count
        ));
    }

    md.push_str("\n## Orphaned content\n\n| URL | Score | Inlinks | Lost authority |\n|---|---|---|---|\n");
    for orphan in options.limit(&result.orphans) {
        md.push_str(&format!(
            "| {} | {} | {} | {:.1}% |\n",
            escape_cell(&orphan.url),
            format_score(orphan.score),
            orphan.inbound_count,
            orphan.lost_authority * 100.0
        ));
    }

    md.push_str("\n## Authority leaks\n\n| URL | Score | Leaked weight | Targets |\n|---|---|---|---|\n");
    for leak in options.limit(&result.leaks) {
        let targets: Vec<String> = leak.leaked_targets.iter().map(|t| escape_cell(&t.url)).collect();
        md.push_str(&format!(
            "| {} | {} | {:.2} | {} |\n",
            escape_cell(&leak.url),
            format_score(leak.score),
            leak.leaked_weight,
            targets.join("<br>")
        ));
    }

    md.push_str("\n## Broken and redirected links\n\n| Source | Target | Status | Fix |\n|---|---|---|---|\n");
    for link in options.limit(&result.broken_links) {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&link.source_url),
            escape_cell(&link.target_url),
            link.status_code.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()),
            escape_cell(&link.recommendation())
        ));
    }

    md.push_str("\n## Recommendations\n\n| Source | Target | Anchor | Expected gain |\n|---|---|---|---|\n");
    for rec in options.limit(&result.recommendations) {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&rec.source_url),
            escape_cell(&rec.target_url),
            escape_cell(&rec.suggested_anchor),
            format_score(rec.expected_gain)
        ));
    }

    md
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Extract the path component from a URL, "/" for the site root.
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

pub fn format_score(score: f64) -> String {
    format!("{:.6}", score)
}

fn display_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}{}", host, extract_url_path(url)),
            None => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn push_section_header(report: &mut String, title: &str) {
    report.push_str(HEAVY_RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(HEAVY_RULE);
    report.push('\n');
}

fn push_truncation_note(report: &mut String, total: usize, options: ReportOptions) {
    if options.max_rows > 0 && total > options.max_rows {
        report.push_str(&format!("  … {} more not shown\n", total - options.max_rows));
    }
}

fn push_warnings_text(report: &mut String, warnings: &[Warning]) {
    for warning in warnings {
        report.push_str(&format!("[!] {}: {}\n", warning.stage, warning.message));
    }
}

fn push_empty_text(report: &mut String, empty: &EmptyGraph) {
    let build = &empty.build;
    report.push_str("No analyzable pages: no page record is an indexable 200 page.\n\n");
    report.push_str(&format!("Page records read:    {}\n", build.pages_seen));
    report.push_str(&format!("  non-200:            {}\n", build.pages_excluded.non_ok));
    report.push_str(&format!("  non-indexable:      {}\n", build.pages_excluded.non_indexable));
    report.push_str(&format!("  not in sitemap:     {}\n", build.pages_excluded.not_in_sitemap));
    report.push_str(&format!("  missing url:        {}\n", build.pages_invalid));
    push_warnings_text(report, &empty.warnings);
    report.push('\n');
}

fn push_markdown_summary(md: &mut String, result: &AnalysisResult) {
    let meta = &result.metadata;
    md.push_str(&format!("- Pages analyzed: {}\n", meta.nodes_kept));
    md.push_str(&format!("- Links analyzed: {}\n", meta.edges_kept));
    md.push_str(&format!("- Links dropped: {}\n", meta.edges_dropped));
    md.push_str(&format!(
        "- PageRank: {} after {} iterations\n",
        if meta.converged { "converged" } else { "not converged" },
        meta.iterations_run
    ));
    for warning in &meta.warnings {
        md.push_str(&format!("- ⚠ {}: {}\n", warning.stage, warning.message));
    }
    md.push('\n');
}

fn push_footer(report: &mut String) {
    report.push_str(HEAVY_RULE);
    report.push_str("                                 End of Report\n");
    report.push_str(HEAVY_RULE);
    report.push_str("\nGenerated by linkrank\n\n");
}
