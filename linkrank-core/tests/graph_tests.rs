// Tests for graph construction

use linkrank_core::graph::{ExclusionReason, GraphBuilder};
use linkrank_core::model::{LinkLocation, LinkRecord, PageRecord, normalize_url};

fn link(source: &str, target: &str) -> LinkRecord {
    LinkRecord::new(source, target, LinkLocation::Body)
}

// ============================================================================
// URL Normalization Tests
// ============================================================================

#[test]
fn test_normalize_url_lowercases() {
    assert_eq!(normalize_url("HTTPS://Example.COM/About"), "https://example.com/about");
}

#[test]
fn test_normalize_url_strips_trailing_slash() {
    assert_eq!(normalize_url("https://example.com/blog/"), "https://example.com/blog");
    assert_eq!(normalize_url("https://example.com/"), "https://example.com");
}

#[test]
fn test_normalize_url_strips_repeated_slashes_and_whitespace() {
    assert_eq!(normalize_url("  https://example.com/a//  "), "https://example.com/a");
}

// ============================================================================
// Node Filtering Tests
// ============================================================================

#[test]
fn test_only_ok_indexable_pages_become_nodes() {
    let pages = vec![
        PageRecord::ok("https://example.com/"),
        PageRecord::ok("https://example.com/missing").with_status(404),
        PageRecord::ok("https://example.com/old").with_status(301),
        PageRecord::ok("https://example.com/private").with_indexable(false),
    ];

    let (graph, summary) = GraphBuilder::new().build(&pages, &[]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(summary.nodes_kept, 1);
    assert_eq!(summary.pages_excluded.non_ok, 2);
    assert_eq!(summary.pages_excluded.non_indexable, 1);
    assert!(graph.node_id("https://example.com").is_some());

    let excluded = graph.excluded_page("https://example.com/private").unwrap();
    assert_eq!(excluded.reason, ExclusionReason::NonIndexable);
}

#[test]
fn test_page_without_url_is_skipped_and_counted() {
    let pages = vec![
        PageRecord::ok("https://example.com/a"),
        PageRecord {
            url: None,
            status_code: 200,
            indexable: true,
            ..PageRecord::default()
        },
        PageRecord::ok("   "),
    ];

    let (graph, summary) = GraphBuilder::new().build(&pages, &[]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(summary.pages_invalid, 2);
    assert_eq!(summary.invalid_records.len(), 2);
    assert_eq!(summary.invalid_records[0].position, 1);
    assert_eq!(summary.invalid_records[0].field, "url");
}

#[test]
fn test_duplicate_page_records_keep_first() {
    let pages = vec![
        PageRecord::ok("https://example.com/a").with_title("First"),
        PageRecord::ok("https://EXAMPLE.com/a/").with_title("Second"),
    ];

    let (graph, summary) = GraphBuilder::new().build(&pages, &[]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(summary.duplicate_pages, 1);
    let id = graph.node_id("https://example.com/a").unwrap();
    assert_eq!(graph.page(id).title.as_deref(), Some("First"));
}

#[test]
fn test_sitemap_allowlist_excludes_unlisted_pages() {
    let pages = vec![
        PageRecord::ok("https://example.com/listed"),
        PageRecord::ok("https://example.com/unlisted"),
    ];

    let (graph, summary) = GraphBuilder::new()
        .with_sitemap(["https://Example.com/listed/"])
        .build(&pages, &[]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(summary.pages_excluded.not_in_sitemap, 1);
    assert!(graph.node_id("https://example.com/listed").is_some());
}

#[test]
fn test_node_indices_follow_url_order() {
    let pages = vec![
        PageRecord::ok("https://example.com/c"),
        PageRecord::ok("https://example.com/a"),
        PageRecord::ok("https://example.com/b"),
    ];

    let (graph, _) = GraphBuilder::new().build(&pages, &[]);

    let urls: Vec<&str> = graph.node_ids().map(|id| graph.url(id)).collect();
    assert_eq!(
        urls,
        vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]
    );
}

// ============================================================================
// Edge Tests
// ============================================================================

#[test]
fn test_edges_match_after_normalization() {
    let pages = vec![
        PageRecord::ok("https://example.com/"),
        PageRecord::ok("https://example.com/About"),
    ];
    let links = vec![link("HTTPS://EXAMPLE.COM", "https://example.com/about/")];

    let (graph, summary) = GraphBuilder::new().build(&pages, &links);

    assert_eq!(summary.edges_kept, 1);
    let home = graph.node_id("https://example.com").unwrap();
    let about = graph.node_id("https://example.com/about").unwrap();
    assert!(graph.has_edge(home, about));
}

#[test]
fn test_duplicate_edges_are_preserved() {
    let pages = vec![PageRecord::ok("https://example.com/a"), PageRecord::ok("https://example.com/b")];
    let links = vec![
        link("https://example.com/a", "https://example.com/b"),
        link("https://example.com/a", "https://example.com/b"),
    ];

    let (graph, _) = GraphBuilder::new().build(&pages, &links);

    let a = graph.node_id("https://example.com/a").unwrap();
    let b = graph.node_id("https://example.com/b").unwrap();
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.out_degree(a), 2);
    assert_eq!(graph.in_degree(b), 2);
}

#[test]
fn test_self_loops_are_kept() {
    let pages = vec![PageRecord::ok("https://example.com/a")];
    let links = vec![link("https://example.com/a", "https://example.com/a/")];

    let (graph, summary) = GraphBuilder::new().build(&pages, &links);

    let a = graph.node_id("https://example.com/a").unwrap();
    assert_eq!(summary.self_loops, 1);
    assert_eq!(graph.in_degree(a), 1);
    assert_eq!(graph.inlinks_from_other_pages(a), 0);
}

#[test]
fn test_edges_outside_node_set_are_dropped_and_counted() {
    let pages = vec![
        PageRecord::ok("https://example.com/a"),
        PageRecord::ok("https://example.com/gone").with_status(404),
    ];
    let links = vec![
        link("https://example.com/a", "https://example.com/gone"),
        link("https://example.com/a", "https://example.com/never-crawled"),
        link("https://example.com/gone", "https://example.com/a"),
        link("https://elsewhere.com/", "https://example.com/a"),
    ];

    let (graph, summary) = GraphBuilder::new().build(&pages, &links);

    assert_eq!(graph.edge_count(), 0);
    assert_eq!(summary.edges_dropped.excluded_target, 1);
    assert_eq!(summary.edges_dropped.unknown_target, 1);
    assert_eq!(summary.edges_dropped.excluded_source, 1);
    assert_eq!(summary.edges_dropped.unknown_source, 1);
    assert_eq!(summary.edges_dropped.total(), 4);
}

#[test]
fn test_outbound_exclusions_track_dropped_targets() {
    let pages = vec![
        PageRecord::ok("https://example.com/a"),
        PageRecord::ok("https://example.com/gone").with_status(404),
    ];
    let links = vec![
        link("https://example.com/a", "https://example.com/gone").with_anchor("old page"),
        link("https://example.com/gone", "https://example.com/a"),
    ];

    let (graph, _) = GraphBuilder::new().build(&pages, &links);

    let exclusions = graph.outbound_exclusions();
    assert_eq!(exclusions.len(), 1);
    assert_eq!(exclusions[0].target_url, "https://example.com/gone");
    assert_eq!(exclusions[0].anchor_text, "old page");
    assert_eq!(graph.url(exclusions[0].source), "https://example.com/a");
}

#[test]
fn test_link_missing_target_is_counted() {
    let pages = vec![PageRecord::ok("https://example.com/a")];
    let links = vec![LinkRecord {
        source_url: Some("https://example.com/a".to_string()),
        target_url: None,
        ..LinkRecord::default()
    }];

    let (graph, summary) = GraphBuilder::new().build(&pages, &links);

    assert_eq!(graph.edge_count(), 0);
    assert_eq!(summary.edges_dropped.missing_field, 1);
    assert_eq!(summary.invalid_records[0].field, "target_url");
}

#[test]
fn test_build_summary_counts_seen_records() {
    let pages = vec![PageRecord::ok("https://example.com/a"), PageRecord::ok("https://example.com/b")];
    let links = vec![link("https://example.com/a", "https://example.com/b")];

    let (_, summary) = GraphBuilder::new().build(&pages, &links);

    assert_eq!(summary.pages_seen, 2);
    assert_eq!(summary.links_seen, 1);
    assert_eq!(summary.edges_kept, 1);
}
