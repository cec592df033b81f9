// Tests for orphan, authority-leak and broken-link diagnostics

use linkrank_core::diagnostics::{DiagnosticsEngine, LinkFix};
use linkrank_core::graph::{Graph, GraphBuilder};
use linkrank_core::model::{LinkLocation, LinkRecord, PageRecord};
use linkrank_core::pagerank::{PageRankEngine, PageRankScores};

fn url(name: &str) -> String {
    format!("https://example.com/{}", name)
}

fn body(s: &str, t: &str) -> LinkRecord {
    LinkRecord::new(&url(s), &url(t), LinkLocation::Body)
}

fn footer(s: &str, t: &str) -> LinkRecord {
    LinkRecord::new(&url(s), &url(t), LinkLocation::Footer)
}

fn scored(pages: &[PageRecord], links: &[LinkRecord]) -> (Graph, PageRankScores) {
    let (graph, _) = GraphBuilder::new().build(pages, links);
    let scores = PageRankEngine::default().score(&graph).unwrap();
    (graph, scores)
}

fn ok_pages(names: &[&str]) -> Vec<PageRecord> {
    names.iter().map(|n| PageRecord::ok(&url(n))).collect()
}

/// Hub with four body-linked children and one footer-linked page.
/// Every child links back to the hub.
fn leaky_site() -> (Vec<PageRecord>, Vec<LinkRecord>) {
    let mut pages = ok_pages(&["hub", "l1", "l2", "l3", "l4", "thin"]);
    pages.push(PageRecord::ok(&url("gone")).with_status(404));

    let mut links = Vec::new();
    for child in ["l1", "l2", "l3", "l4", "thin"] {
        links.push(body(child, "hub"));
    }
    for child in ["l1", "l2", "l3", "l4"] {
        links.push(body("hub", child));
    }
    links.push(footer("hub", "thin"));
    links.push(body("hub", "gone"));
    (pages, links)
}

// ============================================================================
// Orphan Tests
// ============================================================================

#[test]
fn test_page_without_inlinks_is_always_orphan() {
    let (graph, scores) = scored(&ok_pages(&["home", "lonely"]), &[body("lonely", "home")]);

    for min_inlinks in 1..=3 {
        let diagnostics = DiagnosticsEngine::default()
            .with_min_inlinks(min_inlinks)
            .diagnose(&graph, &scores);
        assert!(diagnostics.orphans.iter().any(|o| o.url == url("lonely")));
    }
}

#[test]
fn test_min_inlinks_threshold() {
    let (graph, scores) = scored(
        &ok_pages(&["a", "b", "c"]),
        &[body("a", "c"), body("b", "c"), body("c", "a")],
    );

    let diagnostics = DiagnosticsEngine::default()
        .with_min_inlinks(2)
        .diagnose(&graph, &scores);

    let urls: Vec<&str> = diagnostics.orphans.iter().map(|o| o.url.as_str()).collect();
    assert!(urls.contains(&url("a").as_str()));
    assert!(urls.contains(&url("b").as_str()));
    assert!(!urls.contains(&url("c").as_str()));
}

#[test]
fn test_zero_min_inlinks_reports_no_orphans() {
    let (graph, scores) = scored(&ok_pages(&["a", "b"]), &[]);
    let diagnostics = DiagnosticsEngine::default()
        .with_min_inlinks(0)
        .diagnose(&graph, &scores);
    assert!(diagnostics.orphans.is_empty());
}

#[test]
fn test_self_loop_does_not_rescue_orphan() {
    let (graph, scores) = scored(&ok_pages(&["a", "b"]), &[body("a", "a"), body("a", "b")]);

    let diagnostics = DiagnosticsEngine::default()
        .with_min_inlinks(1)
        .diagnose(&graph, &scores);

    let orphan = diagnostics.orphans.iter().find(|o| o.url == url("a")).unwrap();
    assert_eq!(orphan.inbound_count, 0);
}

#[test]
fn test_orphans_sorted_by_lost_authority() {
    let (pages, links) = leaky_site();
    let (graph, scores) = scored(&pages, &links);

    let diagnostics = DiagnosticsEngine::default()
        .with_min_inlinks(2)
        .diagnose(&graph, &scores);

    assert!(diagnostics.orphans.len() >= 2);
    for pair in diagnostics.orphans.windows(2) {
        assert!(pair[0].lost_authority >= pair[1].lost_authority);
    }
    // The footer-only page is the weakest and leads the list.
    assert_eq!(diagnostics.orphans[0].url, url("thin"));
    assert!(diagnostics.orphans[0].lost_authority > 0.0);
}

// ============================================================================
// Authority Leak Tests
// ============================================================================

#[test]
fn test_hub_leaks_to_low_value_and_excluded_targets() {
    let (pages, links) = leaky_site();
    let (graph, scores) = scored(&pages, &links);

    let diagnostics = DiagnosticsEngine::default().diagnose(&graph, &scores);

    assert_eq!(diagnostics.leaks.len(), 1);
    let leak = &diagnostics.leaks[0];
    assert_eq!(leak.url, url("hub"));

    let targets: Vec<&str> = leak.leaked_targets.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(targets, vec![url("gone").as_str(), url("thin").as_str()]);

    let gone = &leak.leaked_targets[0];
    assert_eq!(gone.score, None);
    assert_eq!(gone.status_code, Some(404));

    let thin = &leak.leaked_targets[1];
    assert!(thin.score.unwrap() < diagnostics.median_score);

    assert!((leak.leaked_weight - 1.3).abs() < 1e-9);
    assert!((leak.leaked_share - 1.3 / 5.3).abs() < 1e-9);
}

#[test]
fn test_symmetric_cycle_has_no_leaks() {
    let (graph, scores) = scored(
        &ok_pages(&["a", "b", "c"]),
        &[body("a", "b"), body("b", "c"), body("c", "a")],
    );

    let diagnostics = DiagnosticsEngine::default()
        .with_pagerank_threshold(1.0)
        .diagnose(&graph, &scores);

    assert!(diagnostics.leaks.is_empty());
}

#[test]
fn test_leaks_only_from_top_percentile() {
    let (pages, links) = leaky_site();
    let (graph, scores) = scored(&pages, &links);

    let diagnostics = DiagnosticsEngine::default()
        .with_pagerank_threshold(0.10)
        .diagnose(&graph, &scores);

    let hub_score = scores.score(graph.node_id(&url("hub")).unwrap());
    assert_eq!(diagnostics.top_score_cutoff, hub_score);
    assert!(diagnostics.leaks.iter().all(|l| l.score >= diagnostics.top_score_cutoff));
}

#[test]
fn test_leaks_sorted_by_leaked_weight() {
    // h1 and h2 link to each other and score the same; h2 spends more on
    // unknown pages.
    let links = vec![
        body("h1", "h2"),
        body("h2", "h1"),
        footer("h1", "missing-a"),
        body("h2", "missing-b"),
        body("h2", "missing-c"),
    ];
    let (graph, scores) = scored(&ok_pages(&["h1", "h2"]), &links);

    let diagnostics = DiagnosticsEngine::default().diagnose(&graph, &scores);

    let order: Vec<(&str, f64)> = diagnostics
        .leaks
        .iter()
        .map(|l| (l.url.as_str(), l.leaked_weight))
        .collect();
    assert_eq!(order.len(), 2);
    assert_eq!(order[0].0, url("h2"));
    assert!((order[0].1 - 2.0).abs() < 1e-9);
    assert_eq!(order[1].0, url("h1"));
    assert!((order[1].1 - 0.3).abs() < 1e-9);
}

#[test]
fn test_equal_leaks_break_ties_on_score_then_url() {
    // zeta outranks alpha; both spend one footer link on an unknown page.
    let links = vec![
        body("alpha", "zeta"),
        body("zeta", "alpha"),
        body("gamma", "zeta"),
        footer("zeta", "missing-z"),
        footer("alpha", "missing-a"),
    ];
    let (graph, scores) = scored(&ok_pages(&["alpha", "gamma", "zeta"]), &links);

    let diagnostics = DiagnosticsEngine::default()
        .with_pagerank_threshold(1.0)
        .diagnose(&graph, &scores);

    let urls: Vec<&str> = diagnostics.leaks.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(urls, vec![url("zeta").as_str(), url("alpha").as_str()]);
    assert!(diagnostics.leaks[0].score > diagnostics.leaks[1].score);

    // Same weight and same score: URL ascending.
    let links = vec![
        body("b", "a"),
        body("a", "b"),
        footer("b", "missing-b"),
        footer("a", "missing-a"),
    ];
    let (graph, scores) = scored(&ok_pages(&["b", "a"]), &links);

    let diagnostics = DiagnosticsEngine::default()
        .with_pagerank_threshold(1.0)
        .diagnose(&graph, &scores);

    let urls: Vec<&str> = diagnostics.leaks.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(urls, vec![url("a").as_str(), url("b").as_str()]);
}

// ============================================================================
// Broken Link Tests
// ============================================================================

#[test]
fn test_broken_and_redirected_links() {
    let mut pages = ok_pages(&["home"]);
    pages.push(PageRecord::ok(&url("gone")).with_status(404));
    pages.push(
        PageRecord::ok(&url("moved"))
            .with_status(301)
            .with_redirect("https://example.com/New-Home/"),
    );
    pages.push(PageRecord::ok(&url("noindex")).with_indexable(false));
    let links = vec![
        body("home", "gone"),
        body("home", "moved").with_anchor("moved page"),
        body("home", "noindex"),
        body("home", "never-crawled"),
    ];
    let (graph, scores) = scored(&pages, &links);

    let broken = DiagnosticsEngine::default().diagnose(&graph, &scores).broken_links;

    assert_eq!(broken.len(), 3);
    let by_target = |name: &str| broken.iter().find(|b| b.target_url == url(name)).unwrap();

    let gone = by_target("gone");
    assert_eq!(gone.status_code, Some(404));
    assert_eq!(gone.fix, LinkFix::FixBroken);
    assert_eq!(gone.recommendation(), "Fix broken link (status: 404)");

    let moved = by_target("moved");
    assert_eq!(moved.status_code, Some(301));
    assert_eq!(moved.anchor_text, "moved page");
    assert_eq!(
        moved.fix,
        LinkFix::UpdateRedirect {
            to: "https://example.com/new-home".to_string()
        }
    );

    let unknown = by_target("never-crawled");
    assert_eq!(unknown.status_code, None);
    assert_eq!(unknown.recommendation(), "Fix broken link (status: unknown)");

    assert!(broken.iter().all(|b| b.target_url != url("noindex")));
}

#[test]
fn test_empty_graph_has_no_findings() {
    let (graph, scores) = scored(&[], &[]);
    let diagnostics = DiagnosticsEngine::default().diagnose(&graph, &scores);
    assert!(diagnostics.orphans.is_empty());
    assert!(diagnostics.leaks.is_empty());
    assert!(diagnostics.broken_links.is_empty());
}
