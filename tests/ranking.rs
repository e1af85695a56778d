// tests/ranking.rs
//
// Ranker policy and classifier labels. Every score is on the [0,1] scale.
//
// Two rules, chosen per ranked set:
// - confidence+boost: no candidate names the site (example.org below)
// - tiered: some candidate names the site (acme.com + "ACME" below)
//
// Covered:
// - confidence+boost: 0.8 header -> 1.0, 0.8 non-header -> 0.8, header first
// - confidence+boost: 0.95 + header boost clamps to exactly 1.0
// - tiered: acme.com + "ACME" + header lands in the top band, 1.0 at full evidence
// - tiered: header+domain beats header-only regardless of discovery order
// - tiered: header-only beats domain-only, domain-only beats plain
// - tiered: evidence orders candidates inside one tier
// - stable order for equal scores
// - top(n) and the confidence filter
// - classifier decision list

use logo_scout::analyze::Tier;
use logo_scout::{CandidateClassifier, Classification, LogoCandidate, LogoRanker};

fn cand(image: &str, confidence: f32, description: &str, header: bool) -> LogoCandidate {
    LogoCandidate::new(
        format!("https://example.org/{image}"),
        "https://example.org/",
        confidence,
        description,
        header,
    )
}

#[test]
fn header_boost_orders_equal_confidence() {
    let ranker = LogoRanker::default();
    let ranked = ranker.rank(vec![
        cand("a.png", 0.8, "blue shape", false),
        cand("b.png", 0.8, "blue shape", true),
    ]);
    assert!(ranked[0].is_header());
    assert_eq!(ranked[0].rank_score(), 1.0);
    assert!((ranked[1].rank_score() - 0.8).abs() < 1e-6);
}

#[test]
fn boost_is_capped_at_one() {
    let ranker = LogoRanker::default();
    let c = cand("a.png", 0.95, "wordmark", true);
    assert_eq!(ranker.rank_score(&c), 1.0);
}

fn acme(image: &str, confidence: f32, description: &str, header: bool) -> LogoCandidate {
    LogoCandidate::new(
        format!("https://acme.com/{image}"),
        "https://acme.com/",
        confidence,
        description,
        header,
    )
}

fn order(ranked: &[LogoCandidate]) -> Vec<&str> {
    ranked
        .iter()
        .map(|c| c.image_url.trim_start_matches("https://acme.com/"))
        .collect()
}

#[test]
fn domain_match_in_header_tops_the_scale() {
    let c = acme("logo.png", 1.0, "", true).with_logo_text("ACME");
    assert!(LogoRanker::domain_match(&c));
    assert_eq!(Tier::of(&c), Tier::HeaderAndDomain);
    assert!((LogoRanker::default().rank_score(&c) - 1.0).abs() < 1e-6);

    let weak = acme("logo.png", 0.1, "", true).with_logo_text("ACME");
    let s = LogoRanker::default().rank_score(&weak);
    assert!((0.95..1.0).contains(&s), "{s}");
}

#[test]
fn header_domain_match_beats_header_badge() {
    let ranker = LogoRanker::default();
    // badge discovered first, with higher confidence
    let ranked = ranker.rank(vec![
        acme("badge.png", 0.99, "A shield badge", true),
        acme("logo.png", 0.85, "", true).with_logo_text("ACME"),
    ]);
    assert_eq!(order(&ranked), ["logo.png", "badge.png"]);
    assert!(ranked[0].rank_score() > ranked[1].rank_score());
    assert!(ranked[1].rank_score() < 0.95);
}

#[test]
fn header_only_beats_domain_only_beats_plain() {
    let ranker = LogoRanker::default();
    let ranked = ranker.rank(vec![
        acme("plain.png", 1.0, "A team photo", false),
        acme("footer.png", 0.9, "ACME", false),
        acme("header.png", 0.5, "blue shape", true),
    ]);
    assert_eq!(order(&ranked), ["header.png", "footer.png", "plain.png"]);
    let tiers: Vec<Tier> = ranked.iter().map(Tier::of).collect();
    assert_eq!(tiers, [Tier::HeaderOnly, Tier::DomainOnly, Tier::Plain]);
}

#[test]
fn evidence_orders_within_a_tier() {
    let ranker = LogoRanker::default();
    let ranked = ranker.rank(vec![
        acme("dim.png", 0.3, "ACME mark", true),
        acme("bright.png", 0.9, "ACME wordmark", true),
    ]);
    assert_eq!(order(&ranked), ["bright.png", "dim.png"]);
    assert!(ranked.iter().all(|c| Tier::of(c) == Tier::HeaderAndDomain));
    assert!(ranked.iter().all(|c| c.rank_score() >= 0.95));
}

#[test]
fn tiers_hold_across_confidence_grid() {
    let ranker = LogoRanker::default();
    let grid = [0.0, 0.2, 0.5, 0.8, 1.0];
    for hi in grid {
        for lo in grid {
            let ranked = ranker.rank(vec![
                acme("d.png", hi, "ACME", false),
                acme("h.png", lo, "grey shape", true),
            ]);
            assert_eq!(order(&ranked), ["h.png", "d.png"], "header {lo} vs domain {hi}");
        }
    }
}

#[test]
fn equal_scores_keep_discovery_order() {
    let ranker = LogoRanker::default();
    let input: Vec<LogoCandidate> = (0..6)
        .map(|i| cand(&format!("{i}.png"), 0.5, "plain", false))
        .collect();
    let ranked = ranker.rank(input);
    let order: Vec<String> = ranked.iter().map(|c| c.image_url.clone()).collect();
    let expected: Vec<String> = (0..6)
        .map(|i| format!("https://example.org/{i}.png"))
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn top_n_and_threshold_filter() {
    let ranker = LogoRanker::default();
    let all = vec![
        cand("low.png", 0.2, "x", false),
        cand("mid.png", 0.5, "x", false),
        cand("high.png", 0.9, "x", false),
    ];
    let top = ranker.top(all.clone(), 2);
    assert_eq!(top.len(), 2);
    assert!(top[0].image_url.ends_with("high.png"));
    assert!(top[1].image_url.ends_with("mid.png"));

    let kept = LogoRanker::filter_by_confidence(all.clone(), 0.5);
    assert_eq!(kept.len(), 2);
    assert_eq!(LogoRanker::filter_by_confidence(all, 0.0).len(), 3);
}

#[test]
fn rank_scores_stay_in_unit_interval() {
    let ranker = LogoRanker::default();
    for conf in [0.0, 0.3, 0.79, 0.81, 1.0, 3.0, -1.0] {
        for header in [false, true] {
            let s = ranker.rank_score(&cand("a.png", conf, "x", header));
            assert!((0.0..=1.0).contains(&s), "{conf} {header} -> {s}");
        }
    }
}

#[test]
fn classifier_decision_list() {
    let classifier = CandidateClassifier::new(Some("Acme".into()));

    let company = LogoCandidate::new("https://acme.com/l.png", "https://acme.com/", 0.9, "Acme logo", true);
    assert_eq!(classifier.classify(&company), Classification::Company);

    // same text outside the header is not enough for rule 1
    let footer = LogoCandidate::new("https://acme.com/l.png", "https://acme.com/", 0.9, "Acme logo", false);
    assert_eq!(classifier.classify(&footer), Classification::Unknown);

    let partner = LogoCandidate::new("https://acme.com/p.png", "https://acme.com/", 0.9, "Get it on Google Play", false);
    assert_eq!(classifier.classify(&partner), Classification::ThirdParty);

    let mut chrome = LogoCandidate::new("https://acme.com/i.png", "https://acme.com/", 0.4, "grey shape", false);
    chrome.traits.is_icon = true;
    assert_eq!(classifier.classify(&chrome), Classification::DesignElement);
}
