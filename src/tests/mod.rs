use crate::classify::{groups_for_label, matches_token, Group, Taxonomy};
use crate::dataset::parse_dataset;
use crate::grouper::{flatten, group_entries};
use crate::image::parse_image_set;
use crate::runner::{EntrySource, Options, Runner};
use crate::viewer::{Highlight, ViewerState};

const SCENARIO: &str = r#"[
    {"藥物名稱":"A","分級":"第一級"},
    {"藥物名稱":"B","分級":"第二級"},
    {"藥物名稱":"C","分級":""}
]"#;

fn bucket_names(taxonomy: Taxonomy, group: Group) -> Vec<String> {
    let entries = parse_dataset(SCENARIO).unwrap();
    group_entries(taxonomy, &entries)
        .into_iter()
        .find(|b| b.group == group)
        .map(|b| b.entries.into_iter().map(|e| e.name).collect())
        .unwrap_or_default()
}

#[test]
fn graded_scenario_buckets() {
    assert_eq!(bucket_names(Taxonomy::Graded, Group::Level1), vec!["A"]);
    assert_eq!(bucket_names(Taxonomy::Graded, Group::Level2), vec!["B"]);
    assert_eq!(bucket_names(Taxonomy::Graded, Group::Unclassified), vec!["C"]);
    assert!(bucket_names(Taxonomy::Graded, Group::Level3).is_empty());
}

#[test]
fn merged_scenario_drops_unlabelled_entry() {
    assert_eq!(bucket_names(Taxonomy::Merged, Group::Level1), vec!["A"]);
    assert_eq!(bucket_names(Taxonomy::Merged, Group::Level2), vec!["B"]);
    let entries = parse_dataset(SCENARIO).unwrap();
    let buckets = group_entries(Taxonomy::Merged, &entries);
    assert!(flatten(&buckets).iter().all(|e| e.name != "C"));
}

#[test]
fn merged_compound_label_serves_level_two_and_three_filters() {
    assert!(matches_token(Taxonomy::Merged, "第二至三級", "2"));
    assert!(matches_token(Taxonomy::Merged, "第二至三級", "3"));
    assert!(groups_for_label(Taxonomy::Merged, "第二至三級").contains(&Group::Level2To3));
}

#[test]
fn duplicate_image_urls_collapse_to_one_pair() {
    let set = parse_image_set("http://a.png;;http://a.png", "");
    let plain = set.candidates.iter().filter(|c| c.url == "http://a.png").count();
    let secure = set.candidates.iter().filter(|c| c.url == "https://a.png").count();
    assert_eq!((plain, secure), (1, 1));
    assert_eq!(set.candidates.len(), 2);
}

#[test]
fn highlighting_does_not_depend_on_card_position() {
    // Same-name entries sort as ties; highlight must still follow each entry.
    let entries = parse_dataset(
        r#"[
            {"藥物名稱":"X","分級":"第四級"},
            {"藥物名稱":"X","分級":"第一級"},
            {"藥物名稱":"X","分級":""}
        ]"#,
    )
    .unwrap();
    let mut state = ViewerState::new(Taxonomy::Merged, &entries);
    state.set_filter(crate::classify::FilterLevel::parse("4"));
    for section in state.sections() {
        for card in section.cards {
            let expected = if card.entry.id == 0 {
                Highlight::Highlighted
            } else {
                Highlight::Muted
            };
            assert_eq!(card.highlight, expected);
        }
    }
}

#[tokio::test]
async fn runner_renders_every_format_from_inline_entries() {
    let entries = parse_dataset(SCENARIO).unwrap();
    let runner = Runner::new(Options {
        source: EntrySource::Inline(entries),
        ..Options::default()
    });
    let view = runner.run().await.unwrap();
    let record = view.record();
    assert_eq!(record.sections.len(), 3);

    let html = String::from_utf8(crate::output::render_html(&record)).unwrap();
    assert!(html.contains(r#"id="sec-未分級""#));
    let json: serde_json::Value =
        serde_json::from_slice(&crate::output::render_json(&record)).unwrap();
    assert_eq!(json["sections"][0]["cards"][0]["name"], "A");
}
