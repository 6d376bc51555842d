//! Fixture documents rendered to outlines and compared against stored
//! snapshots. Each fixture is checked both fed in one go and revealed one
//! char at a time.

use chatmark_core::StreamingProcessor;

#[test]
fn fixture_quote_with_fence() {
    assert_fixture("quote_with_fence");
}

#[test]
fn fixture_links_and_images() {
    assert_fixture("links_and_images");
}

#[test]
fn fixture_ordered_with_bullets() {
    assert_fixture("ordered_with_bullets");
}

fn assert_fixture(name: &str) {
    let md = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();

    let tree = StreamingProcessor::new().finalize(&md);

    let mut processor = StreamingProcessor::new();
    for visible in 1..=md.chars().count() {
        processor.append_text(&md, visible);
    }
    assert_eq!(processor.finalize(&md), tree, "reveal diverged for {name}");

    insta::assert_snapshot!(name, tree.outline());
}
