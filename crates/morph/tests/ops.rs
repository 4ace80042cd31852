use dom::Document;
use morph::MorphOptions;
use morph_test_support::{OpRecorder, diff_lines, load_op_cases, morph_outer, mount};
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../morph_test_support/fixtures/ops.toml")
}

#[test]
fn operation_logs_match_fixtures() {
    let cases = load_op_cases(&fixture_path());
    let mut failures = Vec::new();

    for case in &cases {
        let mut doc = Document::new();
        let host = mount(&mut doc, &case.before);
        let target = doc.first_child(host).expect("mounted element");
        let mut recorder = OpRecorder::new();
        morph_outer(&mut doc, target, &case.after, &MorphOptions::default(), &mut recorder);

        let expected = case.expected_lines();
        let actual = recorder.lines();
        if expected != actual {
            failures.push(format!("case '{}':\n{}", case.name, diff_lines(&expected, &actual)));
        }
        assert_eq!(doc.inner_html(host), case.after, "final markup of '{}'", case.name);
    }

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn parked_node_keeps_its_identity() {
    let mut doc = Document::new();
    let host = mount(&mut doc, r#"<ul><li id="a">A</li><li>B</li><li>C</li></ul>"#);
    let ul = doc.first_child(host).expect("ul");
    let a = doc.find_element_by_id(host, "a").expect("a");

    let placed = morph_outer(
        &mut doc,
        ul,
        r#"<ul><li>C</li><li id="a">A</li><li>B</li></ul>"#,
        &MorphOptions::default(),
        &mut morph::NoHooks,
    );

    assert_eq!(placed, vec![ul]);
    let items: Vec<_> = doc.element_children(ul).collect();
    assert_eq!(items[1], a);
    assert!(doc.is_connected(a));
}
