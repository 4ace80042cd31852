use dom::{Document, NodeId};
use morph::{MorphOptions, NoHooks};
use morph_test_support::{OpRecorder, morph_outer, mount};

const PAGE: &str = r#"<section id="s"><h1>Title</h1><ul id="list"><li id="one">1</li><li>plain</li><li id="two"><input type="text" id="field" value="v"></li></ul><!-- note --><p>tail</p></section>"#;

fn elements(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.inclusive_descendants(scope)
        .filter(|node| doc.element(*node).is_some())
        .collect()
}

#[test]
fn morphing_toward_own_markup_is_churn_free() {
    let mut doc = Document::new();
    let host = mount(&mut doc, PAGE);
    let section = doc.first_child(host).expect("section");
    let before = elements(&doc, section);
    let mut recorder = OpRecorder::new();

    morph_outer(&mut doc, section, PAGE, &MorphOptions::default(), &mut recorder);

    assert_eq!(doc.inner_html(host), PAGE);
    assert_eq!(elements(&doc, section), before);
    assert!(!recorder.ops().is_empty());
    assert!(recorder.ops().iter().all(|op| op[0] == "Morphed"));
}

#[test]
fn value_sync_visits_every_node_of_an_unchanged_tree() {
    let mut doc = Document::new();
    let host = mount(&mut doc, PAGE);
    let section = doc.first_child(host).expect("section");
    let element_count = elements(&doc, section).len();
    let mut recorder = OpRecorder::new();
    let options = MorphOptions {
        sync_input_value: true,
        ..MorphOptions::default()
    };

    morph_outer(&mut doc, section, PAGE, &options, &mut recorder);

    assert_eq!(recorder.ops().len(), element_count);
    assert!(recorder.ops().iter().all(|op| op[0] == "Morphed"));
}

#[test]
fn persistent_ids_keep_their_node_instances() {
    let mut doc = Document::new();
    let host = mount(&mut doc, PAGE);
    let section = doc.first_child(host).expect("section");
    let ids = ["s", "list", "one", "two", "field"];
    let nodes: Vec<NodeId> = ids
        .iter()
        .map(|id| doc.find_element_by_id(host, id).expect("id"))
        .collect();
    let field = nodes[4];
    doc.set_value(field, "typed").expect("value");

    let after = r#"<section id="s"><div><li id="two"><input type="text" id="field" value="w"></li></div><ul id="list"><li>new</li><li id="one">1!</li></ul></section>"#;
    morph_outer(&mut doc, section, after, &MorphOptions::default(), &mut NoHooks);

    assert_eq!(doc.inner_html(host), after);
    for (id, node) in ids.iter().zip(&nodes) {
        assert_eq!(doc.find_element_by_id(host, id), Some(*node), "instance of `{id}`");
    }
    assert_eq!(doc.value(field), "typed");
}

#[test]
fn persistent_nodes_are_never_left_parked() {
    let mut doc = Document::new();
    let host = mount(
        &mut doc,
        r#"<div><p id="a">a</p><div><p id="b">b</p><p id="c">c</p></div><p id="d">d</p></div>"#,
    );
    let div = doc.first_child(host).expect("div");
    let after = r#"<div><p id="d">d</p><span><p id="c">c</p></span><p id="a">a</p><p id="b">b</p></div>"#;

    morph_outer(&mut doc, div, after, &MorphOptions::default(), &mut NoHooks);

    assert_eq!(doc.inner_html(host), after);
    for id in ["a", "b", "c", "d"] {
        let found = doc.elements_with_id(host, id);
        assert_eq!(found.len(), 1, "`{id}` placed once");
        assert!(doc.is_connected(found[0]));
    }
}

#[test]
fn duplicate_ids_still_produce_the_new_markup() {
    let mut doc = Document::new();
    let host = mount(
        &mut doc,
        r#"<div><p id="x">1</p><p id="x">2</p><b id="y">y</b></div>"#,
    );
    let div = doc.first_child(host).expect("div");
    let y = doc.find_element_by_id(host, "y").expect("y");
    let after = r#"<div><b id="y">y</b><p id="x">3</p><i id="x">4</i></div>"#;

    morph_outer(&mut doc, div, after, &MorphOptions::default(), &mut NoHooks);

    assert_eq!(doc.inner_html(host), after);
    assert_eq!(doc.find_element_by_id(host, "y"), Some(y));
}

#[test]
fn outer_morph_leaves_siblings_alone() {
    let mut doc = Document::new();
    let host = mount(
        &mut doc,
        r#"<p id="before">b</p>text<div id="target"><span>old</span></div><p>after</p>"#,
    );
    let target = doc.find_element_by_id(host, "target").expect("target");
    let siblings: Vec<NodeId> = doc.children(host).filter(|node| *node != target).collect();
    let serialized: Vec<String> = siblings.iter().map(|node| doc.outer_html(*node)).collect();
    let mut recorder = OpRecorder::new();

    let placed = morph_outer(
        &mut doc,
        target,
        r#"<p>after</p><div id="target"><span>new</span></div><p id="before">b</p>"#,
        &MorphOptions::default(),
        &mut recorder,
    );

    assert_eq!(placed.len(), 3);
    assert_eq!(placed[1], target);
    let remaining: Vec<NodeId> = doc.children(host).filter(|node| !placed.contains(node)).collect();
    assert_eq!(remaining, siblings);
    let after: Vec<String> = remaining.iter().map(|node| doc.outer_html(*node)).collect();
    assert_eq!(after, serialized);
}

#[test]
fn repeated_identical_morphs_reuse_arena_slots() {
    let markup = r#"<ul><li id="a">a</li><li>b</li></ul>"#;
    let mut doc = Document::new();
    let host = mount(&mut doc, markup);
    let live = doc.live_count();
    let options = MorphOptions::default().with_style(morph::MorphStyle::Inner);

    let sizes: Vec<usize> = (0..5)
        .map(|_| {
            morph::reconcile(&mut doc, host, morph::Content::Markup(markup), &options, &mut NoHooks)
                .expect("morph")
                .done()
                .expect("completed synchronously");
            doc.len()
        })
        .collect();

    assert_eq!(doc.inner_html(host), markup);
    assert_eq!(doc.live_count(), live);
    assert!(sizes.iter().all(|size| *size == sizes[0]), "arena grew: {sizes:?}");
}
