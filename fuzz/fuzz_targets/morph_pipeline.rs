#![no_main]

//! Morph pipeline fuzzer.
//!
//! Input is split at the first NUL byte into old and new markup. The old
//! markup is mounted, inner-morphed toward the new one, and the result must
//! have the shape of the new markup parsed on its own (attribute order
//! aside). A second morph toward the same markup must not move any node.

use dom::{Document, NodeId};
use libfuzzer_sys::fuzz_target;
use morph::{Content, HeadOptions, HeadStyle, MorphOptions, MorphStyle};

const MAX_INPUT: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| target(data));

fn split_inputs(data: &[u8]) -> Option<(&str, &str)> {
    if data.len() > MAX_INPUT {
        return None;
    }
    let split = data.iter().position(|byte| *byte == 0)?;
    let old = std::str::from_utf8(&data[..split]).ok()?;
    let new = std::str::from_utf8(&data[split + 1..]).ok()?;
    Some((old, new))
}

/// One line per node: depth, then tag with sorted attributes or the
/// character data.
fn shape(doc: &Document, scope: NodeId) -> Vec<String> {
    doc.descendants(scope)
        .map(|node| {
            let mut depth = 0;
            let mut current = doc.parent(node);
            while let Some(parent) = current
                && parent != scope
            {
                depth += 1;
                current = doc.parent(parent);
            }
            match doc.tag_name(node) {
                Some(tag) => {
                    let mut attributes = doc.attributes(node).to_vec();
                    attributes.sort();
                    format!("{depth} <{tag}> {attributes:?}")
                }
                None => format!("{depth} {:?} {:?}", doc.category(node), doc.text(node)),
            }
        })
        .collect()
}

fn target(data: &[u8]) {
    let Some((old, new)) = split_inputs(data) else {
        return;
    };

    let mut expected_doc = Document::new();
    let Ok(expected) = morph::normalize_content(&mut expected_doc, Content::Markup(new)) else {
        return;
    };
    let expected = shape(&expected_doc, expected.container);

    let mut doc = Document::new();
    let root = doc.root();
    let host = doc.create_element("main");
    doc.append_child(root, host).expect("append host");
    if html::parse_into(&mut doc, host, old).is_err() {
        return;
    }

    let options = MorphOptions {
        head: HeadOptions {
            style: HeadStyle::Morph,
            block: false,
        },
        two_pass: true,
        ..MorphOptions::default().with_style(MorphStyle::Inner)
    };
    let placed = morph::morph(&mut doc, host, Content::Markup(new), &options)
        .expect("inner morph of a connected element")
        .done()
        .expect("no blocking head merge");
    assert_eq!(placed.len(), doc.children(host).count());
    assert_eq!(shape(&doc, host), expected);

    let before: Vec<_> = doc.descendants(host).collect();
    morph::morph(&mut doc, host, Content::Markup(new), &options)
        .expect("second morph")
        .done()
        .expect("no blocking head merge");
    assert_eq!(shape(&doc, host), expected);
    assert_eq!(doc.descendants(host).collect::<Vec<_>>(), before);
}
