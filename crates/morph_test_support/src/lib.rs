use dom::{Document, NodeId};

pub mod op_cases;
pub mod recorder;

pub use op_cases::{OpCase, load_op_cases};
pub use recorder::OpRecorder;

/// Parse `markup` into a fresh `<main>` connected to the document root.
pub fn mount(doc: &mut Document, markup: &str) -> NodeId {
    let root = doc.root();
    let host = doc.create_element("main");
    doc.append_child(root, host).expect("append host");
    html::parse_into(doc, host, markup).expect("parse mounted markup");
    host
}

/// Outer morph of `target` toward `markup`, expected to finish synchronously.
pub fn morph_outer(
    doc: &mut Document,
    target: NodeId,
    markup: &str,
    options: &morph::MorphOptions,
    hooks: &mut dyn morph::MorphHooks,
) -> Vec<NodeId> {
    morph::reconcile(doc, target, morph::Content::Markup(markup), options, hooks)
        .expect("morph")
        .done()
        .expect("morph completed synchronously")
}

/// Readable report of the first mismatching line between two line lists.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let mismatch = (0..max).find(|&i| expected.get(i) != actual.get(i));

    let mut out = String::new();
    use std::fmt::Write;
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected.get(line_idx).map(String::as_str).unwrap_or(missing);
            let right = actual.get(line_idx).map(String::as_str).unwrap_or(missing);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
