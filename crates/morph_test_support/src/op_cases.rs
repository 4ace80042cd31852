use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One operation-log case: morphing `before` into `after` must propose
/// exactly `ops`.
#[derive(Clone, Debug, Deserialize)]
pub struct OpCase {
    pub name: String,
    pub before: String,
    pub after: String,
    pub ops: Vec<Vec<String>>,
}

impl OpCase {
    pub fn expected_lines(&self) -> Vec<String> {
        self.ops.iter().map(|op| op.join(" | ")).collect()
    }
}

#[derive(Deserialize)]
struct OpCaseFile {
    #[serde(rename = "case")]
    cases: Vec<OpCase>,
}

pub fn load_op_cases(path: &Path) -> Vec<OpCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read op cases {path:?}: {err}"));
    let file: OpCaseFile =
        toml::from_str(&content).unwrap_or_else(|err| panic!("invalid op cases {path:?}: {err}"));
    assert!(!file.cases.is_empty(), "op case file {path:?} has no cases");
    for case in &file.cases {
        assert!(
            case.ops.iter().all(|op| matches!(op.first().map(String::as_str), Some("Morphed" | "Added" | "Removed"))),
            "unknown operation in case '{}' of {path:?}",
            case.name
        );
    }
    file.cases
}
