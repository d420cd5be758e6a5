//! Session scripts.
//!
//! A script is a JSON array of commands replayed in order. Objects are
//! addressed by the order in which `add` commands created them:
//!
//! ```json
//! [
//!   { "op": "add", "object": { "kind": "rect", "left": 0, "top": 0, "text": "risk" } },
//!   { "op": "modify", "index": 0, "properties": { "left": 40 } },
//!   { "op": "wait", "ms": 1200 },
//!   { "op": "run", "rule": "smart-template-suggestions" }
//! ]
//! ```

use crate::error::SessionError;
use canvasflow_core::{Result, RuleId};
use canvasflow_scene::{ObjectBlueprint, ObjectKind, ObjectPatch};
use canvasflow_workflow::WorkflowRule;
use serde::Deserialize;
use std::path::Path;

/// One step of a session script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Command {
    /// Registers an extra rule.
    Rule { rule: WorkflowRule },
    /// Adds an object as an operator would.
    Add { object: ObjectBlueprint },
    /// Changes an object as an operator would.
    Modify { index: usize, properties: ObjectPatch },
    /// Selects an object.
    Select { index: usize },
    /// Replaces an object's text.
    EditText { index: usize, text: String },
    /// Announces that the canvas finished loading.
    Load,
    /// Runs a rule manually.
    Run { rule: RuleId },
    /// Lets time pass.
    Wait { ms: u64 },
}

/// Parses a script from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid command list.
pub fn parse(json: &str) -> Result<Vec<Command>, SessionError> {
    let commands = serde_json::from_str(json).map_err(|e| SessionError::ParseScript {
        details: e.to_string(),
    })?;
    Ok(commands)
}

/// Reads and parses a script file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<Command>, SessionError> {
    let json = std::fs::read_to_string(path).map_err(|e| SessionError::ReadScript {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    parse(&json)
}

/// The risk-matrix demo: a 3x3 grid of risk cells, added one by one.
#[must_use]
pub fn demo() -> Vec<Command> {
    let levels = ["low", "medium", "high"];
    let mut commands = vec![Command::Load];
    for (row, likelihood) in levels.into_iter().rev().enumerate() {
        for (column, impact) in levels.into_iter().enumerate() {
            commands.push(Command::Add {
                object: ObjectBlueprint::new(ObjectKind::Rect)
                    .at(column as f64 * 110.0, row as f64 * 110.0)
                    .with_text(format!("{likelihood} likelihood, {impact} impact risk")),
            });
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_every_command() {
        let commands = parse(
            r##"[
                {"op": "add", "object": {"kind": "rect", "left": 10, "top": 20}},
                {"op": "modify", "index": 0, "properties": {"fill": "#fff"}},
                {"op": "select", "index": 0},
                {"op": "edit-text", "index": 0, "text": "compliance policy"},
                {"op": "load"},
                {"op": "run", "rule": "smart-compliance-checklist"},
                {"op": "wait", "ms": 1000}
            ]"##,
        )
        .expect("parse");

        assert_eq!(commands.len(), 7);
        assert_eq!(
            commands[1],
            Command::Modify {
                index: 0,
                properties: ObjectPatch::fill("#fff"),
            }
        );
        assert_eq!(commands[6], Command::Wait { ms: 1000 });
    }

    #[test]
    fn rejects_unknown_command() {
        let err = parse(r#"[{"op": "explode"}]"#).expect_err("invalid");
        assert!(matches!(
            err.current_context(),
            SessionError::ParseScript { .. }
        ));
    }

    #[test]
    fn loads_script_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"op": "load"}}]"#).expect("write");

        let commands = load(file.path()).expect("load");
        assert_eq!(commands, vec![Command::Load]);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load(&dir.path().join("missing.json")).expect_err("missing");
        assert!(matches!(
            err.current_context(),
            SessionError::ReadScript { .. }
        ));
    }

    #[test]
    fn demo_adds_nine_risk_cells() {
        let commands = demo();
        let adds = commands
            .iter()
            .filter(|command| matches!(command, Command::Add { .. }))
            .count();
        assert_eq!(adds, 9);
    }
}
