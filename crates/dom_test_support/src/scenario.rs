//! Mutation scenarios described in TOML fixtures.
//!
//! A scenario is a list of steps against an offscreen document. Elements are
//! referred to by names bound at creation; `root` is always bound. `commit`
//! steps split the run into batches, and a trailing batch is committed if
//! anything is pending at the end.

use dom::{OffscreenDocument, ElementStore, OperationSink, UniqueId};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCENARIO_FORMAT_V1: &str = "offscreen-scenarios-v1";

#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioFile {
    pub format: String,
    #[serde(rename = "scenario")]
    pub scenarios: Vec<Scenario>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
    /// Expected tree snapshot lines after all steps, if checked.
    #[serde(default)]
    pub expected: Option<Vec<String>>,
    /// Expected error message of the last step, for scenarios that must fail.
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Create {
        tag: String,
        name: String,
    },
    SetAttribute {
        target: String,
        key: String,
        value: String,
    },
    RemoveAttribute {
        target: String,
        key: String,
    },
    Append {
        target: String,
        children: Vec<String>,
    },
    InsertBefore {
        target: String,
        child: String,
        #[serde(default)]
        reference: Option<String>,
    },
    Remove {
        target: String,
    },
    RemoveChild {
        target: String,
        child: String,
    },
    ReplaceWith {
        target: String,
        nodes: Vec<String>,
    },
    SetStyle {
        target: String,
        property: String,
        value: String,
        #[serde(default)]
        important: bool,
    },
    RemoveStyle {
        target: String,
        property: String,
    },
    SetInnerHtml {
        target: String,
        text: String,
    },
    EnableEvent {
        target: String,
        event_type: String,
    },
    Commit,
}

/// Outcome of running a scenario: the committed batches in order, and the
/// error that stopped the run, if any.
pub struct ScenarioRun<B> {
    pub batches: Vec<B>,
    pub names: HashMap<String, UniqueId>,
    pub error: Option<String>,
}

impl Scenario {
    pub fn run<S: OperationSink, E: ElementStore>(
        &self,
        doc: &mut OffscreenDocument<S, E>,
    ) -> ScenarioRun<S::Batch> {
        let mut names = HashMap::new();
        names.insert("root".to_string(), UniqueId::ROOT);
        let mut batches = Vec::new();
        let mut error = None;
        for step in &self.steps {
            if let Err(err) = run_step(doc, step, &mut names, &mut batches) {
                error = Some(err);
                break;
            }
        }
        if doc.has_pending() {
            batches.push(doc.commit());
        }
        ScenarioRun {
            batches,
            names,
            error,
        }
    }
}

fn lookup(names: &HashMap<String, UniqueId>, name: &str) -> Result<UniqueId, String> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| format!("unbound element name {name:?}"))
}

fn lookup_all(names: &HashMap<String, UniqueId>, list: &[String]) -> Result<Vec<UniqueId>, String> {
    list.iter().map(|name| lookup(names, name)).collect()
}

fn run_step<S: OperationSink, E: ElementStore>(
    doc: &mut OffscreenDocument<S, E>,
    step: &Step,
    names: &mut HashMap<String, UniqueId>,
    batches: &mut Vec<S::Batch>,
) -> Result<(), String> {
    let result = match step {
        Step::Create { tag, name } => {
            let uid = doc.create_element(tag);
            names.insert(name.clone(), uid);
            Ok(())
        }
        Step::SetAttribute { target, key, value } => {
            doc.set_attribute(lookup(names, target)?, key, value)
        }
        Step::RemoveAttribute { target, key } => doc.remove_attribute(lookup(names, target)?, key),
        Step::Append { target, children } => {
            doc.append(lookup(names, target)?, &lookup_all(names, children)?)
        }
        Step::InsertBefore {
            target,
            child,
            reference,
        } => {
            let reference = match reference {
                Some(name) => Some(lookup(names, name)?),
                None => None,
            };
            doc.insert_before(lookup(names, target)?, lookup(names, child)?, reference)
        }
        Step::Remove { target } => doc.remove(lookup(names, target)?),
        Step::RemoveChild { target, child } => {
            doc.remove_child(lookup(names, target)?, lookup(names, child)?)
        }
        Step::ReplaceWith { target, nodes } => {
            doc.replace_with(lookup(names, target)?, &lookup_all(names, nodes)?)
        }
        Step::SetStyle {
            target,
            property,
            value,
            important,
        } => doc.set_style_property(lookup(names, target)?, property, value, *important),
        Step::RemoveStyle { target, property } => {
            doc.remove_style_property(lookup(names, target)?, property)
        }
        Step::SetInnerHtml { target, text } => doc.set_inner_html(lookup(names, target)?, text),
        Step::EnableEvent { target, event_type } => doc
            .enable_event(lookup(names, target)?, event_type)
            .map(|_| ()),
        Step::Commit => {
            batches.push(doc.commit());
            Ok(())
        }
    };
    result.map_err(|err| err.to_string())
}

pub fn scenario_fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenario TOML {path:?}: {err}"));
    let file: ScenarioFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse scenario TOML {path:?}: {err}"));
    assert_eq!(
        file.format, SCENARIO_FORMAT_V1,
        "unexpected scenario format in {path:?}"
    );
    file.scenarios
}
