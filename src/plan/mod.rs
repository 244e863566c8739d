//! Scripted suite plans
//!
//! A plan declares modules, classes and tests with scripted behaviour so
//! the binary can exercise the engine without discovering real test code.
//!
//! ```yaml
//! modules:
//!   - name: pkg.alpha
//!     set_up: { outcome: ok, stdout: "connecting" }
//! classes:
//!   - module: pkg.alpha
//!     name: AlphaTests
//!     set_up: { outcome: fail, message: "no database" }
//! tests:
//!   - { module: pkg.alpha, class: AlphaTests, name: test_one, outcome: pass }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::is_yaml_file;
use crate::models::{ClassDef, FixtureHook, ModuleDef, Outcome, TestCase, TestNode, TestSuite};

/// Scripted result of a fixture hook
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureOutcome {
    #[default]
    Ok,
    Fail,
    Panic,
}

/// Scripted result of a test body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptedOutcome {
    #[default]
    Pass,
    Fail,
    Error,
    Skip,
    Panic,
}

/// Behaviour of one fixture hook
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureScript {
    #[serde(default)]
    pub outcome: FixtureOutcome,
    pub message: Option<String>,
    #[serde(default)]
    pub sleep_ms: u64,
    pub stdout: Option<String>,
}

impl FixtureScript {
    fn into_hook(self, label: String) -> FixtureHook {
        FixtureHook::new(move |capture| {
            if let Some(text) = &self.stdout {
                writeln!(capture.stdout, "{text}")?;
            }
            pause(self.sleep_ms);
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{label} failed"));
            match self.outcome {
                FixtureOutcome::Ok => Ok(()),
                FixtureOutcome::Fail => Err(anyhow::anyhow!(message)),
                FixtureOutcome::Panic => panic!("{message}"),
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePlan {
    pub name: String,
    pub set_up: Option<FixtureScript>,
    pub tear_down: Option<FixtureScript>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPlan {
    pub module: String,
    pub name: String,
    pub skip: Option<String>,
    pub set_up: Option<FixtureScript>,
    pub tear_down: Option<FixtureScript>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    pub module: String,
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub outcome: ScriptedOutcome,
    pub message: Option<String>,
    #[serde(default)]
    pub sleep_ms: u64,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// A complete scripted suite
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub modules: Vec<ModulePlan>,
    #[serde(default)]
    pub classes: Vec<ClassPlan>,
    #[serde(default)]
    pub tests: Vec<TestPlan>,
}

impl Plan {
    /// Load a plan from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

        let plan: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML plan: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON plan: {}", path.display()))?
        };

        plan.validate()?;
        Ok(plan)
    }

    /// Reject duplicate declarations
    pub fn validate(&self) -> Result<()> {
        let mut modules = std::collections::HashSet::new();
        for module in &self.modules {
            if !modules.insert(module.name.as_str()) {
                anyhow::bail!("Module '{}' is declared twice", module.name);
            }
        }
        let mut classes = std::collections::HashSet::new();
        for class in &self.classes {
            if !classes.insert((class.module.as_str(), class.name.as_str())) {
                anyhow::bail!("Class '{}.{}' is declared twice", class.module, class.name);
            }
        }
        let mut tests = std::collections::HashSet::new();
        for test in &self.tests {
            if !tests.insert((test.module.as_str(), test.class.as_str(), test.name.as_str())) {
                anyhow::bail!(
                    "Test '{}.{}.{}' is declared twice",
                    test.module,
                    test.class,
                    test.name
                );
            }
        }
        Ok(())
    }

    /// Build a flat suite holding every test in file order
    ///
    /// Modules and classes a test refers to without declaring them get no
    /// fixtures.
    pub fn build(&self) -> TestNode {
        let mut modules: HashMap<String, Arc<ModuleDef>> = HashMap::new();
        for plan in &self.modules {
            let mut module = ModuleDef::new(&plan.name);
            if let Some(script) = &plan.set_up {
                module = module.with_set_up(
                    script
                        .clone()
                        .into_hook(format!("setUpModule ({})", plan.name)),
                );
            }
            if let Some(script) = &plan.tear_down {
                module = module.with_tear_down(
                    script
                        .clone()
                        .into_hook(format!("tearDownModule ({})", plan.name)),
                );
            }
            modules.insert(plan.name.clone(), Arc::new(module));
        }

        let mut classes: HashMap<(String, String), Arc<ClassDef>> = HashMap::new();
        for plan in &self.classes {
            let module = module_for(&mut modules, &plan.module);
            let qualified = format!("{}.{}", plan.module, plan.name);
            let mut class = ClassDef::new(module, &plan.name);
            if let Some(script) = &plan.set_up {
                class = class.with_set_up(script.clone().into_hook(format!("setUpClass ({qualified})")));
            }
            if let Some(script) = &plan.tear_down {
                class = class
                    .with_tear_down(script.clone().into_hook(format!("tearDownClass ({qualified})")));
            }
            if let Some(reason) = &plan.skip {
                class = class.skipped(reason);
            }
            classes.insert((plan.module.clone(), plan.name.clone()), Arc::new(class));
        }

        let mut suite = TestSuite::default();
        for test in &self.tests {
            let key = (test.module.clone(), test.class.clone());
            let class = match classes.get(&key) {
                Some(class) => class.clone(),
                None => {
                    let module = module_for(&mut modules, &test.module);
                    let class = Arc::new(ClassDef::new(module, &test.class));
                    classes.insert(key, class.clone());
                    class
                }
            };
            suite.push(scripted_case(class, test.clone()));
        }

        debug!(
            "Built plan with {} modules, {} classes, {} tests",
            modules.len(),
            classes.len(),
            self.tests.len()
        );
        suite.into_node()
    }
}

fn module_for(modules: &mut HashMap<String, Arc<ModuleDef>>, name: &str) -> Arc<ModuleDef> {
    modules
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(ModuleDef::new(name)))
        .clone()
}

fn scripted_case(class: Arc<ClassDef>, plan: TestPlan) -> TestCase {
    let method = plan.name.clone();
    TestCase::new(class, method, move |capture| {
        if let Some(text) = &plan.stdout {
            let _ = writeln!(capture.stdout, "{text}");
        }
        if let Some(text) = &plan.stderr {
            let _ = writeln!(capture.stderr, "{text}");
        }
        pause(plan.sleep_ms);
        let message = plan.message.clone().unwrap_or_default();
        match plan.outcome {
            ScriptedOutcome::Pass => Outcome::Pass,
            ScriptedOutcome::Fail => Outcome::Fail(message),
            ScriptedOutcome::Error => Outcome::Error(message),
            ScriptedOutcome::Skip => Outcome::Skip(message),
            ScriptedOutcome::Panic => panic!("{message}"),
        }
    })
}

fn pause(millis: u64) {
    if millis > 0 {
        std::thread::sleep(Duration::from_millis(millis));
    }
}
