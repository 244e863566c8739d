//! Test tree models
//!
//! Defines the module/class descriptors, test cases and the suite tree
//! the executors walk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::test_result::{Capture, Outcome};
use crate::error::RunError;

/// Depth of a node in a canonical tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Root = 0,
    Module = 1,
    Class = 2,
    Method = 3,
}

impl Level {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Level one step deeper, `None` below methods
    pub fn next(self) -> Option<Level> {
        match self {
            Level::Root => Some(Level::Module),
            Level::Module => Some(Level::Class),
            Level::Class => Some(Level::Method),
            Level::Method => None,
        }
    }
}

impl TryFrom<i32> for Level {
    type Error = RunError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Root),
            1 => Ok(Level::Module),
            2 => Ok(Level::Class),
            3 => Ok(Level::Method),
            level => Err(RunError::ConcurrencyLevel { level }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Root => write!(f, "root"),
            Level::Module => write!(f, "module"),
            Level::Class => write!(f, "class"),
            Level::Method => write!(f, "method"),
        }
    }
}

/// A setup or teardown callable
///
/// Hooks write any console output into the supplied [`Capture`] and report
/// failure by returning an error.
#[derive(Clone)]
pub struct FixtureHook(Arc<dyn Fn(&mut Capture) -> anyhow::Result<()> + Send + Sync>);

impl FixtureHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&mut Capture) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub(crate) fn call(&self, capture: &mut Capture) -> anyhow::Result<()> {
        (self.0)(capture)
    }
}

impl fmt::Debug for FixtureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FixtureHook")
    }
}

/// Body of a single test method
#[derive(Clone)]
pub struct CaseFn(Arc<dyn Fn(&mut Capture) -> Outcome + Send + Sync>);

impl CaseFn {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Capture) -> Outcome + Send + Sync + 'static,
    {
        Self(Arc::new(body))
    }

    pub(crate) fn call(&self, capture: &mut Capture) -> Outcome {
        (self.0)(capture)
    }
}

impl fmt::Debug for CaseFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CaseFn")
    }
}

/// A test module and its module-scoped fixtures
#[derive(Debug)]
pub struct ModuleDef {
    pub name: String,
    pub set_up_module: Option<FixtureHook>,
    pub tear_down_module: Option<FixtureHook>,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_up_module: None,
            tear_down_module: None,
        }
    }

    pub fn with_set_up(mut self, hook: FixtureHook) -> Self {
        self.set_up_module = Some(hook);
        self
    }

    pub fn with_tear_down(mut self, hook: FixtureHook) -> Self {
        self.tear_down_module = Some(hook);
        self
    }

    /// Ledger key of a module fixture, e.g. `pkg.mod.setUpModule`
    pub fn fixture_key(&self, hook_name: &str) -> String {
        format!("{}.{}", self.name, hook_name)
    }
}

/// A test class and its class-scoped fixtures
#[derive(Debug)]
pub struct ClassDef {
    pub module: Arc<ModuleDef>,
    pub name: String,
    pub set_up_class: Option<FixtureHook>,
    pub tear_down_class: Option<FixtureHook>,
    /// Skip marker with its reason
    pub skip: Option<String>,
}

impl ClassDef {
    pub fn new(module: Arc<ModuleDef>, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
            set_up_class: None,
            tear_down_class: None,
            skip: None,
        }
    }

    pub fn with_set_up(mut self, hook: FixtureHook) -> Self {
        self.set_up_class = Some(hook);
        self
    }

    pub fn with_tear_down(mut self, hook: FixtureHook) -> Self {
        self.tear_down_class = Some(hook);
        self
    }

    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// `module.Class`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module.name, self.name)
    }

    /// Ledger key of a class fixture, e.g. `pkg.mod.Class.setUpClass`
    pub fn fixture_key(&self, hook_name: &str) -> String {
        format!("{}.{}", self.qualified_name(), hook_name)
    }

    /// Same class, by identity or by qualified name
    pub fn same_as(&self, other: &ClassDef) -> bool {
        std::ptr::eq(self, other) || self.qualified_name() == other.qualified_name()
    }
}

/// One invocation of one test method
#[derive(Clone, Debug)]
pub struct TestCase {
    pub class: Arc<ClassDef>,
    pub method: String,
    pub body: CaseFn,
}

impl TestCase {
    pub fn new<F>(class: Arc<ClassDef>, method: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Capture) -> Outcome + Send + Sync + 'static,
    {
        Self {
            class,
            method: method.into(),
            body: CaseFn::new(body),
        }
    }

    pub fn module(&self) -> &Arc<ModuleDef> {
        &self.class.module
    }

    /// `module.Class.method`
    pub fn id(&self) -> String {
        format!("{}.{}", self.class.qualified_name(), self.method)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.method, self.class.qualified_name())
    }
}

/// Ordered collection of child nodes
///
/// Suites assembled by the converter carry their level; hand-built suites
/// leave it unset and have it inferred from their shape.
#[derive(Clone, Debug, Default)]
pub struct TestSuite {
    level: Option<Level>,
    children: Vec<TestNode>,
}

impl TestSuite {
    pub fn new(children: Vec<TestNode>) -> Self {
        Self {
            level: None,
            children,
        }
    }

    pub fn with_level(level: Level, children: Vec<TestNode>) -> Self {
        Self {
            level: Some(level),
            children,
        }
    }

    pub fn stamped_level(&self) -> Option<Level> {
        self.level
    }

    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    pub fn push(&mut self, node: impl Into<TestNode>) {
        self.children.push(node.into());
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of cases under this suite
    pub fn count_cases(&self) -> usize {
        self.children.iter().map(TestNode::count_cases).sum()
    }

    pub fn into_node(self) -> TestNode {
        TestNode::Suite(Arc::new(self))
    }
}

/// Either a suite or a single case
#[derive(Clone, Debug)]
pub enum TestNode {
    Suite(Arc<TestSuite>),
    Case(Arc<TestCase>),
}

impl TestNode {
    pub fn as_suite(&self) -> Option<&Arc<TestSuite>> {
        match self {
            TestNode::Suite(suite) => Some(suite),
            TestNode::Case(_) => None,
        }
    }

    pub fn as_case(&self) -> Option<&Arc<TestCase>> {
        match self {
            TestNode::Case(case) => Some(case),
            TestNode::Suite(_) => None,
        }
    }

    pub fn count_cases(&self) -> usize {
        match self {
            TestNode::Suite(suite) => suite.count_cases(),
            TestNode::Case(_) => 1,
        }
    }
}

impl From<TestSuite> for TestNode {
    fn from(suite: TestSuite) -> Self {
        TestNode::Suite(Arc::new(suite))
    }
}

impl From<TestCase> for TestNode {
    fn from(case: TestCase) -> Self {
        TestNode::Case(Arc::new(case))
    }
}
