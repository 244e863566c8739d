//! Tree classification
//!
//! Works out the level of a node and the module or class a suite stands
//! for. A canonical tree looks like:
//!
//! ```text
//!                               root suite
//!                              /          \
//!                   suite(mod1)            suite(mod2)
//!                   /        \                   \
//!       suite(mod1.Cls1)   suite(mod1.Cls2)      ...
//!         /          \             \
//!  case(Cls1.test_a)  case(Cls1.test_b)  ...
//! ```

use std::sync::Arc;

use crate::error::RunError;
use crate::models::{ClassDef, Level, ModuleDef, TestNode, TestSuite};

/// Level returned for an empty suite
pub const UNDETERMINED: i32 = -1;

pub fn is_suite(node: &TestNode) -> bool {
    matches!(node, TestNode::Suite(_))
}

/// Level of `node`, using the stamp a converted suite carries
pub fn level(node: &TestNode) -> i32 {
    match node {
        TestNode::Case(_) => Level::Method.as_i32(),
        TestNode::Suite(suite) => match suite.stamped_level() {
            Some(level) => level.as_i32(),
            None => suite_level(suite, level),
        },
    }
}

/// Level of `node` inferred from its shape alone
pub fn structural_level(node: &TestNode) -> i32 {
    match node {
        TestNode::Case(_) => Level::Method.as_i32(),
        TestNode::Suite(suite) => suite_level(suite, structural_level),
    }
}

fn suite_level(suite: &TestSuite, child_level: fn(&TestNode) -> i32) -> i32 {
    match suite.children().first() {
        Some(first) => child_level(first) - 1,
        None => UNDETERMINED,
    }
}

/// Level of a suite as a [`Level`], `None` when undetermined
pub fn suite_level_of(suite: &TestSuite) -> Option<Level> {
    let raw = match suite.stamped_level() {
        Some(level) => return Some(level),
        None => suite_level(suite, level),
    };
    Level::try_from(raw).ok()
}

/// Module owning the first case of a module-level suite
pub fn representative_module(suite: &TestSuite) -> Option<Arc<ModuleDef>> {
    let class_suite = suite.children().first()?.as_suite()?;
    representative_class(class_suite).map(|class| class.module.clone())
}

/// Class of the first case of a class-level suite
pub fn representative_class(suite: &TestSuite) -> Option<Arc<ClassDef>> {
    let case = suite.children().first()?.as_case()?;
    Some(case.class.clone())
}

/// Verify `root` has the canonical four-level shape
///
/// An empty root is accepted and simply runs nothing.
pub fn check_well_formed(root: &TestSuite) -> Result<(), RunError> {
    if root.is_empty() {
        return Ok(());
    }
    check_suite(root, Level::Root, "root")
}

fn check_suite(suite: &TestSuite, expected: Level, path: &str) -> Result<(), RunError> {
    if let Some(stamp) = suite.stamped_level() {
        if stamp != expected {
            return Err(malformed(format!(
                "{path} is marked as {stamp} level but sits at {expected} level"
            )));
        }
    }
    if suite.is_empty() {
        return Err(malformed(format!("{path} is an empty {expected} suite")));
    }

    let child_level = expected
        .next()
        .ok_or_else(|| malformed(format!("{path} is a suite at method level")))?;

    for (index, child) in suite.children().iter().enumerate() {
        let child_path = format!("{path}[{index}]");
        match (child, child_level) {
            (TestNode::Case(_), Level::Method) => {}
            (TestNode::Suite(inner), level) if level != Level::Method => {
                check_suite(inner, level, &child_path)?
            }
            (TestNode::Case(case), level) => {
                return Err(malformed(format!(
                    "{child_path} is case {case} at {level} level"
                )))
            }
            (TestNode::Suite(_), _) => {
                return Err(malformed(format!(
                    "{child_path} is a suite nested below class level"
                )))
            }
        }
    }

    match expected {
        Level::Module => check_single_module(suite, path),
        Level::Class => check_single_class(suite, path),
        _ => Ok(()),
    }
}

fn check_single_module(suite: &TestSuite, path: &str) -> Result<(), RunError> {
    let mut modules = suite
        .children()
        .iter()
        .filter_map(TestNode::as_suite)
        .filter_map(|class_suite| representative_class(class_suite));
    let Some(first) = modules.next() else {
        return Ok(());
    };
    match modules.find(|class| class.module.name != first.module.name) {
        Some(other) => Err(malformed(format!(
            "{path} mixes modules {} and {}",
            first.module.name, other.module.name
        ))),
        None => Ok(()),
    }
}

fn check_single_class(suite: &TestSuite, path: &str) -> Result<(), RunError> {
    let mut classes = suite
        .children()
        .iter()
        .filter_map(TestNode::as_case)
        .map(|case| &case.class);
    let Some(first) = classes.next() else {
        return Ok(());
    };
    match classes.find(|class| !class.same_as(first)) {
        Some(other) => Err(malformed(format!(
            "{path} mixes classes {} and {}",
            first.qualified_name(),
            other.qualified_name()
        ))),
        None => Ok(()),
    }
}

fn malformed(message: String) -> RunError {
    RunError::MalformedSuite(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Outcome, TestCase};

    fn class(module: &str, name: &str) -> Arc<ClassDef> {
        Arc::new(ClassDef::new(Arc::new(ModuleDef::new(module)), name))
    }

    fn case(class: &Arc<ClassDef>, method: &str) -> TestNode {
        TestCase::new(class.clone(), method, |_| Outcome::Pass).into()
    }

    fn canonical() -> TestSuite {
        let a = class("pkg.a", "A");
        let b = class("pkg.a", "B");
        let module = TestSuite::new(vec![
            TestSuite::new(vec![case(&a, "t1"), case(&a, "t2")]).into(),
            TestSuite::new(vec![case(&b, "t1")]).into(),
        ]);
        TestSuite::new(vec![module.into()])
    }

    #[test]
    fn test_structural_levels() {
        let root = canonical().into_node();
        assert!(is_suite(&root));
        assert_eq!(level(&root), Level::Root.as_i32());

        let module = &root.as_suite().unwrap().children()[0];
        assert_eq!(level(module), Level::Module.as_i32());
        let class_suite = &module.as_suite().unwrap().children()[0];
        assert_eq!(level(class_suite), Level::Class.as_i32());
        let leaf = &class_suite.as_suite().unwrap().children()[0];
        assert!(!is_suite(leaf));
        assert_eq!(level(leaf), Level::Method.as_i32());
    }

    #[test]
    fn test_empty_suite_is_undetermined() {
        let empty = TestSuite::default().into_node();
        assert_eq!(level(&empty), UNDETERMINED);
        assert_eq!(suite_level_of(&TestSuite::default()), None);
    }

    #[test]
    fn test_stamp_wins_over_shape() {
        let suite = TestSuite::with_level(Level::Module, vec![]);
        assert_eq!(level(&suite.clone().into_node()), Level::Module.as_i32());
        assert_eq!(structural_level(&suite.into_node()), UNDETERMINED);
    }

    #[test]
    fn test_representatives() {
        let root = canonical();
        let module_suite = root.children()[0].as_suite().unwrap();
        assert_eq!(representative_module(module_suite).unwrap().name, "pkg.a");

        let class_suite = module_suite.children()[1].as_suite().unwrap();
        assert_eq!(representative_class(class_suite).unwrap().name, "B");

        assert!(representative_module(&TestSuite::default()).is_none());
        assert!(representative_class(&TestSuite::default()).is_none());
    }

    #[test]
    fn test_canonical_tree_is_well_formed() {
        assert!(check_well_formed(&canonical()).is_ok());
        assert!(check_well_formed(&TestSuite::default()).is_ok());
    }

    #[test]
    fn test_shallow_tree_is_rejected() {
        let a = class("m", "A");
        let root = TestSuite::new(vec![TestSuite::new(vec![case(&a, "t")]).into()]);
        let err = check_well_formed(&root).unwrap_err();
        assert!(matches!(err, RunError::MalformedSuite(_)));
    }

    #[test]
    fn test_uneven_depth_is_rejected() {
        let a = class("m", "A");
        let module = TestSuite::new(vec![
            TestSuite::new(vec![case(&a, "t1")]).into(),
            case(&a, "t2"),
        ]);
        let root = TestSuite::new(vec![module.into()]);
        assert!(check_well_formed(&root).is_err());
    }

    #[test]
    fn test_empty_inner_suite_is_rejected() {
        let root = TestSuite::new(vec![TestSuite::new(vec![]).into()]);
        assert!(check_well_formed(&root).is_err());
    }

    #[test]
    fn test_mixed_classes_are_rejected() {
        let a = class("m", "A");
        let b = class("m", "B");
        let module = TestSuite::new(vec![TestSuite::new(vec![case(&a, "t"), case(&b, "t")]).into()]);
        let root = TestSuite::new(vec![module.into()]);
        let err = check_well_formed(&root).unwrap_err();
        assert!(err.to_string().contains("mixes classes"));
    }

    #[test]
    fn test_mixed_modules_are_rejected() {
        let a = class("m1", "A");
        let b = class("m2", "B");
        let module = TestSuite::new(vec![
            TestSuite::new(vec![case(&a, "t")]).into(),
            TestSuite::new(vec![case(&b, "t")]).into(),
        ]);
        let root = TestSuite::new(vec![module.into()]);
        let err = check_well_formed(&root).unwrap_err();
        assert!(err.to_string().contains("mixes modules"));
    }

    #[test]
    fn test_wrong_stamp_is_rejected() {
        let a = class("m", "A");
        let class_suite = TestSuite::with_level(Level::Module, vec![case(&a, "t")]);
        let module = TestSuite::new(vec![class_suite.into()]);
        let root = TestSuite::new(vec![module.into()]);
        assert!(check_well_formed(&root).is_err());
    }
}
