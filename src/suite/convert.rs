//! Conversion of arbitrary nested suites into canonical form
//!
//! Cases are grouped by module, then by class, both in order of first
//! appearance. This is the only place the tree is reshaped.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::models::{Level, TestCase, TestNode, TestSuite};

#[derive(Default)]
struct ModuleGroup {
    classes: Vec<Vec<Arc<TestCase>>>,
    class_index: HashMap<String, usize>,
}

/// Regroup every case under `test` into a root/module/class/case tree
pub fn convert(test: &TestNode) -> TestSuite {
    let mut modules: Vec<ModuleGroup> = Vec::new();
    let mut module_index: HashMap<String, usize> = HashMap::new();
    group_test_cases(test, &mut modules, &mut module_index);

    let module_suites = modules
        .into_iter()
        .map(|group| {
            let class_suites = group
                .classes
                .into_iter()
                .map(|cases| {
                    let cases = cases.into_iter().map(TestNode::Case).collect();
                    TestSuite::with_level(Level::Class, cases).into_node()
                })
                .collect();
            TestSuite::with_level(Level::Module, class_suites).into_node()
        })
        .collect();

    let suite = TestSuite::with_level(Level::Root, module_suites);
    debug!(
        "Converted {} cases into {} module suites",
        suite.count_cases(),
        suite.len()
    );
    suite
}

fn group_test_cases(
    test: &TestNode,
    modules: &mut Vec<ModuleGroup>,
    module_index: &mut HashMap<String, usize>,
) {
    match test {
        TestNode::Suite(suite) => {
            for child in suite.children() {
                group_test_cases(child, modules, module_index);
            }
        }
        TestNode::Case(case) => {
            let module_slot = *module_index
                .entry(case.module().name.clone())
                .or_insert_with(|| {
                    modules.push(ModuleGroup::default());
                    modules.len() - 1
                });
            let group = &mut modules[module_slot];
            let qualified = case.class.qualified_name();
            let class_slot = match group.class_index.get(&qualified) {
                Some(&slot) => slot,
                None => {
                    group.classes.push(Vec::new());
                    let slot = group.classes.len() - 1;
                    group.class_index.insert(qualified, slot);
                    slot
                }
            };
            group.classes[class_slot].push(case.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassDef, ModuleDef, Outcome};
    use crate::suite::classify;

    fn class(module: &Arc<ModuleDef>, name: &str) -> Arc<ClassDef> {
        Arc::new(ClassDef::new(module.clone(), name))
    }

    fn case(class: &Arc<ClassDef>, method: &str) -> TestNode {
        TestCase::new(class.clone(), method, |_| Outcome::Pass).into()
    }

    fn ids(suite: &TestSuite) -> Vec<Vec<Vec<String>>> {
        suite
            .children()
            .iter()
            .map(|module| {
                module
                    .as_suite()
                    .unwrap()
                    .children()
                    .iter()
                    .map(|class| {
                        class
                            .as_suite()
                            .unwrap()
                            .children()
                            .iter()
                            .map(|case| case.as_case().unwrap().id())
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let m1 = Arc::new(ModuleDef::new("m1"));
        let m2 = Arc::new(ModuleDef::new("m2"));
        let a = class(&m1, "A");
        let b = class(&m1, "B");
        let c = class(&m2, "C");

        let raw = TestSuite::new(vec![
            case(&b, "t1"),
            TestSuite::new(vec![
                case(&c, "t1"),
                TestSuite::new(vec![case(&a, "t1"), case(&b, "t2")]).into(),
            ])
            .into(),
            case(&a, "t2"),
        ])
        .into_node();

        let converted = convert(&raw);
        assert_eq!(
            ids(&converted),
            vec![
                vec![
                    vec!["m1.B.t1".to_string(), "m1.B.t2".to_string()],
                    vec!["m1.A.t1".to_string(), "m1.A.t2".to_string()],
                ],
                vec![vec!["m2.C.t1".to_string()]],
            ]
        );
        assert!(classify::check_well_formed(&converted).is_ok());
        assert_eq!(converted.stamped_level(), Some(Level::Root));
    }

    #[test]
    fn test_single_case_is_wrapped() {
        let m = Arc::new(ModuleDef::new("m"));
        let converted = convert(&case(&class(&m, "A"), "t"));
        let node = converted.clone().into_node();
        assert_eq!(classify::level(&node), Level::Root.as_i32());
        assert_eq!(converted.count_cases(), 1);
        assert!(classify::check_well_formed(&converted).is_ok());
    }

    #[test]
    fn test_empty_input() {
        let converted = convert(&TestSuite::default().into_node());
        assert!(converted.is_empty());
        assert!(classify::check_well_formed(&converted).is_ok());
    }
}
