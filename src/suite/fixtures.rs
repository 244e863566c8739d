//! Module and class fixture invocation
//!
//! Every hook runs at most once per run: the ledger is consulted before a
//! hook is invoked and updated as soon as it returns. Hook failures are
//! recorded into the result under a synthetic identity such as
//! `setUpModule (pkg.module)` and never abort the run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::classify;
use super::ledger::FixtureLedger;
use crate::models::{ClassDef, FixtureHook, ModuleDef, TestResult, TestSuite};

pub const SET_UP_MODULE: &str = "setUpModule";
pub const TEAR_DOWN_MODULE: &str = "tearDownModule";
pub const SET_UP_CLASS: &str = "setUpClass";
pub const TEAR_DOWN_CLASS: &str = "tearDownClass";

/// Run `setUpModule` for a module-level suite
pub fn set_up_module(ledger: &FixtureLedger, suite: &TestSuite, result: &mut TestResult) {
    let Some(module) = classify::representative_module(suite) else {
        return;
    };
    let key = module.fixture_key(SET_UP_MODULE);
    if ledger.is_recorded(&key) {
        return;
    }
    if let Some(hook) = &module.set_up_module {
        invoke(ledger, &key, module_label(SET_UP_MODULE, &module), hook, result);
    }
}

/// Run `tearDownModule` unless the module's setup failed
pub fn tear_down_module(ledger: &FixtureLedger, suite: &TestSuite, result: &mut TestResult) {
    let Some(module) = classify::representative_module(suite) else {
        return;
    };
    let key = module.fixture_key(TEAR_DOWN_MODULE);
    if ledger.is_recorded(&key) || module_setup_failed(ledger, &module) {
        return;
    }
    if let Some(hook) = &module.tear_down_module {
        invoke(ledger, &key, module_label(TEAR_DOWN_MODULE, &module), hook, result);
    }
}

/// Run `setUpClass` for a class-level suite
pub fn set_up_class(ledger: &FixtureLedger, suite: &TestSuite, result: &mut TestResult) {
    let Some(class) = classify::representative_class(suite) else {
        return;
    };
    let key = class.fixture_key(SET_UP_CLASS);
    if ledger.is_recorded(&key) || module_setup_failed(ledger, &class.module) {
        return;
    }
    if class.skip.is_some() {
        return;
    }
    if let Some(hook) = &class.set_up_class {
        invoke(ledger, &key, class_label(SET_UP_CLASS, &class), hook, result);
    }
}

/// Run `tearDownClass` unless the class or module setup failed
///
/// Failing test bodies do not suppress the teardown.
pub fn tear_down_class(ledger: &FixtureLedger, suite: &TestSuite, result: &mut TestResult) {
    let Some(class) = classify::representative_class(suite) else {
        return;
    };
    let key = class.fixture_key(TEAR_DOWN_CLASS);
    if ledger.is_recorded(&key)
        || class_setup_failed(ledger, &class)
        || module_setup_failed(ledger, &class.module)
        || class.skip.is_some()
    {
        return;
    }
    if let Some(hook) = &class.tear_down_class {
        invoke(ledger, &key, class_label(TEAR_DOWN_CLASS, &class), hook, result);
    }
}

pub fn module_setup_failed(ledger: &FixtureLedger, module: &ModuleDef) -> bool {
    ledger.has_failed(&module.fixture_key(SET_UP_MODULE))
}

pub fn class_setup_failed(ledger: &FixtureLedger, class: &ClassDef) -> bool {
    ledger.has_failed(&class.fixture_key(SET_UP_CLASS))
}

pub fn module_label(hook_name: &str, module: &ModuleDef) -> String {
    format!("{} ({})", hook_name, module.name)
}

pub fn class_label(hook_name: &str, class: &ClassDef) -> String {
    format!("{} ({})", hook_name, class.qualified_name())
}

fn invoke(
    ledger: &FixtureLedger,
    key: &str,
    label: String,
    hook: &FixtureHook,
    result: &mut TestResult,
) {
    if !ledger.claim(key) {
        return;
    }
    debug!("Running {}", label);

    let (outcome, report) = {
        let mut scope = result.capture_scope(label.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook.call(scope.capture())));
        (outcome, scope.report())
    };

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(format!("{err:#}")),
        Err(payload) => Some(panic_message(payload)),
    };

    match failure {
        None => ledger.record(key, true),
        Some(message) => {
            warn!("{} failed: {}", label, message);
            ledger.record(key, false);
            result.add_error(label, format!("{message}{report}"));
        }
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Outcome, TestCase};
    use std::fmt::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_hook(counter: &Arc<AtomicUsize>, fail: bool) -> FixtureHook {
        let counter = counter.clone();
        FixtureHook::new(move |capture| {
            counter.fetch_add(1, Ordering::SeqCst);
            writeln!(capture.stdout, "hook output")?;
            if fail {
                anyhow::bail!("fixture exploded");
            }
            Ok(())
        })
    }

    fn suites(class: ClassDef) -> (TestSuite, TestSuite) {
        let class = Arc::new(class);
        let class_suite = TestSuite::new(vec![
            TestCase::new(class.clone(), "test_a", |_| Outcome::Pass).into(),
        ]);
        let module_suite = TestSuite::new(vec![class_suite.clone().into()]);
        (module_suite, class_suite)
    }

    #[test]
    fn test_module_setup_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let module = Arc::new(ModuleDef::new("pkg.m").with_set_up(counting_hook(&calls, false)));
        let (suite, _) = suites(ClassDef::new(module, "C"));
        let ledger = FixtureLedger::new();
        let mut result = TestResult::new();

        set_up_module(&ledger, &suite, &mut result);
        set_up_module(&ledger, &suite, &mut result);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ledger.has_succeeded("pkg.m.setUpModule"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_failed_module_setup_suppresses_teardown() {
        let set_up = Arc::new(AtomicUsize::new(0));
        let tear_down = Arc::new(AtomicUsize::new(0));
        let module = Arc::new(
            ModuleDef::new("pkg.m")
                .with_set_up(counting_hook(&set_up, true))
                .with_tear_down(counting_hook(&tear_down, false)),
        );
        let (suite, _) = suites(ClassDef::new(module, "C"));
        let ledger = FixtureLedger::new();
        let mut result = TestResult::buffered();

        set_up_module(&ledger, &suite, &mut result);
        tear_down_module(&ledger, &suite, &mut result);

        assert_eq!(tear_down.load(Ordering::SeqCst), 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].test_id, "setUpModule (pkg.m)");
        assert!(result.errors[0].message.starts_with("fixture exploded"));
        assert!(result.errors[0].message.contains("hook output"));
        assert_eq!(result.tests_run, 0);
    }

    #[test]
    fn test_class_setup_skipped_when_module_failed() {
        let class_calls = Arc::new(AtomicUsize::new(0));
        let module = Arc::new(ModuleDef::new("pkg.m"));
        let class = ClassDef::new(module.clone(), "C").with_set_up(counting_hook(&class_calls, false));
        let (_, suite) = suites(class);
        let ledger = FixtureLedger::new();
        ledger.claim("pkg.m.setUpModule");
        ledger.record("pkg.m.setUpModule", false);

        set_up_class(&ledger, &suite, &mut TestResult::new());
        assert_eq!(class_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_skipped_class_runs_no_fixtures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let module = Arc::new(ModuleDef::new("pkg.m"));
        let class = ClassDef::new(module.clone(), "C")
            .with_set_up(counting_hook(&calls, false))
            .with_tear_down(counting_hook(&calls, false))
            .skipped("not today");
        let (_, suite) = suites(class);
        let ledger = FixtureLedger::new();
        let mut result = TestResult::new();

        set_up_class(&ledger, &suite, &mut result);
        tear_down_class(&ledger, &suite, &mut result);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_class_setup_suppresses_teardown() {
        let set_up = Arc::new(AtomicUsize::new(0));
        let tear_down = Arc::new(AtomicUsize::new(0));
        let module = Arc::new(ModuleDef::new("pkg.m"));
        let class = ClassDef::new(module.clone(), "C")
            .with_set_up(counting_hook(&set_up, true))
            .with_tear_down(counting_hook(&tear_down, false));
        let (_, suite) = suites(class);
        let ledger = FixtureLedger::new();
        let mut result = TestResult::new();

        set_up_class(&ledger, &suite, &mut result);
        tear_down_class(&ledger, &suite, &mut result);

        assert_eq!(set_up.load(Ordering::SeqCst), 1);
        assert_eq!(tear_down.load(Ordering::SeqCst), 0);
        assert_eq!(result.errors[0].test_id, "setUpClass (pkg.m.C)");
        assert!(ledger.has_failed("pkg.m.C.setUpClass"));
    }

    #[test]
    fn test_panicking_hook_is_recorded() {
        let module = Arc::new(
            ModuleDef::new("pkg.m").with_tear_down(FixtureHook::new(|_| panic!("teardown blew up"))),
        );
        let (suite, _) = suites(ClassDef::new(module, "C"));
        let ledger = FixtureLedger::new();
        let mut result = TestResult::new();

        tear_down_module(&ledger, &suite, &mut result);

        assert!(ledger.has_failed("pkg.m.tearDownModule"));
        assert_eq!(result.errors[0].test_id, "tearDownModule (pkg.m)");
        assert_eq!(result.errors[0].message, "panicked: teardown blew up");
    }

    #[test]
    fn test_missing_hook_records_nothing() {
        let module = Arc::new(ModuleDef::new("pkg.m"));
        let (suite, _) = suites(ClassDef::new(module, "C"));
        let ledger = FixtureLedger::new();

        set_up_module(&ledger, &suite, &mut TestResult::new());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_empty_suite_is_noop() {
        let ledger = FixtureLedger::new();
        let mut result = TestResult::new();
        set_up_module(&ledger, &TestSuite::default(), &mut result);
        tear_down_class(&ledger, &TestSuite::default(), &mut result);
        assert!(ledger.is_empty());
    }
}
