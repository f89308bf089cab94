use std::path::{Path, PathBuf};
use std::sync::Arc;

use tfharness::{ApplySummary, MemoryReporter, ScenarioContext, ScriptedDriver};

pub struct Harness {
    pub driver: Arc<ScriptedDriver>,
    pub reporter: Arc<MemoryReporter>,
    pub ctx: ScenarioContext,
}

pub fn harness(driver: ScriptedDriver) -> Harness {
    let driver = Arc::new(driver);
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = ScenarioContext::new(driver.clone(), reporter.clone());
    Harness {
        driver,
        reporter,
        ctx,
    }
}

/// A module directory under `root` with a placeholder main.tf.
pub fn module_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("module dir");
    std::fs::write(dir.join("main.tf"), "# module under test\n").expect("main.tf");
    dir
}

pub fn changed(n: u64) -> ApplySummary {
    ApplySummary {
        added: 0,
        changed: n,
        destroyed: 0,
    }
}
