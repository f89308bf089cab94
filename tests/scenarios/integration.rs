use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tfharness::{
    DriverOp, HarnessError, IntegrationCase, ModuleInput, OutputDocument, OutputWiring, Scenario,
    ScriptedDriver, VarValue,
};

use super::common::{changed, harness, module_dir};

fn network_outputs() -> OutputDocument {
    OutputDocument::from_json(r#"{"subnet_id":{"value":"s-1","type":"string"}}"#)
        .expect("decode outputs")
}

fn modules(a: &PathBuf, b: &PathBuf) -> Vec<ModuleInput> {
    vec![
        ModuleInput::new(a)
            .with_var("location", "northeurope")
            .with_var("resource_group_name", "rg-network"),
        ModuleInput::new(b)
            .with_var("location", "northeurope")
            .with_var("resource_group_name", "rg-vm")
            .with_var("subnet_id", "xxx"),
    ]
}

#[tokio::test]
async fn wires_subnet_into_second_module_and_tears_down_in_reverse() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");
    let h = harness(ScriptedDriver::new().with_outputs(&a, network_outputs()));

    IntegrationCase::new("network then vm", modules(&a, &b))
        .run(&h.ctx)
        .await
        .expect("integration passes");

    assert_eq!(
        h.driver.ops(),
        vec![
            DriverOp::Init,
            DriverOp::Apply,
            DriverOp::Output,
            DriverOp::Init,
            DriverOp::Apply,
            DriverOp::Apply,
            DriverOp::Destroy,
            DriverOp::Destroy,
        ]
    );
    assert_eq!(
        h.driver.directories_for(DriverOp::Destroy),
        vec![b.clone(), a.clone()]
    );

    let b_apply = h
        .driver
        .calls()
        .into_iter()
        .find(|c| c.op == DriverOp::Apply && c.directory == b)
        .expect("module B applied");
    assert_eq!(
        b_apply.vars.get("virtual_network_id"),
        Some(&VarValue::from("s-1"))
    );
    assert_eq!(b_apply.vars.get("subnet_id"), Some(&VarValue::from("xxx")));

    // Destroy of B sees the wired value too.
    let b_destroy = h
        .driver
        .calls()
        .into_iter()
        .find(|c| c.op == DriverOp::Destroy && c.directory == b)
        .expect("module B destroyed");
    assert!(b_destroy.vars.contains_key("virtual_network_id"));

    assert!(h.driver.calls().iter().all(|c| c.provider_file_present));
    assert!(!a.join("provider.tf").exists());
    assert!(!b.join("provider.tf").exists());
}

#[tokio::test]
async fn failure_in_first_module_still_destroys_both_in_reverse() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");
    let h = harness(ScriptedDriver::new().failing(DriverOp::Apply, &a));

    let err = IntegrationCase::new("broken network", modules(&a, &b))
        .run(&h.ctx)
        .await
        .expect_err("apply A fails");

    assert!(matches!(err, HarnessError::Exit { .. }));
    assert_eq!(h.driver.count(DriverOp::Init), 1);
    assert_eq!(
        h.driver.directories_for(DriverOp::Destroy),
        vec![b.clone(), a.clone()]
    );
    assert!(!a.join("provider.tf").exists());
    assert!(!b.join("provider.tf").exists());
}

#[tokio::test]
async fn missing_output_fails_before_second_module_runs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");
    let h = harness(ScriptedDriver::new());

    let err = IntegrationCase::new("no outputs", modules(&a, &b))
        .run(&h.ctx)
        .await
        .expect_err("subnet_id missing");

    assert!(matches!(err, HarnessError::MissingOutput { ref name, .. } if name == "subnet_id"));
    assert_eq!(h.driver.directories_for(DriverOp::Init), vec![a.clone()]);
    assert_eq!(h.driver.count(DriverOp::Destroy), 2);
}

#[tokio::test]
async fn drifting_second_module_fails_the_case() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");
    let driver = ScriptedDriver::new()
        .with_outputs(&a, network_outputs())
        .with_applies(&b, vec![changed(2), changed(1)]);
    let h = harness(driver);

    let err = IntegrationCase::new("drift", modules(&a, &b))
        .run(&h.ctx)
        .await
        .expect_err("B not idempotent");

    assert!(matches!(err, HarnessError::NotIdempotent { ref directory, .. } if *directory == b));
    assert_eq!(h.driver.count(DriverOp::Destroy), 2);
}

#[tokio::test]
async fn custom_wiring_and_invalid_targets() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");
    let outputs = OutputDocument::from_json(
        r#"{"vnet":{"value":{"id":"v-9","cidr":"10.0.0.0/16"},"type":["object",{}]}}"#,
    )
    .expect("decode");
    let h = harness(ScriptedDriver::new().with_outputs(&a, outputs));

    let pair = vec![ModuleInput::new(&a), ModuleInput::new(&b)];
    IntegrationCase::new("custom", pair.clone())
        .with_wiring(vec![OutputWiring::new(1, "vnet", "network")])
        .run(&h.ctx)
        .await
        .expect("custom wiring");
    let b_apply = h
        .driver
        .calls()
        .into_iter()
        .find(|c| c.op == DriverOp::Apply && c.directory == b)
        .expect("B applied");
    assert_eq!(
        b_apply.vars.get("network").map(VarValue::to_hcl),
        Some(r#"{"cidr" = "10.0.0.0/16", "id" = "v-9"}"#.to_string())
    );

    let h = harness(ScriptedDriver::new());
    let err = IntegrationCase::new("bad target", pair)
        .with_wiring(vec![OutputWiring::new(5, "x", "y")])
        .run(&h.ctx)
        .await
        .expect_err("target out of range");
    assert!(matches!(err, HarnessError::InvalidCase(_)));
    assert!(h.driver.calls().is_empty());
    assert!(!a.join("provider.tf").exists());
}
