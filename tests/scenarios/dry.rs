use pretty_assertions::assert_eq;
use tfharness::{
    run_case, run_table, DriverOp, DryCase, HarnessError, ModuleInput, PlanDocument, Scenario,
    ScenarioSettings, ScriptedDriver, ValidatePolicy, ValidateReport,
};

use super::common::{harness, module_dir};

fn network_input(dir: &std::path::Path) -> ModuleInput {
    ModuleInput::new(dir)
        .with_var("location", "northeurope")
        .with_var("resource_group_name", "rg-test")
}

#[tokio::test]
async fn empty_plan_matches_empty_want() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let h = harness(ScriptedDriver::new());

    let case = DryCase::new("dry empty", network_input(&dir));
    case.run(&h.ctx).await.expect("empty plan passes");

    assert_eq!(
        h.driver.ops(),
        vec![
            DriverOp::Init,
            DriverOp::Validate,
            DriverOp::Plan,
            DriverOp::ShowPlan
        ]
    );
    assert!(h.driver.calls().iter().all(|c| c.provider_file_present));
    assert!(!dir.join("provider.tf").exists());
}

#[tokio::test]
async fn plan_mismatch_reports_want_got_diff() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let plan = PlanDocument::with_addresses(["a.b"]);
    let driver = ScriptedDriver::new().with_plan(&dir, plan);
    let h = harness(driver);

    let case = DryCase::new("dry diff", network_input(&dir))
        .with_want(["x.y"]);
    let outcome = run_case(&h.ctx, &case).await;

    assert!(!outcome.is_passed());
    let message = outcome.message().expect("failure message");
    assert!(message.contains("dry diff = Unexpected result, (-want +got)"));
    assert!(message.contains("-   \"x.y\","));
    assert!(message.contains("+   \"a.b\","));
    assert_eq!(h.driver.count(DriverOp::Apply), 0);
    assert_eq!(h.driver.count(DriverOp::Destroy), 0);
    assert!(!dir.join("provider.tf").exists());
}

#[tokio::test]
async fn plan_order_is_significant() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "vm");
    let driver = ScriptedDriver::new()
        .with_plan(&dir, PlanDocument::with_addresses(["b.two", "a.one"]));
    let h = harness(driver);

    let case = DryCase::new("order", ModuleInput::new(&dir))
        .with_want(["a.one", "b.two"]);
    let err = case.run(&h.ctx).await.expect_err("reordered plan fails");
    assert!(matches!(err, HarnessError::PlanMismatch { .. }));
}

#[tokio::test]
async fn validate_errors_stop_before_plan() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "broken");
    let report = ValidateReport::from_json(
        r#"{"valid":false,"error_count":1,"warning_count":0,
            "diagnostics":[{"severity":"error","summary":"Missing required argument"}]}"#,
    )
    .expect("decode");
    let h = harness(ScriptedDriver::new().with_validate(report));

    let err = DryCase::new("broken", ModuleInput::new(&dir))
        .run(&h.ctx)
        .await
        .expect_err("invalid module");

    assert!(matches!(
        err,
        HarnessError::InvalidConfiguration {
            errors: 1,
            warnings: 0
        }
    ));
    assert_eq!(h.driver.count(DriverOp::Plan), 0);
    assert!(h
        .reporter
        .logs_for("broken")
        .iter()
        .any(|l| l.contains("Missing required argument")));
    assert!(!dir.join("provider.tf").exists());
}

#[tokio::test]
async fn table_cases_are_independent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ok_dir = module_dir(tmp.path(), "ok");
    let bad_dir = module_dir(tmp.path(), "bad");
    let driver = ScriptedDriver::new().failing(DriverOp::Init, &bad_dir);
    let h = harness(driver);

    let cases = vec![
        DryCase::new("bad", ModuleInput::new(&bad_dir)),
        DryCase::new("ok", ModuleInput::new(&ok_dir)),
    ];
    let report = run_table(&h.ctx, &cases, true).await;

    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 1);
    assert!(report.outcome("ok").expect("ok case").is_passed());
    assert!(!bad_dir.join("provider.tf").exists());
    assert!(!ok_dir.join("provider.tf").exists());
}

fn warnings_only() -> ValidateReport {
    ValidateReport::from_json(
        r#"{"valid":true,"error_count":0,"warning_count":1,
            "diagnostics":[{"severity":"warning","summary":"Deprecated attribute"}]}"#,
    )
    .expect("decode")
}

#[tokio::test]
async fn strict_policy_fails_on_warnings() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let h = harness(ScriptedDriver::new().with_validate(warnings_only()));

    let err = DryCase::new("strict", ModuleInput::new(&dir))
        .run(&h.ctx)
        .await
        .expect_err("warnings rejected");

    assert!(matches!(
        err,
        HarnessError::InvalidConfiguration {
            errors: 0,
            warnings: 1
        }
    ));
    assert_eq!(h.driver.count(DriverOp::Plan), 0);
    assert!(h
        .reporter
        .logs_for("strict")
        .iter()
        .any(|l| l.contains("Deprecated attribute")));
}

#[tokio::test]
async fn allow_warnings_policy_logs_and_continues() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let h = harness(ScriptedDriver::new().with_validate(warnings_only()));
    let ctx = h.ctx.clone().with_settings(ScenarioSettings {
        validate_policy: ValidatePolicy::AllowWarnings,
        ..ScenarioSettings::default()
    });

    DryCase::new("lenient", ModuleInput::new(&dir))
        .run(&ctx)
        .await
        .expect("warnings tolerated");

    assert_eq!(h.driver.count(DriverOp::ShowPlan), 1);
    assert_eq!(
        h.reporter.logs_for("lenient"),
        vec!["validate reported 1 warnings".to_string()]
    );
}

#[tokio::test]
async fn plan_out_reaches_plan_and_show() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let h = harness(ScriptedDriver::new());

    DryCase::new("plan file", ModuleInput::new(&dir))
        .with_plan_out("mockModule.tfplan")
        .run(&h.ctx)
        .await
        .expect("dry run");

    let plan_files: Vec<Option<String>> = h
        .driver
        .calls()
        .into_iter()
        .filter(|c| matches!(c.op, DriverOp::Plan | DriverOp::ShowPlan))
        .map(|c| c.plan_file)
        .collect();
    assert_eq!(
        plan_files,
        vec![
            Some("mockModule.tfplan".to_string()),
            Some("mockModule.tfplan".to_string())
        ]
    );
}

#[tokio::test]
async fn custom_provider_file_name_is_present_during_calls() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = module_dir(tmp.path(), "network");
    let driver = ScriptedDriver::new().with_provider_file("harness_provider.tf");
    let h = harness(driver);
    let ctx = h.ctx.clone().with_settings(ScenarioSettings {
        provider_file: "harness_provider.tf".to_string(),
        ..ScenarioSettings::default()
    });

    DryCase::new("renamed", ModuleInput::new(&dir))
        .run(&ctx)
        .await
        .expect("dry run");

    assert!(h.driver.calls().iter().all(|c| c.provider_file_present));
    assert!(!dir.join("harness_provider.tf").exists());
    assert!(!dir.join("provider.tf").exists());
}
