//! The real CLI driver against a shell script standing in for terraform.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tfharness::{
    DryCase, HarnessError, IntegrationCase, MemoryReporter, ModuleInput, Scenario,
    ScenarioContext, TerraformCli, UnitCase,
};

use super::common::module_dir;

// Every call is appended to `.calls` in the module directory. Commands that
// need the provider block refuse to run without it, like terraform would.
const STUB: &str = r#"#!/bin/sh
echo "$*" >> .calls
require_provider() {
  if [ ! -f provider.tf ]; then
    echo "Error: Missing required provider configuration" >&2
    exit 1
  fi
}
case "$1" in
  init)
    require_provider
    echo "Terraform has been successfully initialized!"
    ;;
  validate)
    echo '{"format_version":"1.0","valid":true,"error_count":0,"warning_count":0,"diagnostics":[]}'
    ;;
  plan)
    require_provider
    for arg in "$@"; do
      case "$arg" in -out=*) : > "${arg#-out=}" ;; esac
    done
    echo "Plan: 2 to add, 0 to change, 0 to destroy."
    ;;
  show)
    cat <<'JSON'
{"format_version":"1.2","terraform_version":"1.6.0","resource_changes":[
 {"address":"azurerm_resource_group.rg","type":"azurerm_resource_group","name":"rg",
  "change":{"actions":["create"]}},
 {"address":"azurerm_virtual_network.vnet","type":"azurerm_virtual_network","name":"vnet",
  "change":{"actions":["create"]}}
]}
JSON
    ;;
  apply)
    require_provider
    if [ -f .applied ]; then
      echo "No changes. Your infrastructure matches the configuration."
      echo "Apply complete! Resources: 0 added, 0 changed, 0 destroyed."
    else
      : > .applied
      echo "Apply complete! Resources: 2 added, 0 changed, 0 destroyed."
    fi
    ;;
  output)
    echo '{"subnet_id":{"sensitive":false,"type":"string","value":"s-1"}}'
    ;;
  destroy)
    rm -f .applied
    echo "Destroy complete! Resources: 2 destroyed."
    ;;
  *)
    echo "unknown command $1" >&2
    exit 1
    ;;
esac
"#;

fn write_stub(root: &Path) -> PathBuf {
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).expect("bin dir");
    let path = bin.join("terraform");
    std::fs::write(&path, STUB).expect("write stub");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join(".calls"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn context(exe: PathBuf) -> (ScenarioContext, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = ScenarioContext::new(Arc::new(TerraformCli::new(exe)), reporter.clone());
    (ctx, reporter)
}

#[tokio::test]
async fn dry_run_through_cli() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (ctx, _) = context(write_stub(tmp.path()));
    let dir = module_dir(tmp.path(), "network");

    let input = ModuleInput::new(&dir).with_var("location", "northeurope");
    DryCase::new("cli dry", input)
        .with_want(["azurerm_resource_group.rg", "azurerm_virtual_network.vnet"])
        .run(&ctx)
        .await
        .expect("dry run passes");

    let log = calls(&dir);
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], "init -input=false -no-color -reconfigure -upgrade");
    assert_eq!(
        log[2],
        "plan -input=false -no-color -out=tfharness.tfplan -var=location=northeurope"
    );
    assert_eq!(log[3], "show -json -no-color tfharness.tfplan");
    assert!(!dir.join("provider.tf").exists());
}

#[tokio::test]
async fn unit_case_through_cli() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (ctx, reporter) = context(write_stub(tmp.path()));
    let dir = module_dir(tmp.path(), "network");

    let input = ModuleInput::new(&dir).with_reconfigure(false);
    UnitCase::new("cli unit", input)
        .run(&ctx)
        .await
        .expect("idempotent");

    let log = calls(&dir);
    assert_eq!(log[0], "init -input=false -no-color -upgrade");
    assert_eq!(log.iter().filter(|l| l.starts_with("apply")).count(), 2);
    assert!(log
        .last()
        .expect("calls")
        .starts_with("destroy -input=false"));
    assert!(reporter
        .logs_for("cli unit")
        .iter()
        .any(|l| l == "apply: 2 added, 0 changed, 0 destroyed"));
    assert!(!dir.join("provider.tf").exists());
}

#[tokio::test]
async fn integration_through_cli_passes_wired_var() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (ctx, _) = context(write_stub(tmp.path()));
    let a = module_dir(tmp.path(), "network");
    let b = module_dir(tmp.path(), "vm");

    IntegrationCase::new(
        "cli integration",
        vec![
            ModuleInput::new(&a),
            ModuleInput::new(&b).with_var("subnet_id", "xxx"),
        ],
    )
    .run(&ctx)
    .await
    .expect("integration passes");

    let b_log = calls(&b);
    let apply = b_log
        .iter()
        .find(|l| l.starts_with("apply"))
        .expect("B applied");
    assert!(apply.contains("-var=subnet_id=xxx"));
    assert!(apply.contains("-var=virtual_network_id=s-1"));
    assert!(calls(&a).iter().any(|l| l == "output -json -no-color"));
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (ctx, _) = context(tmp.path().join("no-such-terraform"));
    let dir = module_dir(tmp.path(), "network");

    let err = UnitCase::new("no binary", ModuleInput::new(&dir))
        .run(&ctx)
        .await
        .expect_err("spawn fails");
    assert!(matches!(err, HarnessError::Spawn { .. }));
    assert!(!dir.join("provider.tf").exists());
}
