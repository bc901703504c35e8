mod common;

use assert_cmd::Command;
use common::Project;
use indoc::indoc;

fn conformist() -> Command {
    let mut cmd = Command::cargo_bin("conformist").expect("binary builds");
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn clean_tree_exits_zero() {
    let project = Project::clean();
    conformist()
        .args(["check", "--plain"])
        .arg(project.root())
        .assert()
        .code(0);
}

#[test]
fn warning_findings_exit_one() {
    let project = Project::clean().file("src/shop/cli.py", "print('hello')\n");
    conformist()
        .args(["check", "--plain"])
        .arg(project.root())
        .assert()
        .code(1);
}

#[test]
fn critical_configuration_finding_exits_two_with_structured_output() {
    let project = Project::clean().file("src/shop/settings.py", "API_TOKEN = \"tok-5f3a9c2e\"\n");
    let output = conformist()
        .args(["check", "--format", "structured"])
        .arg(project.root())
        .output()
        .expect("runs");

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["tool"], "conformist");
    assert_eq!(json["overall_status"], "critical-fail");
    assert_eq!(json["categories"]["configuration"]["counts"]["critical"], 1);
}

#[test]
fn missing_root_is_a_setup_error() {
    let project = Project::empty();
    let missing = project.root().join("nope");
    let output = conformist()
        .arg("check")
        .arg(&missing)
        .output()
        .expect("runs");

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("root path not found"));
}

#[test]
fn invalid_config_is_a_setup_error() {
    let project = Project::clean().file(".conformist.toml", "[thresholds]\nconfiguration = \"critical\"\n");
    conformist()
        .arg("check")
        .arg(project.root())
        .assert()
        .code(3);
}

#[test]
fn usage_errors_exit_three() {
    conformist()
        .args(["check", "--category", "security"])
        .assert()
        .code(3);
    conformist().arg("frobnicate").assert().code(3);
}

#[test]
fn rules_lists_the_catalog() {
    let project = Project::empty();
    let output = conformist()
        .args(["rules", "--format", "structured"])
        .arg(project.root())
        .output()
        .expect("runs");

    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let ids: Vec<&str> = json["rules"]
        .as_array()
        .expect("rules array")
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert!(ids.contains(&"imports.order"));
    assert!(ids.contains(&"configuration.hardcoded-secret"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let project = Project::empty();
    conformist().arg("init").arg(project.root()).assert().code(0);
    conformist().arg("init").arg(project.root()).assert().code(3);
    conformist()
        .args(["init", "--force"])
        .arg(project.root())
        .assert()
        .code(0);
    assert!(project.read(".conformist.toml").contains("[project]"));
}

#[test]
fn fix_mode_rewrites_imports_and_reports_the_plan() {
    let project = Project::clean().file(
        "src/shop/reporting.py",
        indoc! {r#"
            """Reporting helpers."""

            from shop.orders import Order
            import json


            def dump(order: Order) -> str:
                """Serialize an order.

                Args:
                    order: The order to serialize.

                Returns:
                    The JSON text.
                """
                return json.dumps({"sku": order.sku})
        "#},
    );

    let output = conformist()
        .args(["check", "--mode", "fix", "--format", "structured"])
        .arg(project.root())
        .output()
        .expect("runs");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["fix_plan"]["mutations"][0]["action"], "reorder-imports");
    assert_eq!(json["fix_plan"]["mutations"][0]["outcome"], "applied");
    assert!(project
        .read("src/shop/reporting.py")
        .starts_with("\"\"\"Reporting helpers.\"\"\"\n\nimport json\n\nfrom shop.orders"));
}
