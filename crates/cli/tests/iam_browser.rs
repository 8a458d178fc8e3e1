use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const DOCUMENT: &str = r#"{
  "services": [
    {
      "service": "s3",
      "name": "Amazon S3",
      "actions": [
        {
          "name": "GetObject",
          "description": "Grants permission to retrieve objects from Amazon S3",
          "accessLevel": "Read",
          "conditionKeys": ["s3:ResourceTag/foo"],
          "resources": ["object"],
          "dependentActions": ["kms:Decrypt"],
          "hasResourceTag": true
        },
        {"name": "ListBucket", "accessLevel": "List", "resources": ["bucket"]},
        {"name": "PutObject", "accessLevel": "Write", "resources": ["object"]}
      ],
      "resources": [
        {"name": "object", "arnFormats": ["arn:${Partition}:s3:::${BucketName}/${ObjectName}"]}
      ]
    },
    {
      "service": "ec2",
      "name": "Amazon EC2",
      "actions": [
        {
          "name": "RunInstances",
          "accessLevel": "Write",
          "conditionKeys": ["aws:RequestTag/${TagKey}"],
          "hasRequestTag": true
        }
      ]
    }
  ],
  "totalServices": 2,
  "failedServices": [],
  "lastUpdated": "2025-06-01 12:00:00"
}"#;

fn dataset_dir() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("aws-iam-consolidated.json"), DOCUMENT).unwrap();
    dir
}

#[allow(deprecated)]
fn cli(data: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("iam-browser").expect("binary");
    cmd.env_remove("IAM_BROWSER_BASE_PATH")
        .env_remove("IAM_BROWSER_PAGE_SIZE")
        .env_remove("IAM_BROWSER_DEBOUNCE_MS")
        .arg("--data")
        .arg(data);
    cmd
}

fn search_json(data: &std::path::Path, args: &[&str]) -> Value {
    let output = cli(data)
        .arg("search")
        .args(args)
        .arg("--json")
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn ids(body: &Value) -> Vec<String> {
    body["records"]
        .as_array()
        .expect("records")
        .iter()
        .map(|record| record["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn search_predicates_match_worked_example() {
    let dir = dataset_dir();
    let data = dir.path();

    assert_eq!(
        ids(&search_json(data, &["--service", "s3", "--level", "Read"])),
        vec!["s3:GetObject"]
    );
    assert_eq!(
        ids(&search_json(data, &["--level", "Write", "--service", "ec2"])),
        vec!["ec2:RunInstances"]
    );
    assert_eq!(ids(&search_json(data, &["instances"])), vec!["ec2:RunInstances"]);
    assert_eq!(
        ids(&search_json(data, &["--resource-tag", "yes"])),
        vec!["s3:GetObject"]
    );
}

#[test]
fn search_is_case_insensitive_and_reports_window() {
    let dir = dataset_dir();
    let body = search_json(dir.path(), &["S3:", "--page-size", "2"]);
    assert_eq!(body["matched"], 3);
    assert_eq!(body["shown"], 2);
    assert_eq!(body["total"], 4);
    assert_eq!(body["hasMore"], true);
    assert_eq!(body["filter"]["search"], "S3:");
    assert_eq!(body["filter"]["accessLevel"], "All");

    let grown = search_json(dir.path(), &["s3:", "--page-size", "2", "--pages", "5"]);
    assert_eq!(grown["shown"], 3);
    assert_eq!(grown["hasMore"], false);
}

#[test]
fn show_renders_resolved_and_bare_references() {
    let dir = dataset_dir();
    cli(dir.path())
        .args(["show", "S3:getobject"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3:GetObject (Amazon S3)"))
        .stdout(predicate::str::contains(
            "arn:${Partition}:s3:::${BucketName}/${ObjectName}",
        ))
        .stdout(predicate::str::contains("kms:Decrypt (not in dataset)"));

    cli(dir.path())
        .args(["show", "s3:DeleteObject"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No action named"));
}

#[test]
fn stats_report_counts() {
    let dir = dataset_dir();
    let output = cli(dir.path())
        .args(["stats", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["services"], 2);
    assert_eq!(body["actions"], 4);
    assert_eq!(body["byAccessLevel"]["Write"], 2);
    assert_eq!(body["lastUpdated"], "2025-06-01 12:00:00");
}

#[test]
fn services_lists_action_counts() {
    let dir = dataset_dir();
    cli(dir.path())
        .arg("services")
        .assert()
        .success()
        .stdout(predicate::str::contains("Amazon EC2"))
        .stdout(predicate::str::contains("-- 2 services --"));
}

#[test]
fn browse_applies_selector_from_stdin() {
    let dir = dataset_dir();
    cli(dir.path())
        .arg("browse")
        .write_stdin("service ec2\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "IAM reference: 2 services, 4 actions, updated 2025-06-01 12:00:00, 0 failed services",
        ))
        .stdout(predicate::str::contains("> service=ec2"))
        .stdout(predicate::str::contains("[service=ec2]"))
        .stdout(predicate::str::contains("-- 1 of 1 matches"));
}

#[test]
fn missing_dataset_exits_non_zero() {
    let dir = tempdir().unwrap();
    cli(dir.path())
        .args(["search", "s3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load dataset"));

    cli(dir.path())
        .arg("browse")
        .write_stdin("quit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Cannot read"));
}

#[test]
fn invalid_page_size_is_rejected() {
    let dir = dataset_dir();
    cli(dir.path())
        .args(["search", "--page-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size must be at least 1"));
}
