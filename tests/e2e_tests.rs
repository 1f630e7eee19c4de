//! End-to-end tests for the tfau CLI
//!
//! These tests verify:
//! - Dry-run mode leaves files unchanged
//! - CLI produces correct JSON output schema
//! - Exit codes are correct for various scenarios

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const MAIN_TF: &str = r#"terraform {
  required_version = ">= 1.5.0"

  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "5.0.0"
    }
  }
}

module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "5.0.0"
}
"#;

fn tfau() -> Command {
    let mut cmd = Command::cargo_bin("tfau").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Create a test directory with a single main.tf
fn create_test_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("main.tf"), MAIN_TF).unwrap();
    temp_dir
}

/// Mock every backend the fixture needs on one server
fn mock_backends(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("GET", "/v1/modules/terraform-aws-modules/vpc/aws/versions")
            .with_status(200)
            .with_body(r#"{"modules":[{"versions":[{"version":"5.0.0"},{"version":"5.8.1"}]}]}"#)
            .create(),
        server
            .mock("GET", "/v1/providers/hashicorp/aws/versions")
            .with_status(200)
            .with_body(r#"{"versions":[{"version":"5.31.0"}]}"#)
            .create(),
        server
            .mock("GET", "/terraform/index.json")
            .with_status(200)
            .with_body(r#"{"versions":{"1.9.8":{"version":"1.9.8"}}}"#)
            .create(),
    ]
}

fn backend_args(url: &str) -> [String; 4] {
    [
        "--registry-url".to_string(),
        url.to_string(),
        "--releases-url".to_string(),
        url.to_string(),
    ]
}

mod cli_surface {
    use super::*;

    #[test]
    fn test_help() {
        tfau()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--upgrades"))
            .stdout(predicate::str::contains("--dry-run"));
    }

    #[test]
    fn test_version() {
        tfau()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_invalid_upgrades_is_fatal() {
        let temp_dir = create_test_project();
        tfau()
            .args(["--upgrades", "modules,widgets"])
            .arg(temp_dir.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn test_terraform_version_requires_terraform_kind() {
        let temp_dir = create_test_project();
        tfau()
            .args(["--upgrades", "modules", "--terraform-version", "1.9.0"])
            .arg(temp_dir.path())
            .assert()
            .code(1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("main.tf")).unwrap(),
            MAIN_TF
        );
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        tfau()
            .arg(temp_dir.path().join("does-not-exist"))
            .assert()
            .code(1)
            .stdout(predicate::str::contains("File discovery error"));
    }
}

mod dry_run_tests {
    use super::*;

    /// Dry-run reports updates without touching the file
    #[test]
    fn test_dry_run_leaves_files_unchanged() {
        let mut server = mockito::Server::new();
        let _mocks = mock_backends(&mut server);
        let temp_dir = create_test_project();

        tfau()
            .args(backend_args(&server.url()))
            .arg("--dry-run")
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("(dry-run)"))
            .stdout(predicate::str::contains("5.0.0 -> 5.8.1 [minor]"))
            .stdout(predicate::str::contains("3 declaration(s) updated"));

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("main.tf")).unwrap(),
            MAIN_TF
        );
    }
}

mod json_output_tests {
    use super::*;

    #[test]
    fn test_json_output_schema() {
        let mut server = mockito::Server::new();
        let _mocks = mock_backends(&mut server);
        let temp_dir = create_test_project();

        let output = tfau()
            .args(backend_args(&server.url()))
            .args(["--json", "--dry-run"])
            .arg(temp_dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["summary"]["updates"], 3);
        assert_eq!(json["summary"]["files_modified"], 1);

        let updates = json["files"][0]["updates"].as_array().unwrap();
        let kinds: Vec<_> = updates.iter().map(|u| u["kind"].as_str().unwrap()).collect();
        assert!(kinds.contains(&"module"));
        assert!(kinds.contains(&"provider"));
        assert!(kinds.contains(&"terraform"));
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn test_updates_in_place_with_fixed_terraform_version() {
        let mut server = mockito::Server::new();
        let _mocks = mock_backends(&mut server);
        let temp_dir = create_test_project();

        tfau()
            .args(backend_args(&server.url()))
            .args(["--terraform-version", "~> 1.10"])
            .arg(temp_dir.path())
            .assert()
            .success();

        let content = fs::read_to_string(temp_dir.path().join("main.tf")).unwrap();
        assert_eq!(
            content,
            MAIN_TF
                .replace("\">= 1.5.0\"", "\"~> 1.10\"")
                .replacen("\"5.0.0\"", "\"5.31.0\"", 1)
                .replacen("\"5.0.0\"", "\"5.8.1\"", 1)
        );
    }

    #[test]
    fn test_config_file_limits_kinds() {
        let mut server = mockito::Server::new();
        let _mocks = mock_backends(&mut server);
        let temp_dir = create_test_project();
        fs::write(
            temp_dir.path().join("tfau.toml"),
            "upgrades = [\"providers\"]\n",
        )
        .unwrap();

        tfau()
            .args(backend_args(&server.url()))
            .arg(temp_dir.path())
            .assert()
            .success();

        let content = fs::read_to_string(temp_dir.path().join("main.tf")).unwrap();
        assert!(content.contains("version = \"5.31.0\""));
        assert!(content.contains("required_version = \">= 1.5.0\""));
        assert!(content.contains("version = \"5.0.0\""));
    }

    #[test]
    fn test_broken_file_is_partial_failure() {
        let mut server = mockito::Server::new();
        let _mocks = mock_backends(&mut server);
        let temp_dir = create_test_project();
        fs::write(temp_dir.path().join("broken.tf"), "module \"x\" {\n").unwrap();

        tfau()
            .args(backend_args(&server.url()))
            .arg(temp_dir.path())
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Skipping"));

        // The valid file is still updated
        let content = fs::read_to_string(temp_dir.path().join("main.tf")).unwrap();
        assert!(content.contains("version = \"5.8.1\""));
    }
}
