//! Integration tests for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run the modlint binary
fn modlint(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_modlint"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute modlint")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

const CONFIG_VALUES: &str = r#"
type: object
properties:
  logLevel:
    type: string
    default: Info
  https:
    type: object
    default: {}
    properties:
      mode:
        type: string
        enum: [Disabled, CustomCertificate]
"#;

const DEPLOYMENT: &str = r#"kind: Deployment
metadata:
  name: {{ Chart.Name }}
  namespace: {{ Release.Namespace }}
spec:
  level: {{ Values.certManager.logLevel | quote }}
{%- if Values.certManager.https.mode == "CustomCertificate" %}
  secret: {{ Values.certManager.https.customCertificate.secretName }}
{%- endif %}
"#;

/// A module whose `CustomCertificate` branch references an undefined value
fn module_fixture(dir: &TempDir) -> PathBuf {
    let root = dir.path().join("030-cert-manager");
    write(&root, "Chart.yaml", "name: cert-manager\nversion: 0.1.0\n");
    write(&root, "openapi/config-values.yaml", CONFIG_VALUES);
    write(&root, "templates/deployment.yaml", DEPLOYMENT);
    root
}

mod lint_command {
    use super::*;

    #[test]
    fn test_lint_reports_failing_branch() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["lint", root.to_str().unwrap()]);

        assert_eq!(output.status.code(), Some(1));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("values document #0: 1 manifest(s)"));
        assert!(stdout.contains("deployment.yaml"));
        assert!(stdout.contains("CustomCertificate"));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Linting failed with 1 error(s) in 1 values document(s)"));
    }

    #[test]
    fn test_lint_lenient_passes() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["lint", root.to_str().unwrap(), "--lenient"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Linting passed for 2 values document(s)"));
    }

    #[test]
    fn test_lint_config_file_sets_lenient() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);
        write(&root, ".modlint.yaml", "strict: false\n");

        let output = modlint(&["lint", root.to_str().unwrap()]);
        assert!(output.status.success());

        let output = modlint(&["lint", root.to_str().unwrap(), "--strict"]);
        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_lint_document_limit() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["lint", root.to_str().unwrap(), "--max-documents", "1"]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("more than 1 value documents"));
    }

    #[test]
    fn test_lint_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("broken");
        write(&root, "templates/cm.yaml", "data: [{{ Release.Name }}\n");

        let output = modlint(&["lint", root.to_str().unwrap()]);

        assert_eq!(output.status.code(), Some(1));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("not valid YAML"));
    }

    #[test]
    fn test_lint_missing_module() {
        let output = modlint(&["lint", "/nonexistent/module"]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Module not found"));
    }
}

mod values_command {
    use super::*;

    #[test]
    fn test_values_json() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["values", root.to_str().unwrap(), "--json"]);

        assert!(output.status.success());
        let documents: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        assert_eq!(
            documents,
            serde_json::json!([
                {"https": {"mode": "Disabled"}, "logLevel": "Info"},
                {"https": {"mode": "CustomCertificate"}, "logLevel": "Info"},
            ])
        );
    }

    #[test]
    fn test_values_yaml_stream() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["values", root.to_str().unwrap()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.matches("---").count(), 2);
        assert!(stdout.contains("mode: Disabled"));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_schema_is_locked_down() {
        let dir = TempDir::new().unwrap();
        let root = module_fixture(&dir);

        let output = modlint(&["schema", root.to_str().unwrap()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("additionalProperties: false"));
        assert!(stdout.contains("logLevel"));
    }
}
