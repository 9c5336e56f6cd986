use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ComparatorError;

/// One flattened cell of the comparator's pairwise score matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparatorCell {
    pub billnumber_version: String,
    pub billnumber_version_to: String,
    pub score: f64,
    pub score_to: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(rename = "ComparedDocs")]
    compared_docs: String,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "ScoreOther")]
    score_other: f64,
    #[serde(rename = "Explanation")]
    explanation: String,
}

impl RawCell {
    fn into_cell(self) -> Result<Option<ComparatorCell>, ComparatorError> {
        let mut parts = self.compared_docs.splitn(2, '-');
        let (Some(bill), Some(bill_to)) = (parts.next(), parts.next()) else {
            return Err(ComparatorError::MalformedComparedDocs(self.compared_docs));
        };
        if bill.is_empty() || bill_to.is_empty() {
            return Ok(None);
        }

        let reasons = self
            .explanation
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Some(ComparatorCell {
            billnumber_version: bill.to_string(),
            billnumber_version_to: bill_to.to_string(),
            score: self.score,
            score_to: self.score_other,
            reasons,
        }))
    }
}

/// Invokes an external pairwise comparator binary and parses its
/// delimiter-framed JSON matrix output.
pub struct ComparatorBridge {
    binary_path: Option<PathBuf>,
    timeout: Duration,
}

impl ComparatorBridge {
    #[must_use]
    pub fn new(binary_path: Option<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            binary_path,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Runs the comparator against every path in `bill_paths` and returns
    /// the cells of its score matrix whose `ComparedDocs` starts with
    /// `query_bill`; every other row of the matrix is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ComparatorError::NotConfigured`] if no binary path was
    /// supplied, [`ComparatorError::Timeout`] if the subprocess does not
    /// finish within the configured deadline, and the remaining variants
    /// for spawn, exit-status, and output-parsing failures.
    pub async fn compare_matrix(
        &self,
        query_bill: &str,
        bill_paths: &[String],
    ) -> Result<Vec<ComparatorCell>, ComparatorError> {
        let Some(path) = &self.binary_path else {
            return Err(ComparatorError::NotConfigured);
        };

        let joined = bill_paths.join(",");
        let mut command = Command::new(path);
        command
            .arg("-abspaths")
            .arg(&joined)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| ComparatorError::Spawn {
            path: path.clone(),
            source,
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ComparatorError::Spawn {
                    path: path.clone(),
                    source,
                })
            }
            Err(_elapsed) => {
                return Err(ComparatorError::Timeout {
                    path: path.clone(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(ComparatorError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout.len(), "comparator produced output");
        let cells = parse_matrix(&stdout)?;
        Ok(cells
            .into_iter()
            .filter(|cell| cell.billnumber_version == query_bill)
            .collect())
    }
}

fn parse_matrix(stdout: &str) -> Result<Vec<ComparatorCell>, ComparatorError> {
    let segments: Vec<&str> = stdout.split(":compareMatrix:").collect();
    if segments.len() < 2 {
        warn!("comparator output had no :compareMatrix: delimiter, treating as no matches");
        return Ok(Vec::new());
    }
    if segments.len() > 2 {
        warn!("comparator output contained the delimiter more than once, using the final segment");
    }
    let json_part = segments.last().expect("checked len >= 2").trim();
    if json_part.is_empty() {
        warn!("comparator output had a blank segment after the :compareMatrix: delimiter");
        return Ok(Vec::new());
    }

    let raw: Vec<Vec<RawCell>> = serde_json::from_str(json_part)?;
    let mut cells = Vec::new();
    for row in raw {
        for raw_cell in row {
            if let Some(cell) = raw_cell.into_cell()? {
                cells.push(cell);
            }
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    fn script_with_output(stdout: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "cat <<'EOF'\n{stdout}\nEOF").unwrap();
        let path = file.into_temp_path();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn parse_matrix_flattens_rows_and_filters_blank_docs() {
        let stdout = r#"some log noise
:compareMatrix:[[{"ComparedDocs":"117hr200ih-117hr200ih","Score":1.0,"ScoreOther":1.0,"Explanation":"identical"},{"ComparedDocs":"117hr200ih-117hr201ih","Score":0.63,"ScoreOther":0.79,"Explanation":"incorporates, shares title"}],[{"ComparedDocs":"-","Score":0.0,"ScoreOther":0.0,"Explanation":""}]]"#;
        let cells = parse_matrix(stdout).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].billnumber_version, "117hr200ih");
        assert_eq!(cells[1].billnumber_version_to, "117hr201ih");
        assert_eq!(cells[1].reasons, vec!["incorporates", "shares title"]);
    }

    #[test]
    fn parse_matrix_missing_delimiter_returns_empty() {
        let cells = parse_matrix("no delimiter here").unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn parse_matrix_blank_segment_returns_empty() {
        let cells = parse_matrix(":compareMatrix:   ").unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn parse_matrix_uses_final_segment_when_duplicated() {
        let stdout = ":compareMatrix:garbage:compareMatrix:[]";
        let cells = parse_matrix(stdout).unwrap();
        assert!(cells.is_empty());
    }

    #[tokio::test]
    async fn not_configured_without_binary_path() {
        let bridge = ComparatorBridge::new(None, 5);
        let err = bridge
            .compare_matrix("117hr200ih", &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ComparatorError::NotConfigured));
    }

    #[tokio::test]
    async fn compare_matrix_parses_script_output_for_the_query_bill_only() {
        let script = script_with_output(
            r#":compareMatrix:[[{"ComparedDocs":"117hr200ih-117hr201ih","Score":0.5,"ScoreOther":0.5,"Explanation":"similar"},{"ComparedDocs":"117hr201ih-117hr200ih","Score":0.5,"ScoreOther":0.5,"Explanation":"similar"}]]"#,
        );
        let bridge = ComparatorBridge::new(Some(script.to_path_buf()), 5);
        let cells = bridge
            .compare_matrix(
                "117hr200ih",
                &["/tmp/a.xml".to_string(), "/tmp/b.xml".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].billnumber_version, "117hr200ih");
        assert_eq!(cells[0].score, 0.5);
    }

    #[tokio::test]
    async fn compare_matrix_times_out_on_slow_binary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "sleep 5").unwrap();
        let path = file.into_temp_path();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();

        let bridge = ComparatorBridge::new(Some(path.to_path_buf()), 1);
        let err = bridge
            .compare_matrix("117hr200ih", &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ComparatorError::Timeout { .. }));
    }
}
