use std::path::PathBuf;

use anyhow::{Context, Result};
use log::debug;

use crate::collector::{Delivery, FanOutCollector, Report, Task};
use crate::error::TaskError;
use crate::schema::{Outcome, Verdict, Verification};
use crate::util::format_duration;

use super::{Algorithm, SignatureIndex, file_signature, load_index};

/// Where and how to check one signature index.
#[derive(Debug, Clone)]
pub struct VerifyJob {
    /// Directory holding the index and the files it names
    pub root: PathBuf,

    /// Index file name, relative to `root`
    pub index_file: String,

    /// Appended to every name from the index (e.g. ".gz")
    pub file_suffix: String,

    pub algorithm: Algorithm,
}

impl VerifyJob {
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    /// Path of the file an index entry refers to.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, self.file_suffix))
    }

    /// One hashing task per index entry.
    ///
    /// Hashing is blocking I/O and runs on the blocking pool, so workers
    /// really progress in parallel.
    pub fn tasks(&self, index: &SignatureIndex) -> Vec<Task<Verification>> {
        index
            .iter()
            .map(|(name, expected)| {
                let path = self.file_path(name);
                let id = path.display().to_string();
                let expected = expected.clone();
                let algorithm = self.algorithm;

                Task::new(id, async move {
                    let actual = signature_on_blocking_pool(path, algorithm).await?;
                    Ok::<_, TaskError>(Verification { expected, actual })
                })
            })
            .collect()
    }

    /// Loads the index and checks every file it names.
    ///
    /// Index problems (missing file, malformed line) abort before any
    /// hashing starts. Per-file problems end up in the report.
    pub async fn run<P>(&self, on_delivery: P) -> Result<Report>
    where
        P: FnMut(&Delivery<Verification>),
    {
        let index_path = self.index_path();
        let index = load_index(&index_path)
            .with_context(|| format!("reading index {}", index_path.display()))?;
        debug!("loaded {} signatures from {}", index.len(), index_path.display());

        let report = FanOutCollector::new("verify")
            .collect_all_with_progress(self.tasks(&index), on_delivery)
            .await;
        Ok(report)
    }
}

async fn signature_on_blocking_pool(path: PathBuf, algorithm: Algorithm) -> Result<String, TaskError> {
    tokio::task::spawn_blocking(move || file_signature(&path, algorithm))
        .await
        .map_err(|e| TaskError::Panicked(e.to_string()))?
}

/// Per-file status line, printed as outcomes arrive.
pub fn status_line(delivery: &Delivery<Verification>) -> String {
    match &delivery.outcome {
        Outcome::Failure(e) => format!("💀 error processing file {:?}: {}", delivery.id, e),
        Outcome::Success(v) if !v.is_match() => {
            format!("🛑 {:?} : file hash mismatch", delivery.id)
        }
        Outcome::Success(_) => format!("✅ {:?}", delivery.id),
    }
}

/// Final summary line.
pub fn summary_line(report: &Report) -> String {
    format!(
        "processed {} files in {}",
        report.total,
        format_duration(report.elapsed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn sha256_hex(data: &[u8]) -> String {
        Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Writes `count` files plus an index. Entries listed in `corrupt` get
    /// a different content on disk than what the index says.
    fn fixture(count: usize, corrupt: &[usize]) -> (tempfile::TempDir, VerifyJob) {
        let dir = tempfile::tempdir().unwrap();
        let mut index = String::new();

        for i in 1..=count {
            let name = format!("task#{i}.csv");
            let content = format!("row,{i}\n");
            index.push_str(&format!("{}  {}\n", sha256_hex(content.as_bytes()), name));

            let on_disk = if corrupt.contains(&i) {
                format!("tampered,{i}\n")
            } else {
                content
            };
            std::fs::write(dir.path().join(&name), on_disk).unwrap();
        }
        std::fs::write(dir.path().join("sha256sum.txt"), index).unwrap();

        let job = VerifyJob {
            root: dir.path().to_path_buf(),
            index_file: "sha256sum.txt".into(),
            file_suffix: String::new(),
            algorithm: Algorithm::Sha256,
        };
        (dir, job)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn all_files_match() {
        let (_dir, job) = fixture(4, &[]);
        let report = job.run(|_| {}).await.unwrap();

        assert!(report.success());
        assert_eq!(report.total, 4);
        assert_eq!(report.matched.len(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn third_of_five_mismatches() {
        let (_dir, job) = fixture(5, &[3]);
        let mut lines = Vec::new();
        let report = job.run(|d| lines.push(status_line(d))).await.unwrap();

        assert!(!report.success());
        assert_eq!(report.total, 5);
        assert_eq!(report.matched.len(), 4);
        assert!(report.errors.is_empty());

        let expected = job.file_path("task#3.csv").display().to_string();
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].id, expected);

        assert_eq!(lines.len(), 5);
        assert!(lines.contains(&format!("🛑 {:?} : file hash mismatch", expected)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_file_is_an_error_not_a_mismatch() {
        let (dir, job) = fixture(3, &[]);
        std::fs::remove_file(dir.path().join("task#2.csv")).unwrap();

        let report = job.run(|_| {}).await.unwrap();
        assert!(!report.success());
        assert!(report.mismatches.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0].error, TaskError::Io(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_index_aborts_before_hashing() {
        let (dir, job) = fixture(2, &[]);
        std::fs::write(dir.path().join("sha256sum.txt"), "abc def ghi\n").unwrap();

        let err = job.run(|_| {}).await.unwrap_err();
        assert!(format!("{err:#}").contains("bad line 1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn suffix_is_appended_to_index_names() {
        let (dir, mut job) = fixture(2, &[]);
        for i in 1..=2 {
            let name = format!("task#{i}.csv");
            std::fs::rename(dir.path().join(&name), dir.path().join(format!("{name}.orig"))).unwrap();
        }
        job.file_suffix = ".orig".into();

        let report = job.run(|_| {}).await.unwrap();
        assert!(report.success());
    }

    #[test]
    fn summary_mentions_count() {
        let (_dir, job) = fixture(0, &[]);
        assert_eq!(job.index_path(), job.root.join("sha256sum.txt"));

        let report = Report {
            total: 3,
            received: 3,
            matched: vec![],
            mismatches: vec![],
            errors: vec![],
            started_at: chrono::Utc::now(),
            elapsed: std::time::Duration::from_millis(1500),
        };
        assert_eq!(summary_line(&report), "processed 3 files in 1.500s");
    }
}
