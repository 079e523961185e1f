//! JSON rendering of a finished crawl.

use std::path::Path;

use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::StoreError;
use crate::models::CrawlSummary;

/// Pretty JSON for stdout.
pub fn render(summary: &CrawlSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Write the summary to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_summary(summary: &CrawlSummary, path: &Path) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io { path: path.to_path_buf(), source };
    let json = render(summary).map_err(|e| io_err(e.into()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create summary dir");
            return Err(io_err(e));
        }
    }

    fs::write(path, json).await.map_err(io_err)?;
    info!("Wrote crawl summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StopReason;
    use std::path::PathBuf;

    fn summary() -> CrawlSummary {
        CrawlSummary {
            outlet: "NDTV".to_string(),
            domain: "ndtv.com".to_string(),
            output_file: PathBuf::from("./ndtv.com_data.csv"),
            articles: 5,
            written: 5,
            pages_visited: 12,
            pages_failed: 1,
            urls_rejected: 30,
            elapsed_secs: 4.5,
            stop_reason: StopReason::QuotaReached,
        }
    }

    #[test]
    fn test_render_fields() {
        let value: serde_json::Value = serde_json::from_str(&render(&summary()).unwrap()).unwrap();
        assert_eq!(value["articles"], 5);
        assert_eq!(value["stop_reason"], "quota_reached");
    }

    #[tokio::test]
    async fn test_write_summary_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/summary.json");
        write_summary(&summary(), &path).await.unwrap();
        let back: CrawlSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.domain, "ndtv.com");
    }
}
