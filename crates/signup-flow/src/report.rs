//! Failure screenshots.

use crate::error::{FlowError, Result, Step};
use chrono::{DateTime, Local};
use signup_driver::Driver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<step>_<yyyymmdd_HHMMSS>.png`
#[must_use]
pub fn screenshot_file_name(step: Step, at: DateTime<Local>) -> String {
    format!("{}_{}.png", step.slug(), at.format("%Y%m%d_%H%M%S"))
}

/// Capture the viewport and write it under `dir`, named after `step`.
pub async fn save_failure_screenshot<D: Driver + ?Sized>(
    driver: &D,
    dir: &Path,
    step: Step,
) -> Result<PathBuf> {
    let png = driver.screenshot().await?;

    let path = dir.join(screenshot_file_name(step, Local::now()));
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, &png))
        .map_err(|source| FlowError::Artifact {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), bytes = png.len(), "failure screenshot saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use signup_core::FieldRole;
    use signup_driver::mock::MockDriver;
    use tempfile::TempDir;

    #[test]
    fn test_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(
            screenshot_file_name(Step::FillField(FieldRole::Email), at),
            "fill_email_20240309_070502.png"
        );
    }

    #[tokio::test]
    async fn test_writes_png_into_new_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("shots");
        let driver = MockDriver::new("http://localhost/");

        let path = save_failure_screenshot(&driver, &dir, Step::Submit).await.unwrap();

        assert!(path.starts_with(&dir));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("submit_"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
