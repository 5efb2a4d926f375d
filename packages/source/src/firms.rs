//! NASA FIRMS active fire archive retrieval.
//!
//! FIRMS publishes each rolling window as a zipped point shapefile whose
//! members share the archive's stem, e.g.
//! `J1_VIIRS_C2_South_Asia_7d.zip` holds `J1_VIIRS_C2_South_Asia_7d.shp`.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default URL of the NOAA-20 VIIRS South Asia 7-day shapefile archive.
pub const DEFAULT_FIRMS_URL: &str = "https://firms.modaps.eosdis.nasa.gov/data/active_fire/noaa-20-viirs-c2/shapes/zips/J1_VIIRS_C2_South_Asia_7d.zip";

/// Errors from retrieving the fire detection archive.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// HTTP request error (connection, timeout, body).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The URL does not name a `.zip` archive.
    #[error("Cannot derive an archive name from {url}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
    },

    /// The downloaded bytes are not a readable zip archive.
    #[error("Failed to extract archive: {0}")]
    Archive(String),

    /// The archive did not contain the expected shapefile.
    #[error("Expected shapefile not found: {path}")]
    MissingShapefile {
        /// Path where the shapefile should have been extracted.
        path: String,
    },

    /// I/O error preparing the work directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Downloads the archive at `url` and extracts it into `work_dir`.
///
/// Any previous contents of `work_dir` are removed first. Returns the
/// path of the extracted `<archive stem>.shp`.
///
/// # Errors
///
/// Returns [`RetrievalError`] if the request fails or times out, the
/// server answers with a non-success status, the archive is unreadable,
/// or the expected shapefile is not in it.
pub async fn fetch_firms_archive(
    url: &str,
    timeout: Duration,
    work_dir: &Path,
) -> Result<PathBuf, RetrievalError> {
    let stem = archive_stem(url)?;
    log::info!("Downloading from: {url}");

    let client = reqwest::Client::builder()
        .user_agent("fire-map/0.1")
        .timeout(timeout)
        .build()
        .map_err(RetrievalError::Http)?;

    let response = client.get(url).send().await.map_err(RetrievalError::Http)?;

    if !response.status().is_success() {
        return Err(RetrievalError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(RetrievalError::Http)?;

    #[allow(clippy::cast_precision_loss)]
    let mb = bytes.len() as f64 / 1_048_576.0;
    log::info!("Download complete. Size: {mb:.2} MB");

    extract_archive(&bytes, work_dir, &stem)
}

/// Extracts a zip archive held in memory and locates `<stem>.shp`.
///
/// # Errors
///
/// Returns [`RetrievalError`] if the work directory cannot be prepared,
/// the archive cannot be read, or `<stem>.shp` is absent afterwards.
pub fn extract_archive(bytes: &[u8], work_dir: &Path, stem: &str) -> Result<PathBuf, RetrievalError> {
    log::info!("Extracting shapefile...");

    if work_dir.exists() {
        std::fs::remove_dir_all(work_dir).map_err(|e| RetrievalError::Io {
            path: work_dir.display().to_string(),
            source: e,
        })?;
    }
    std::fs::create_dir_all(work_dir).map_err(|e| RetrievalError::Io {
        path: work_dir.display().to_string(),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| RetrievalError::Archive(e.to_string()))?;
    archive
        .extract(work_dir)
        .map_err(|e| RetrievalError::Archive(e.to_string()))?;

    let shapefile = work_dir.join(format!("{stem}.shp"));
    if !shapefile.exists() {
        return Err(RetrievalError::MissingShapefile {
            path: shapefile.display().to_string(),
        });
    }

    log::info!("Fire data extracted to {}", shapefile.display());
    Ok(shapefile)
}

/// Returns the file stem of the `.zip` archive named by `url`.
fn archive_stem(url: &str) -> Result<String, RetrievalError> {
    let invalid = || RetrievalError::InvalidUrl {
        url: url.to_string(),
    };

    let file = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .ok_or_else(invalid)?;

    let stem = file
        .strip_suffix(".zip")
        .or_else(|| file.strip_suffix(".ZIP"))
        .ok_or_else(invalid)?;

    if stem.is_empty() {
        return Err(invalid());
    }

    Ok(stem.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (name, data) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn stem_comes_from_last_path_segment() {
        assert_eq!(
            archive_stem(DEFAULT_FIRMS_URL).unwrap(),
            "J1_VIIRS_C2_South_Asia_7d"
        );
        assert_eq!(
            archive_stem("https://example.org/a/b/fires.zip?token=1").unwrap(),
            "fires"
        );
        assert!(archive_stem("https://example.org/fires.csv").is_err());
        assert!(archive_stem("https://example.org/.zip").is_err());
    }

    #[test]
    fn extracts_and_replaces_previous_contents() {
        let work_dir = std::env::temp_dir().join("fire_map_firms_extract_test");
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(work_dir.join("stale.shp"), b"old").unwrap();

        let bytes = zip_with(&[
            ("fires.shp", b"shp"),
            ("fires.shx", b"shx"),
            ("fires.dbf", b"dbf"),
        ]);
        let path = extract_archive(&bytes, &work_dir, "fires").unwrap();

        assert_eq!(path, work_dir.join("fires.shp"));
        assert_eq!(std::fs::read(&path).unwrap(), b"shp");
        assert!(work_dir.join("fires.dbf").exists());
        assert!(!work_dir.join("stale.shp").exists());

        std::fs::remove_dir_all(&work_dir).unwrap();
    }

    #[test]
    fn missing_expected_shapefile_is_an_error() {
        let work_dir = std::env::temp_dir().join("fire_map_firms_missing_test");
        let bytes = zip_with(&[("other.shp", b"shp")]);

        let err = extract_archive(&bytes, &work_dir, "fires").unwrap_err();
        assert!(matches!(err, RetrievalError::MissingShapefile { .. }));

        std::fs::remove_dir_all(&work_dir).unwrap();
    }

    #[test]
    fn garbage_bytes_are_an_archive_error() {
        let work_dir = std::env::temp_dir().join("fire_map_firms_garbage_test");
        let err = extract_archive(b"not a zip", &work_dir, "fires").unwrap_err();
        assert!(matches!(err, RetrievalError::Archive(_)));

        std::fs::remove_dir_all(&work_dir).unwrap();
    }
}
