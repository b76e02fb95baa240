use std::fmt;
use std::fs;
use std::hash::Hasher;
use std::path::{self, Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use siphasher::sip::SipHasher13;
use tempfile::{Builder, TempDir, TempPath};

use super::{ExtentId, ExtractionTool, ToolOutput};
use crate::{Error, Extent};

/// Identity of an OSM history archive, a hash of its resolved location.
///
/// Archives sharing a file name in different directories get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchiveId(u64);

impl ArchiveId {
    pub fn of(archive: &Path) -> Self {
        let resolved = fs::canonicalize(archive)
            .or_else(|_| path::absolute(archive))
            .unwrap_or_else(|_| archive.to_path_buf());
        let mut hasher = SipHasher13::new();
        hasher.write(resolved.as_os_str().as_encoded_bytes());
        Self(hasher.finish())
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identity of a network extract: source archive, snapshot date and extent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractKey {
    pub archive: PathBuf,
    pub archive_id: ArchiveId,
    pub date: NaiveDate,
    pub extent_id: ExtentId,
}

impl ExtractKey {
    pub fn new(archive: impl Into<PathBuf>, date: NaiveDate, extent: &Extent) -> Self {
        let archive = archive.into();
        Self {
            archive_id: ArchiveId::of(&archive),
            archive,
            date,
            extent_id: extent.id(),
        }
    }

    /// Snapshot instant, midnight UTC of the date
    pub fn timestamp(&self) -> String {
        self.date.format("%Y-%m-%dT00:00:00Z").to_string()
    }

    fn archive_stem(&self) -> Result<String, Error> {
        self.archive
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "OSM history file has no file name: {}",
                    self.archive.display()
                ))
            })
    }

    pub fn snapshot_file_name(&self) -> Result<String, Error> {
        Ok(format!(
            "{}-{}_{}.osm.pbf",
            self.archive_stem()?,
            self.archive_id,
            self.timestamp()
        ))
    }

    pub fn extract_file_name(&self) -> Result<String, Error> {
        Ok(format!(
            "{}-{}_{}_{}.osm.pbf",
            self.archive_stem()?,
            self.archive_id,
            self.timestamp(),
            self.extent_id
        ))
    }
}

/// Produces network extracts, reusing earlier results.
///
/// Temporal snapshots live in a scratch directory removed together with the
/// cache. Extracts are kept permanently, next to the archive unless a cache
/// directory is set. Every artifact is written to a temporary file first and
/// renamed into place only once the tool reported success, so an existing
/// artifact is always complete.
#[derive(Debug)]
pub struct ExtractCache<T> {
    tool: T,
    cache_dir: Option<PathBuf>,
    scratch: TempDir,
}

impl<T: ExtractionTool> ExtractCache<T> {
    pub fn new(tool: T) -> Result<Self, Error> {
        Ok(Self {
            tool,
            cache_dir: None,
            scratch: Builder::new().prefix("ttmprep-").tempdir()?,
        })
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Where the extract for `key` is (or will be) stored
    pub fn extract_path(&self, key: &ExtractKey) -> Result<PathBuf, Error> {
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => key
                .archive
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        Ok(dir.join(key.extract_file_name()?))
    }

    fn snapshot_path(&self, key: &ExtractKey) -> Result<PathBuf, Error> {
        Ok(self.scratch.path().join(key.snapshot_file_name()?))
    }

    /// Path of the extract of `archive` at `date` covering `extent`, computing
    /// it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractionFailed`] if the tool fails or writes nothing;
    /// no artifact is published in that case.
    pub fn network_extract(
        &self,
        archive: &Path,
        date: NaiveDate,
        extent: &Extent,
    ) -> Result<PathBuf, Error> {
        let key = ExtractKey::new(archive, date, extent);
        let extract = self.extract_path(&key)?;

        if extract.exists() {
            info!("Reusing network extract {}", extract.display());
            return Ok(extract);
        }
        if !archive.exists() {
            return Err(Error::MissingArtifact(archive.to_path_buf()));
        }

        let snapshot = self.snapshot(&key)?;

        let boundary = self
            .scratch
            .path()
            .join(format!("extent_{}.geojson", key.extent_id));
        fs::write(&boundary, extent.to_geojson()?.to_string())?;

        info!("Extracting extent {} from {}", key.extent_id, snapshot.display());
        let target_dir = extract.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(target_dir)?;
        let partial = partial_file(target_dir)?;
        let output = self.tool.extract(&snapshot, &boundary, &partial)?;
        publish(output, "extract", partial, &extract)?;

        info!("Network extract written to {}", extract.display());
        Ok(extract)
    }

    fn snapshot(&self, key: &ExtractKey) -> Result<PathBuf, Error> {
        let snapshot = self.snapshot_path(key)?;
        if snapshot.exists() {
            debug!("Reusing snapshot {}", snapshot.display());
            return Ok(snapshot);
        }

        info!(
            "Computing snapshot of {} at {}",
            key.archive.display(),
            key.timestamp()
        );
        let partial = partial_file(self.scratch.path())?;
        let output = self
            .tool
            .time_filter(&key.archive, &key.timestamp(), &partial)?;
        publish(output, "time-filter", partial, &snapshot)?;
        Ok(snapshot)
    }
}

fn partial_file(dir: &Path) -> Result<TempPath, Error> {
    Ok(Builder::new()
        .prefix(".partial-")
        .suffix(".osm.pbf")
        .tempfile_in(dir)?
        .into_temp_path())
}

/// Moves a finished artifact into place; on any failure the partial file is
/// removed when `partial` drops.
fn publish(output: ToolOutput, step: &'static str, partial: TempPath, target: &Path) -> Result<(), Error> {
    if !output.success {
        return Err(Error::ExtractionFailed {
            step,
            status: output.status,
            diagnostic: output.diagnostic,
        });
    }
    if fs::metadata(&partial).map_or(true, |meta| meta.len() == 0) {
        return Err(Error::ExtractionFailed {
            step,
            status: output.status,
            diagnostic: "tool reported success but wrote no output".to_string(),
        });
    }
    partial.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Osmium;
    use geo::polygon;

    fn extent() -> Extent {
        Extent::try_from(polygon![
            (x: 24.0, y: 60.0),
            (x: 25.0, y: 60.0),
            (x: 25.0, y: 61.0),
            (x: 24.0, y: 60.0),
        ])
        .unwrap()
    }

    #[test]
    fn file_names_embed_key() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        let key = ExtractKey::new("/data/finland.osh.pbf", date, &extent());
        assert_eq!(key.timestamp(), "2023-06-15T00:00:00Z");
        assert_eq!(
            key.snapshot_file_name().unwrap(),
            format!("finland.osh-{}_2023-06-15T00:00:00Z.osm.pbf", key.archive_id)
        );
        assert_eq!(
            key.extract_file_name().unwrap(),
            format!(
                "finland.osh-{}_2023-06-15T00:00:00Z_{}.osm.pbf",
                key.archive_id,
                extent().id()
            )
        );
    }

    #[test]
    fn archive_id_follows_location() {
        let dir = tempfile::tempdir().unwrap();
        for region in ["finland", "estonia"] {
            fs::create_dir(dir.path().join(region)).unwrap();
            fs::write(dir.path().join(region).join("region.osh.pbf"), region).unwrap();
        }
        let finland = dir.path().join("finland/region.osh.pbf");
        let estonia = dir.path().join("estonia/region.osh.pbf");

        assert_ne!(ArchiveId::of(&finland), ArchiveId::of(&estonia));
        assert_eq!(
            ArchiveId::of(&finland),
            ArchiveId::of(&dir.path().join("estonia/../finland/region.osh.pbf"))
        );
        assert_eq!(ArchiveId::of(&finland).to_string().len(), 16);
    }

    #[test]
    fn extracts_default_to_archive_directory() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        let key = ExtractKey::new("/data/finland.osh.pbf", date, &extent());

        let cache = ExtractCache::new(Osmium::default()).unwrap();
        assert!(cache.extract_path(&key).unwrap().starts_with("/data"));

        let cache = cache.with_cache_dir("/cache");
        assert!(cache.extract_path(&key).unwrap().starts_with("/cache"));
    }

    #[test]
    fn scratch_is_removed_on_drop() {
        let cache = ExtractCache::new(Osmium::default()).unwrap();
        let scratch = cache.scratch.path().to_path_buf();
        assert!(scratch.exists());
        drop(cache);
        assert!(!scratch.exists());
    }

    #[test]
    fn missing_archive_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExtractCache::new(Osmium::new("/nonexistent/osmium"))
            .unwrap()
            .with_cache_dir(dir.path());
        let result = cache.network_extract(
            &dir.path().join("missing.osh.pbf"),
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
            &extent(),
        );
        assert!(matches!(result, Err(Error::MissingArtifact(_))));
    }
}
