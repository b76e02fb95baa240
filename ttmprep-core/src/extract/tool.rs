use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use crate::Error;

/// Structured result of one invocation of the extraction tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// Exit status, if the process exited normally
    pub status: Option<i32>,
    /// Anything the tool reported on stderr
    pub diagnostic: String,
}

impl ToolOutput {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            status: Some(0),
            diagnostic: String::new(),
        }
    }

    pub fn failed(status: Option<i32>, diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            status: output.status.code(),
            diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// External program filtering OSM data.
///
/// Both operations block until the output file is written or the program
/// gives up.
pub trait ExtractionTool {
    /// Writes `archive` as it was at `timestamp` (ISO-8601 UTC) to `output`
    fn time_filter(&self, archive: &Path, timestamp: &str, output: &Path)
    -> Result<ToolOutput, Error>;

    /// Writes the part of `snapshot` inside the `GeoJSON` polygon `boundary` to
    /// `output`, keeping ways that cross the boundary complete
    fn extract(&self, snapshot: &Path, boundary: &Path, output: &Path)
    -> Result<ToolOutput, Error>;
}

/// The `osmium` command line tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Osmium {
    binary: PathBuf,
}

impl Osmium {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<ToolOutput, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.binary);
        command.args(args);
        debug!("Running {command:?}");

        match command.output() {
            Ok(output) => Ok(output.into()),
            Err(e) => Ok(ToolOutput::failed(
                None,
                format!("could not run '{}': {e}", self.binary.display()),
            )),
        }
    }
}

impl Default for Osmium {
    fn default() -> Self {
        Self::new("osmium")
    }
}

impl ExtractionTool for Osmium {
    fn time_filter(
        &self,
        archive: &Path,
        timestamp: &str,
        output: &Path,
    ) -> Result<ToolOutput, Error> {
        self.run([
            OsStr::new("time-filter"),
            archive.as_os_str(),
            OsStr::new(timestamp),
            OsStr::new("--output"),
            output.as_os_str(),
            OsStr::new("--output-format"),
            OsStr::new("osm.pbf"),
            OsStr::new("--overwrite"),
            OsStr::new("--no-progress"),
        ])
    }

    fn extract(&self, snapshot: &Path, boundary: &Path, output: &Path) -> Result<ToolOutput, Error> {
        self.run([
            OsStr::new("extract"),
            OsStr::new("--strategy"),
            OsStr::new("complete_ways"),
            OsStr::new("--polygon"),
            boundary.as_os_str(),
            snapshot.as_os_str(),
            OsStr::new("--output"),
            output.as_os_str(),
            OsStr::new("--output-format"),
            OsStr::new("osm.pbf"),
            OsStr::new("--overwrite"),
            OsStr::new("--no-progress"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_failed_run() {
        let osmium = Osmium::new("/nonexistent/osmium");
        let output = osmium
            .time_filter(
                Path::new("in.osh.pbf"),
                "2023-06-15T00:00:00Z",
                Path::new("out.osm.pbf"),
            )
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.status, None);
        assert!(output.diagnostic.contains("/nonexistent/osmium"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_reported() {
        // `false` ignores its arguments and exits with status 1
        let output = Osmium::new("false")
            .extract(Path::new("a"), Path::new("b"), Path::new("c"))
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.status, Some(1));
    }
}
