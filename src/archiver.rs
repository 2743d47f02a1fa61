use crate::error::Error;
use crate::filter::Ignore;
use crate::naming::{self, Timestamp};
use crate::result::Result;
use crate::utils;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Files written between two finish/reopen cycles of the archive
pub const DEFAULT_FLUSH_EVERY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    Extract,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Extract => "extract",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Operation::Create),
            "extract" => Ok(Operation::Extract),
            other => Err(Error::custom(format!("Unknown operation: {}", other))),
        }
    }
}

/// Wall-clock time of the last run of each operation
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: BTreeMap<Operation, Duration>,
}

impl ExecutionLog {
    pub fn get(&self, operation: Operation) -> Option<Duration> {
        self.entries.get(&operation).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, Duration)> + '_ {
        self.entries.iter().map(|(op, d)| (*op, *d))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, operation: Operation, elapsed: Duration) {
        self.entries.insert(operation, elapsed);
    }
}

/// Answer to [`Archiver::log`]
#[derive(Debug, Clone, Copy)]
pub enum LogEntry<'a> {
    Duration(Duration),
    All(&'a ExecutionLog),
}

/// Result of a successful create or extract
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Archive written, or directory extracted into
    pub path: PathBuf,
    /// Files stored or extracted
    pub entries: usize,
    /// Files left out by the ignore predicate (always 0 for extract)
    pub skipped: usize,
    pub elapsed: Duration,
}

pub struct Archiver {
    timestamp: Timestamp,
    flush_every: usize,
    verbose: bool,
    log: ExecutionLog,
}

impl Archiver {
    /// Use `timestamp` for every name this archiver derives, or the current time
    pub fn new(timestamp: Option<Timestamp>) -> Self {
        Self {
            timestamp: timestamp.unwrap_or_else(Timestamp::now),
            flush_every: DEFAULT_FLUSH_EVERY,
            verbose: false,
            log: ExecutionLog::default(),
        }
    }

    /// Finish and reopen the archive after every `n` files; 0 never does
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn current_archive_name(&self) -> String {
        naming::archive_name(self.timestamp)
    }

    pub fn current_deploy_name(&self) -> String {
        naming::deploy_name(self.timestamp)
    }

    /// Duration of `kind` if it has run; otherwise, or without `kind`, the whole log
    pub fn log(&self, kind: Option<&str>) -> LogEntry<'_> {
        kind.and_then(|k| k.parse::<Operation>().ok())
            .and_then(|op| self.log.get(op))
            .map(LogEntry::Duration)
            .unwrap_or(LogEntry::All(&self.log))
    }

    /// [`Archiver::try_create`], reporting only whether it succeeded
    pub fn create(&mut self, source_dir: &Path, create_dir: Option<&Path>, ignore: &dyn Ignore) -> bool {
        match self.try_create(source_dir, create_dir, ignore) {
            Ok(_) => true,
            Err(e) => {
                if self.verbose {
                    println!("Create failed: {}", e);
                }
                false
            }
        }
    }

    /// Zip every file under `source_dir` not matched by `ignore` into
    /// `create_dir/source_<stamp>.zip` (working directory by default).
    ///
    /// Entries are named relative to `source_dir`. Directories are not stored.
    /// On failure no archive is left behind.
    pub fn try_create(
        &mut self,
        source_dir: &Path,
        create_dir: Option<&Path>,
        ignore: &dyn Ignore,
    ) -> Result<Outcome> {
        let start = Instant::now();

        let source_dir = resolve_source(source_dir)?;
        let archive_path = utils::resolve_in(create_dir, &self.current_archive_name())?;
        if let Some(parent) = archive_path.parent() {
            utils::ensure_dir(parent)?;
        }

        if self.verbose {
            println!(
                "Archiving {} into {}",
                source_dir.display(),
                archive_path.display()
            );
        }

        let file = File::create(&archive_path).map_err(|e| Error::io_at(e, &archive_path))?;
        let guard = PartialArchive::new(&archive_path);
        let (entries, skipped) = self.write_archive(file, &source_dir, &archive_path, ignore)?;
        guard.commit();

        let elapsed = start.elapsed();
        self.log.record(Operation::Create, elapsed);

        if self.verbose {
            println!(
                "Stored {} files ({} ignored) in {:.3}s",
                entries,
                skipped,
                elapsed.as_secs_f64()
            );
        }

        Ok(Outcome {
            path: archive_path,
            entries,
            skipped,
            elapsed,
        })
    }

    fn write_archive(
        &self,
        file: File,
        source_dir: &Path,
        archive_path: &Path,
        ignore: &dyn Ignore,
    ) -> Result<(usize, usize)> {
        let archive_real = fs::canonicalize(archive_path).map_err(|e| Error::io_at(e, archive_path))?;
        let mut zip = ZipWriter::new(file);
        let mut added = 0;
        let mut skipped = 0;

        let walker = WalkDir::new(source_dir)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let real = fs::canonicalize(path).map_err(|e| Error::io_at(e, path))?;
            if real == archive_real {
                continue;
            }

            if ignore.is_ignored(&real) {
                if self.verbose {
                    println!("Ignoring {}", real.display());
                }
                skipped += 1;
                continue;
            }

            let Some(name) = utils::entry_name(source_dir, path)? else {
                continue;
            };

            zip.start_file(name, file_options(&real)?)?;
            let mut src = File::open(path).map_err(|e| Error::io_at(e, path))?;
            io::copy(&mut src, &mut zip)?;
            added += 1;

            if self.flush_every > 0 && added % self.flush_every == 0 {
                zip = reopen(zip, archive_path)?;
                if self.verbose {
                    println!("Flushed archive after {} files", added);
                }
            }
        }

        zip.finish()?;
        Ok((added, skipped))
    }

    /// [`Archiver::try_extract`], reporting only whether it succeeded
    pub fn extract(&mut self, source_archive: &Path, destination_dir: Option<&Path>) -> bool {
        match self.try_extract(source_archive, destination_dir) {
            Ok(_) => true,
            Err(e) => {
                if self.verbose {
                    println!("Extract failed: {}", e);
                }
                false
            }
        }
    }

    /// Unpack `source_archive` into `destination_dir/deploy_<stamp>`
    /// (working directory by default), creating directories as needed.
    pub fn try_extract(&mut self, source_archive: &Path, destination_dir: Option<&Path>) -> Result<Outcome> {
        let start = Instant::now();

        let target = utils::resolve_in(destination_dir, &self.current_deploy_name())?;
        let mut archive = open_archive(source_archive)?;
        let mut entries = 0;
        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| Error::zip_at(e, source_archive))?;
            if file.is_file() {
                entries += 1;
            }
        }

        if self.verbose {
            println!(
                "Extracting {} into {}",
                source_archive.display(),
                target.display()
            );
        }

        utils::ensure_dir(&target)?;
        archive
            .extract(&target)
            .map_err(|e| extract_error(e, source_archive, &target))?;

        let elapsed = start.elapsed();
        self.log.record(Operation::Extract, elapsed);

        Ok(Outcome {
            path: target,
            entries,
            skipped: 0,
            elapsed,
        })
    }

    /// Entry names stored in `source_archive`, in archive order
    pub fn list(&self, source_archive: &Path) -> Result<Vec<String>> {
        let mut archive = open_archive(source_archive)?;
        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| Error::zip_at(e, source_archive))?;
            names.push(file.name().to_string());
        }
        Ok(names)
    }
}

/// Removes a half-written archive unless committed
struct PartialArchive<'a> {
    path: &'a Path,
    committed: bool,
}

impl<'a> PartialArchive<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialArchive<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(self.path);
        }
    }
}

fn resolve_source(source_dir: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(source_dir).map_err(|e| Error::io_at(e, source_dir))?;
    if !resolved.is_dir() {
        return Err(Error::NotADirectory(source_dir.display().to_string()));
    }
    Ok(resolved)
}

fn file_options(path: &Path) -> Result<SimpleFileOptions> {
    let metadata = fs::metadata(path).map_err(|e| Error::io_at(e, path))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(metadata.len() >= u32::MAX as u64);

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode())
    };

    Ok(options)
}

/// Finish the central directory and continue appending to the same file
fn reopen(zip: ZipWriter<File>, archive_path: &Path) -> Result<ZipWriter<File>> {
    drop(zip.finish()?);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(archive_path)
        .map_err(|e| Error::io_at(e, archive_path))?;
    Ok(ZipWriter::new_append(file)?)
}

/// Blame the target for write-side IO failures, the archive for everything else
fn extract_error(err: ZipError, source_archive: &Path, target: &Path) -> Error {
    match err {
        ZipError::Io(e) if is_write_failure(e.kind()) => Error::io_at(e, target),
        other => Error::zip_at(other, source_archive),
    }
}

fn is_write_failure(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::PermissionDenied
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::StorageFull
            | io::ErrorKind::ReadOnlyFilesystem
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::WriteZero
    )
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::io_at(e, path))?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| Error::zip_at(e, path))
}
