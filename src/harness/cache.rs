//! Distributed cache localization for test runs
//!
//! Everything is already on the local disk in a unit test, so "localizing"
//! only means making archives usable: plain files are handed to the job as
//! they are, archives are extracted into a temporary directory that is
//! removed again when the run ends.

use std::path::{Path, PathBuf};

use crate::common::config::CacheConfig;
use crate::common::{Error, Result};

/// A file or archive registered for the distributed cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    File(PathBuf),
    Archive(PathBuf),
}

/// Local paths of localized cache entries, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalPaths {
    pub files: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
}

impl LocalPaths {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.archives.is_empty()
    }
}

/// Makes cache entries available locally and releases them afterwards
///
/// `cleanup` must release everything acquired by every earlier `localize`
/// and leave the localizer ready to localize again. Prefer
/// [`LocalizedCache`] over calling the pair by hand.
pub trait ResourceLocalizer {
    fn localize(&mut self, entries: &[CacheEntry]) -> Result<LocalPaths>;

    fn cleanup(&mut self) -> Result<()>;
}

/// Localized cache entries, released on drop
pub struct LocalizedCache<'a> {
    localizer: &'a mut dyn ResourceLocalizer,
    paths: LocalPaths,
    released: bool,
}

impl<'a> LocalizedCache<'a> {
    /// Localize `entries`, cleaning up again if any of them fails
    pub fn acquire(
        localizer: &'a mut dyn ResourceLocalizer,
        entries: &[CacheEntry],
    ) -> Result<Self> {
        match localizer.localize(entries) {
            Ok(paths) => Ok(Self {
                localizer,
                paths,
                released: false,
            }),
            Err(e) => {
                if let Err(cleanup_err) = localizer.cleanup() {
                    tracing::warn!("Cache cleanup after failed localization: {}", cleanup_err);
                }
                Err(e)
            }
        }
    }

    pub fn paths(&self) -> &LocalPaths {
        &self.paths
    }

    /// Release now, surfacing any cleanup error
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.localizer.cleanup()
    }
}

impl Drop for LocalizedCache<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.localizer.cleanup() {
                tracing::warn!("Cache cleanup failed: {}", e);
            }
        }
    }
}

/// Supported archive formats, by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveKind {
    fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".zip") || name.ends_with(".jar") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Localizer that extracts archives into a temporary directory
///
/// Files pass through unchanged. Each archive is extracted into
/// `<tmp>/<archive file name>/`. Localizing again before `cleanup` returns
/// the paths from the first call.
#[derive(Debug, Default)]
pub struct TempDirLocalizer {
    temp_root: Option<PathBuf>,
    keep_extracted: bool,
    dir: Option<tempfile::TempDir>,
    localized: Option<LocalPaths>,
}

impl TempDirLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            temp_root: config.temp_root.clone(),
            keep_extracted: config.keep_extracted,
            ..Self::default()
        }
    }

    /// The extraction directory, once an archive has been localized
    pub fn temp_dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    fn ensure_dir(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.path().to_path_buf());
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix("mrcheck-cache-");
        let dir = match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!("Created cache directory {}", dir.path().display());
        let path = dir.path().to_path_buf();
        self.dir = Some(dir);
        Ok(path)
    }

    /// Extract the archive registered at `index`
    fn extract(&mut self, archive: &Path, index: usize) -> Result<PathBuf> {
        let kind = ArchiveKind::detect(archive)
            .ok_or_else(|| Error::UnsupportedArchive(archive.display().to_string()))?;
        let name = archive
            .file_name()
            .ok_or_else(|| Error::localize(archive, "archive path has no file name"))?;
        let dir = self.ensure_dir()?;
        let mut dest = dir.join(name);
        // same file name from another directory: keep the contents apart
        if dest.exists() {
            dest = dir.join(format!("{}-{}", name.to_string_lossy(), index));
        }
        std::fs::create_dir_all(&dest)?;

        match kind {
            ArchiveKind::Zip => extract_zip(archive, &dest)?,
            ArchiveKind::Tar => extract_tar(archive, &dest)?,
            ArchiveKind::TarGz => extract_tar_gz(archive, &dest)?,
        }
        tracing::debug!("Extracted {} to {}", archive.display(), dest.display());
        Ok(dest)
    }
}

impl ResourceLocalizer for TempDirLocalizer {
    fn localize(&mut self, entries: &[CacheEntry]) -> Result<LocalPaths> {
        if let Some(paths) = &self.localized {
            return Ok(paths.clone());
        }

        let mut paths = LocalPaths::default();
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                CacheEntry::File(path) => {
                    if !path.exists() {
                        return Err(Error::localize(path, "no such file"));
                    }
                    paths.files.push(path.clone());
                }
                CacheEntry::Archive(path) => {
                    let local = self.extract(path, index)?;
                    paths.archives.push(local);
                }
            }
        }

        self.localized = Some(paths.clone());
        Ok(paths)
    }

    fn cleanup(&mut self) -> Result<()> {
        self.localized = None;
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        if self.keep_extracted {
            let kept = dir.keep();
            tracing::info!("Keeping extracted cache archives in {}", kept.display());
            return Ok(());
        }
        tracing::debug!("Deleting {}", dir.path().display());
        dir.close()?;
        Ok(())
    }
}

/// Extract a zip (or jar) archive
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| Error::file_read(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| Error::localize(archive_path, e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::localize(archive_path, e))?;

        let outpath = match file.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => continue,
        };

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

/// Extract an uncompressed tar archive
fn extract_tar(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| Error::file_read(archive_path, e))?;
    tar::Archive::new(file)
        .unpack(dest_dir)
        .map_err(|e| Error::localize(archive_path, e))
}

/// Extract a tar.gz archive
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| Error::file_read(archive_path, e))?;
    let decoder = flate2::read::GzDecoder::new(file);
    tar::Archive::new(decoder)
        .unpack(dest_dir)
        .map_err(|e| Error::localize(archive_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, name: &str, contents: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, name: &str, contents: &str) {
        let file = std::fs::File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_archive_kind() {
        assert_eq!(ArchiveKind::detect(Path::new("a/b.tar.gz")), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::detect(Path::new("b.TGZ")), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::detect(Path::new("b.tar")), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::detect(Path::new("lib.jar")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(Path::new("b.zip")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_files_pass_through() {
        let src = tempfile::tempdir().unwrap();
        let lookup = src.path().join("lookup.txt");
        std::fs::write(&lookup, "k\tv\n").unwrap();

        let mut localizer = TempDirLocalizer::new();
        let entries = vec![CacheEntry::File(lookup.clone())];
        let paths = localizer.localize(&entries).unwrap();
        assert_eq!(paths.files, vec![lookup]);
        assert!(paths.archives.is_empty());
        assert!(localizer.temp_dir().is_none());
        localizer.cleanup().unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut localizer = TempDirLocalizer::new();
        let entries = vec![CacheEntry::File(PathBuf::from("/definitely/not/here.txt"))];
        let err = localizer.localize(&entries).unwrap_err();
        assert!(matches!(err, Error::Localize { .. }));
        assert!(err.to_string().contains("here.txt"));
    }

    #[test]
    fn test_same_archive_name_from_two_directories() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("a")).unwrap();
        std::fs::create_dir_all(src.path().join("b")).unwrap();
        let first = src.path().join("a").join("dict.zip");
        let second = src.path().join("b").join("dict.zip");
        write_zip(&first, "first.txt", "one\n");
        write_zip(&second, "second.txt", "two\n");

        let mut localizer = TempDirLocalizer::new();
        let paths = localizer
            .localize(&[CacheEntry::Archive(first), CacheEntry::Archive(second)])
            .unwrap();
        assert_ne!(paths.archives[0], paths.archives[1]);
        assert!(paths.archives[0].ends_with("dict.zip"));
        assert!(paths.archives[0].join("first.txt").exists());
        assert!(!paths.archives[0].join("second.txt").exists());
        assert!(paths.archives[1].join("second.txt").exists());
        assert!(!paths.archives[1].join("first.txt").exists());
        localizer.cleanup().unwrap();
    }

    #[test]
    fn test_extracts_and_cleans_up_archives() {
        let src = tempfile::tempdir().unwrap();
        let zip_path = src.path().join("dict.zip");
        let tgz_path = src.path().join("stopwords.tar.gz");
        write_zip(&zip_path, "words.txt", "alpha\nbeta\n");
        write_tar_gz(&tgz_path, "stop.txt", "the\n");

        let mut localizer = TempDirLocalizer::new();
        let entries = vec![
            CacheEntry::Archive(zip_path.clone()),
            CacheEntry::Archive(tgz_path.clone()),
        ];
        let paths = localizer.localize(&entries).unwrap();
        assert_eq!(paths.archives.len(), 2);
        assert!(paths.archives[0].ends_with("dict.zip"));

        let words = std::fs::read_to_string(paths.archives[0].join("words.txt")).unwrap();
        assert_eq!(words, "alpha\nbeta\n");
        let stop = std::fs::read_to_string(paths.archives[1].join("stop.txt")).unwrap();
        assert_eq!(stop, "the\n");

        let temp_dir = localizer.temp_dir().unwrap().to_path_buf();
        assert!(temp_dir.exists());

        // already localized: same paths, no second extraction
        assert_eq!(localizer.localize(&entries).unwrap(), paths);

        localizer.cleanup().unwrap();
        assert!(!temp_dir.exists());
        assert!(localizer.temp_dir().is_none());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let src = tempfile::tempdir().unwrap();
        let zip_path = src.path().join("dict.zip");
        write_zip(&zip_path, "words.txt", "alpha\n");

        let mut localizer = TempDirLocalizer::new();
        let extracted = {
            let guard =
                LocalizedCache::acquire(&mut localizer, &[CacheEntry::Archive(zip_path)]).unwrap();
            let extracted = guard.paths().archives[0].clone();
            assert!(extracted.join("words.txt").exists());
            extracted
        };
        assert!(!extracted.exists());
    }

    #[test]
    fn test_failed_localization_cleans_up() {
        let src = tempfile::tempdir().unwrap();
        let zip_path = src.path().join("dict.zip");
        write_zip(&zip_path, "words.txt", "alpha\n");
        let bogus = src.path().join("notes.txt");
        std::fs::write(&bogus, "not an archive").unwrap();

        let mut localizer = TempDirLocalizer::new();
        let unsupported = matches!(
            LocalizedCache::acquire(
                &mut localizer,
                &[CacheEntry::Archive(zip_path), CacheEntry::Archive(bogus)],
            ),
            Err(Error::UnsupportedArchive(_))
        );
        assert!(unsupported);
        assert!(localizer.temp_dir().is_none());
    }

    #[test]
    fn test_keep_extracted() {
        let src = tempfile::tempdir().unwrap();
        let root = src.path().join("root");
        let zip_path = src.path().join("dict.zip");
        write_zip(&zip_path, "words.txt", "alpha\n");

        let mut localizer = TempDirLocalizer::from_config(&CacheConfig {
            temp_root: Some(root.clone()),
            keep_extracted: true,
        });
        let paths = localizer
            .localize(&[CacheEntry::Archive(zip_path)])
            .unwrap();
        assert!(paths.archives[0].starts_with(&root));
        localizer.cleanup().unwrap();
        assert!(paths.archives[0].join("words.txt").exists());
    }
}
