//! Runtime archive extraction.
//!
//! Blocking functions; callers run them on the blocking thread pool.

use crate::bundler::error::{Error, ErrorExt, Result};
use flate2::read::GzDecoder;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// Unpacks a gzip-compressed tar archive into `dest`.
pub fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).fs_context("creating extraction directory", dest)?;

    let file = File::open(archive_path).fs_context("opening archive", archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(dest)
        .fs_context("unpacking archive", archive_path)?;

    log::debug!("Unpacked {} to {}", archive_path.display(), dest.display());
    Ok(())
}

/// Reads one entry of a zip archive into memory.
///
/// Fails with [`Error::MissingExecutable`] if `entry` is not in the archive's
/// central directory.
pub fn read_zip_entry(archive_path: &Path, entry: &str) -> Result<Vec<u8>> {
    let file = File::open(archive_path).fs_context("opening archive", archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
        Error::GenericError(format!(
            "{} is not a valid zip archive: {}",
            archive_path.display(),
            e
        ))
    })?;

    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::MissingExecutable {
                archive: archive_path.to_path_buf(),
                entry: entry.to_string(),
            });
        }
        Err(e) => {
            return Err(Error::GenericError(format!(
                "Failed to read {} from {}: {}",
                entry,
                archive_path.display(),
                e
            )));
        }
    };

    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut data)
        .fs_context("reading zip entry", archive_path)?;
    Ok(data)
}
