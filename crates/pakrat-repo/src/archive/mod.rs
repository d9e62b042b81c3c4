//! Package archive access
//!
//! Archives and index databases are tarballs that may be compressed with
//! gzip, xz or zstd. The compression is detected from the leading bytes of
//! the file rather than from its extension, since index databases are often
//! symlinks named `<repo>.db`.

use flate2::read::GzDecoder;
use pakrat_core::error::PakratError;
use pakrat_core::types::{Origin, Package};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::RepoResult;

pub mod pkginfo;

pub use pkginfo::parse_pkginfo;

const PKGINFO: &str = ".PKGINFO";

/// Compression formats found in repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00`
    /// - Zstd: `28 b5 2f fd`
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Self::Xz
        } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

/// Open a possibly compressed tarball for streaming
pub fn open_archive(path: &Path) -> RepoResult<Archive<Box<dyn Read>>> {
    let mut file = File::open(path)
        .map_err(|e| PakratError::io(format!("Failed to open {}", path.display()), e))?;

    let mut magic = [0u8; 6];
    let len = read_prefix(&mut file, &mut magic)
        .map_err(|e| PakratError::io(format!("Failed to read {}", path.display()), e))?;
    let compression = Compression::from_magic_bytes(&magic[..len]);

    // Put the sniffed bytes back in front of the stream
    let reader = Cursor::new(magic[..len].to_vec()).chain(file);
    let decoder: Box<dyn Read> = match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(GzDecoder::new(reader)),
        Compression::Xz => Box::new(XzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::Decoder::new(reader).map_err(|e| {
            PakratError::archive(path, format!("Failed to create zstd decoder: {}", e))
        })?),
    };

    Ok(Archive::new(decoder))
}

/// Fill as much of `buf` as the file allows
fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Read the package record embedded in an archive's `.PKGINFO`
pub fn read_pkginfo(path: &Path) -> RepoResult<Package> {
    let mut archive = open_archive(path)?;
    let entries = archive
        .entries()
        .map_err(|e| PakratError::archive(path, format!("Failed to read archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| PakratError::archive(path, format!("Failed to read entry: {}", e)))?;

        let is_pkginfo = entry
            .path()
            .map(|p| p.as_os_str() == PKGINFO)
            .unwrap_or(false);
        if !is_pkginfo {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| PakratError::archive(path, format!("Failed to read {}: {}", PKGINFO, e)))?;

        let origin = Origin::File {
            path: path.to_path_buf(),
        };
        return parse_pkginfo(&content, origin).map_err(|reason| PakratError::archive(path, reason));
    }

    Err(PakratError::archive(path, format!("no {} found", PKGINFO)))
}
