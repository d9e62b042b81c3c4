//! Builders for package archives and index databases used in tests

use crate::archive::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Builder;

pub struct PackageSpec {
    pub name: String,
    pub version: String,
    pub depends: Vec<String>,
}

impl PackageSpec {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            depends: Vec::new(),
        }
    }

    pub fn depends(mut self, depends: &[&str]) -> Self {
        self.depends = depends.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn filename(&self, ext: &str) -> String {
        format!("{}-{}-any.pkg.tar{}", self.name, self.version, ext)
    }

    fn pkginfo(&self) -> String {
        let mut content = format!(
            "pkgname = {}\npkgbase = {}\npkgver = {}\narch = any\n",
            self.name, self.name, self.version
        );
        for dep in &self.depends {
            content.push_str(&format!("depend = {}\n", dep));
        }
        content
    }
}

pub fn tar_bytes(files: &[(String, String)]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn compress(data: Vec<u8>, compression: Compression) -> Vec<u8> {
    match compression {
        Compression::None => data,
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&data).unwrap();
            encoder.finish().unwrap()
        },
        Compression::Xz => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(&data).unwrap();
            encoder.finish().unwrap()
        },
        Compression::Zstd => zstd::encode_all(data.as_slice(), 0).unwrap(),
    }
}

/// Write a package archive into `dir` and return its path
pub fn write_package(dir: &Path, spec: &PackageSpec, compression: Compression, ext: &str) -> PathBuf {
    let path = dir.join(spec.filename(ext));
    let tar = tar_bytes(&[
        (".PKGINFO".to_string(), spec.pkginfo()),
        ("usr/bin/hello".to_string(), "#!/bin/sh\necho hello\n".to_string()),
    ]);
    std::fs::write(&path, compress(tar, compression)).unwrap();
    path
}

/// Write a zstd package archive into `dir`
pub fn write_zst(dir: &Path, name: &str, version: &str, depends: &[&str]) -> PathBuf {
    let spec = PackageSpec::new(name, version).depends(depends);
    write_package(dir, &spec, Compression::Zstd, ".zst")
}

/// `desc` file content for an index entry
pub fn desc(name: &str, version: &str, filename: &str) -> String {
    format!(
        "%FILENAME%\n{}\n\n%NAME%\n{}\n\n%BASE%\n{}\n\n%VERSION%\n{}\n\n%ARCH%\nany\n\n",
        filename, name, name, version
    )
}

/// Write a gzip index database holding `(name, version, filename)` entries
pub fn write_index(path: &Path, entries: &[(&str, &str, &str)]) {
    let files: Vec<(String, String)> = entries
        .iter()
        .map(|(name, version, filename)| {
            (
                format!("{}-{}/desc", name, version),
                desc(name, version, filename),
            )
        })
        .collect();
    std::fs::write(path, compress(tar_bytes(&files), Compression::Gzip)).unwrap();
}
