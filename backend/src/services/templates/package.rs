//! OOXML packages (`.docx`, `.pptx`) held fully in memory.

use crate::error::TemplateError;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip entries in archive order. Directory entries are kept so a re-saved package
/// lists the same entries as the original.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, TemplateError> {
        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|_| TemplateError::NotFound {
                path: path.to_path_buf(),
            })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push((entry.name().to_string(), data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Replaces an existing part or appends a new one.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            if name.ends_with('/') {
                zip.add_directory(name.as_str(), options)?;
            } else {
                zip.start_file(name.as_str(), options)?;
                zip.write_all(data)?;
            }
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<(), TemplateError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a package from `(name, contents)` pairs.
    pub(crate) fn package_with(parts: &[(&str, &str)]) -> Package {
        let mut pkg = Package::default();
        for (name, data) in parts {
            pkg.set_part(name, data.as_bytes().to_vec());
        }
        pkg
    }

    #[test]
    fn parts_survive_a_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.docx");
        let pkg = package_with(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/", ""),
            ("word/document.xml", "<w:document/>"),
        ]);
        pkg.save(&path).unwrap();

        let reopened = Package::open(&path).unwrap();
        assert_eq!(
            reopened.part_names().collect::<Vec<_>>(),
            ["[Content_Types].xml", "word/", "word/document.xml"]
        );
        assert_eq!(reopened.part("word/document.xml"), Some(&b"<w:document/>"[..]));
    }

    #[test]
    fn set_part_replaces_in_place() {
        let mut pkg = package_with(&[("a.xml", "1"), ("b.xml", "2")]);
        pkg.set_part("a.xml", b"3".to_vec());
        assert_eq!(pkg.part_names().collect::<Vec<_>>(), ["a.xml", "b.xml"]);
        assert_eq!(pkg.part("a.xml"), Some(&b"3"[..]));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let err = Package::open(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
    }

    #[test]
    fn garbage_is_not_a_package() {
        assert!(matches!(
            Package::from_bytes(b"not a zip").unwrap_err(),
            TemplateError::Zip(_)
        ));
    }
}
