//! Archive handling for ODT/FODT packages
//!
//! OpenDocument files are ZIP archives containing XML parts and resources.
//! Entries keep their original order and compression method so that parts a
//! render job never touches are written back byte-for-byte.

use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{OdfError, Result};
use crate::names::{CONTENT_PART, MANIFEST_PART, MIMETYPE_PART, STYLES_PART};

/// A single file stored in the package
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// Represents an unpacked OpenDocument package
#[derive(Debug, Default, Clone)]
pub struct OdfArchive {
    /// All files in the archive, in their original order
    entries: Vec<Entry>,
}

impl OdfArchive {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and unpack an ODT file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Unpack a package held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if file.is_dir() || name.ends_with('/') {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name,
                data,
                compression: file.compression(),
            });
        }

        tracing::debug!(entries = entries.len(), "unpacked package");
        Ok(Self { entries })
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == path)
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.position(path).map(|i| self.entries[i].data.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get a part that every OpenDocument package must carry
    pub fn required(&self, path: &str) -> Result<&[u8]> {
        self.get(path)
            .ok_or_else(|| OdfError::MissingPart(path.to_string()))
    }

    /// Get the document body (content.xml)
    pub fn content_xml(&self) -> Result<&[u8]> {
        self.required(CONTENT_PART)
    }

    /// Get the styles definition (styles.xml)
    pub fn styles_xml(&self) -> Result<&[u8]> {
        self.required(STYLES_PART)
    }

    /// Get the package manifest (META-INF/manifest.xml)
    pub fn manifest_xml(&self) -> Result<&[u8]> {
        self.required(MANIFEST_PART)
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    /// List all files in the archive, in package order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of files in the archive
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no files
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set or update a file's contents
    ///
    /// Existing entries keep their position and compression method; new
    /// entries are appended and deflated.
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        let path = path.into();
        match self.position(&path) {
            Some(i) => self.entries[i].data = contents,
            None => self.entries.push(Entry {
                name: path,
                data: contents,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.set(path, contents.into().into_bytes());
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.position(path).map(|i| self.entries.remove(i).data)
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Pack the archive into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the archive to any writer
    ///
    /// The `mimetype` entry goes first and uncompressed, as the OpenDocument
    /// packaging rules require; the rest follow in package order.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let mimetype = self.entries.iter().filter(|e| e.name == MIMETYPE_PART);
        let others = self.entries.iter().filter(|e| e.name != MIMETYPE_PART);

        for entry in mimetype {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        for entry in others {
            let options = SimpleFileOptions::default().compression_method(entry.compression);
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()?;
        Ok(())
    }
}
