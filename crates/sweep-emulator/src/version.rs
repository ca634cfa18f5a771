//! Installed emulator version, read from executable metadata
//!
//! The file version lives in the `RT_VERSION` resource of the executable. The
//! PE headers and section table are parsed with goblin; the resource tree is
//! then walked `type → name → language` down to a data entry whose payload is
//! a `VS_VERSIONINFO` block:
//!
//! ```text
//! wLength  wValueLength  wType  L"VS_VERSION_INFO\0"  <pad to 4>
//! VS_FIXEDFILEINFO
//!     dwSignature      0xFEEF04BD
//!     dwStrucVersion   0x00010000
//!     dwFileVersionMS  major << 16 | minor
//!     dwFileVersionLS  build << 16 | revision
//!     ...
//! ```
//!
//! Reading the resource directly avoids launching the emulator just to learn
//! its version.

use std::path::{Path, PathBuf};

use goblin::pe::section_table::SectionTable;
use goblin::pe::PE;
use sweep_core::prelude::*;
use sweep_core::VersionTriple;

pub(crate) const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
pub(crate) const FIXED_FILE_INFO_STRUC_VERSION: u32 = 0x0001_0000;

/// `VS_FIXEDFILEINFO` is 13 DWORDs
pub(crate) const FIXED_FILE_INFO_LEN: usize = 52;

pub(crate) const VERSION_INFO_KEY: &str = "VS_VERSION_INFO";

/// Resource type id of version resources
pub(crate) const RT_VERSION: u32 = 16;

const RESOURCE_DIRECTORY_LEN: usize = 16;
const RESOURCE_ENTRY_LEN: usize = 8;
/// High bit of an entry's name (named entry) or offset (subdirectory)
const RESOURCE_HIGH_BIT: u32 = 0x8000_0000;

/// Reads the installed emulator's version without running it
#[derive(Debug, Clone)]
pub struct VersionProbe {
    executable: PathBuf,
}

impl VersionProbe {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Installed version, or [`VersionTriple::ZERO`] when it cannot be read.
    ///
    /// Failures are logged and never propagated: a missing or unreadable
    /// executable means "not installed".
    pub fn installed_version(&self) -> VersionTriple {
        match self.read_version() {
            Ok(version) => {
                info!(
                    "Storage emulator version {} at {}",
                    version,
                    self.executable.display()
                );
                version
            }
            Err(e) => {
                warn!("{}", e);
                VersionTriple::ZERO
            }
        }
    }

    /// Read the file version, surfacing [`Error::VersionProbe`] on failure
    pub fn read_version(&self) -> Result<VersionTriple> {
        let bytes = std::fs::read(&self.executable)
            .map_err(|e| Error::version_probe(&self.executable, e.to_string()))?;

        parse_file_version(&self.executable, &bytes)
    }
}

/// Decode the file version from the `RT_VERSION` resource of a PE image.
///
/// `executable` only names the file in errors.
pub fn parse_file_version(executable: &Path, bytes: &[u8]) -> Result<VersionTriple> {
    let fail = |reason: String| Error::version_probe(executable, reason);

    let pe = PE::parse(bytes).map_err(|e| fail(format!("not a PE image: {}", e)))?;
    let optional_header = pe
        .header
        .optional_header
        .as_ref()
        .ok_or_else(|| fail("PE image has no optional header".to_string()))?;
    let resource_rva = optional_header
        .data_directories
        .get_resource_table()
        .map(|dir| dir.virtual_address)
        .filter(|rva| *rva != 0)
        .ok_or_else(|| fail("PE image has no resource directory".to_string()))?;

    let resources = ResourceTree {
        bytes,
        root: rva_to_offset(&pe.sections, resource_rva)
            .ok_or_else(|| fail("resource directory lies outside every section".to_string()))?,
    };

    let (data_rva, data_size) = resources.version_data().map_err(fail)?;
    let start = rva_to_offset(&pe.sections, data_rva)
        .ok_or_else(|| fail("version resource lies outside every section".to_string()))?;
    let data = start
        .checked_add(data_size as usize)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| fail("version resource is truncated".to_string()))?;

    decode_version_info(data).map_err(fail)
}

/// Map an RVA to a file offset through the section table
fn rva_to_offset(sections: &[SectionTable], rva: u32) -> Option<usize> {
    sections.iter().find_map(|section| {
        let extent = section.virtual_size.max(section.size_of_raw_data);
        let end = section.virtual_address.checked_add(extent)?;
        (section.virtual_address..end)
            .contains(&rva)
            .then(|| (rva - section.virtual_address) as usize + section.pointer_to_raw_data as usize)
    })
}

/// The `.rsrc` directory tree; entry offsets are relative to `root`
struct ResourceTree<'a> {
    bytes: &'a [u8],
    root: usize,
}

impl ResourceTree<'_> {
    /// RVA and size of the first version resource
    fn version_data(&self) -> std::result::Result<(u32, u32), String> {
        let names = self
            .find_id(0, RT_VERSION)?
            .ok_or("no RT_VERSION resource")?;
        let languages = self.first_subdirectory(names)?;
        let entry = self.first_entry(languages)?;
        if entry & RESOURCE_HIGH_BIT != 0 {
            return Err("version resource nests deeper than type/name/language".to_string());
        }

        let at = self.root + entry as usize;
        Ok((self.u32_at(at)?, self.u32_at(at + 4)?))
    }

    /// Subdirectory offset of the id entry `id` in the directory at `dir`
    fn find_id(&self, dir: u32, id: u32) -> std::result::Result<Option<u32>, String> {
        for (name, offset) in self.entries(dir)? {
            if name == id {
                return self.subdirectory(offset).map(Some);
            }
        }
        Ok(None)
    }

    fn first_subdirectory(&self, dir: u32) -> std::result::Result<u32, String> {
        self.subdirectory(self.first_entry(dir)?)
    }

    fn first_entry(&self, dir: u32) -> std::result::Result<u32, String> {
        self.entries(dir)?
            .first()
            .map(|(_, offset)| *offset)
            .ok_or_else(|| "empty resource directory".to_string())
    }

    fn subdirectory(&self, offset: u32) -> std::result::Result<u32, String> {
        if offset & RESOURCE_HIGH_BIT == 0 {
            return Err("resource entry is not a directory".to_string());
        }
        Ok(offset & !RESOURCE_HIGH_BIT)
    }

    /// `(name, offset)` of every entry of the directory at `dir`
    fn entries(&self, dir: u32) -> std::result::Result<Vec<(u32, u32)>, String> {
        let at = self.root + dir as usize;
        let named = self.u16_at(at + 12)? as usize;
        let ids = self.u16_at(at + 14)? as usize;

        (0..named + ids)
            .map(|i| {
                let entry = at + RESOURCE_DIRECTORY_LEN + i * RESOURCE_ENTRY_LEN;
                Ok((self.u32_at(entry)?, self.u32_at(entry + 4)?))
            })
            .collect()
    }

    fn u16_at(&self, at: usize) -> std::result::Result<u16, String> {
        read_u16(self.bytes, at).ok_or_else(|| truncated(at))
    }

    fn u32_at(&self, at: usize) -> std::result::Result<u32, String> {
        read_u32(self.bytes, at).ok_or_else(|| truncated(at))
    }
}

fn truncated(at: usize) -> String {
    format!("resource directory truncated at offset {:#x}", at)
}

/// Decode a `VS_VERSIONINFO` block down to its fixed file version
fn decode_version_info(data: &[u8]) -> std::result::Result<VersionTriple, String> {
    let value_len = read_u16(data, 2).ok_or("version resource is truncated")? as usize;
    if value_len < FIXED_FILE_INFO_LEN {
        return Err("version resource carries no VS_FIXEDFILEINFO".to_string());
    }

    let key: Vec<u16> = VERSION_INFO_KEY.encode_utf16().chain([0]).collect();
    let key_matches = key
        .iter()
        .enumerate()
        .all(|(i, unit)| read_u16(data, 6 + i * 2) == Some(*unit));
    if !key_matches {
        return Err(format!("version resource is not keyed {}", VERSION_INFO_KEY));
    }

    // Value starts at the next 32-bit boundary after the key
    let value = (6 + key.len() * 2 + 3) & !3;
    let signature = read_u32(data, value).ok_or("VS_FIXEDFILEINFO is truncated")?;
    let struc_version = read_u32(data, value + 4).ok_or("VS_FIXEDFILEINFO is truncated")?;
    if signature != FIXED_FILE_INFO_SIGNATURE || struc_version != FIXED_FILE_INFO_STRUC_VERSION {
        return Err(format!(
            "bad VS_FIXEDFILEINFO signature {:#010x}/{:#010x}",
            signature, struc_version
        ));
    }

    let ms = read_u32(data, value + 8).ok_or("VS_FIXEDFILEINFO is truncated")?;
    let ls = read_u32(data, value + 12).ok_or("VS_FIXEDFILEINFO is truncated")?;
    Ok(VersionTriple::new(ms >> 16, ms & 0xFFFF, ls >> 16))
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
