//! PE image probing.
//!
//! Reads just enough of an image on disk to tell its bitness, whether it carries a CLR header,
//! and which runtime version its metadata was built against. The module list of a process only
//! gives paths; this is how an `mscorlib` on that list is mapped to a runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use hawkscope::process::image;
//!
//! let info = image::probe_file(r"C:\Windows\Microsoft.NET\Framework\v4.0.30319\mscorlib.dll")?;
//! assert!(info.is_managed);
//! println!("{:?} {:?}", info.bitness, info.runtime_version);
//! # Ok::<(), hawkscope::Error>(())
//! ```

use std::{fs, path::Path};

use goblin::pe::PE;
use memmap2::Mmap;

use crate::{process::Bitness, Result};

/// `BSJB`, the metadata root signature.
const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// What a probe learned about an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// PE32 images are x86, PE32+ images x64
    pub bitness: Bitness,
    /// True if the image has a CLR runtime header
    pub is_managed: bool,
    /// Metadata version string, e.g. `v4.0.30319`
    pub runtime_version: Option<String>,
}

impl ImageInfo {
    /// Major runtime version, parsed from the metadata version string
    #[must_use]
    pub fn runtime_major(&self) -> Option<u32> {
        self.runtime_version.as_deref().and_then(parse_runtime_major)
    }
}

/// Parses the major version out of a metadata version string such as `v2.0.50727`.
#[must_use]
pub fn parse_runtime_major(version: &str) -> Option<u32> {
    let version = version.trim_start_matches(['v', 'V']);
    version.split('.').next()?.parse().ok()
}

/// Probes an image held in memory.
///
/// # Errors
/// Returns [`crate::Error::GoblinErr`] if the data is not a PE image and
/// [`crate::Error::Malformed`] if its CLR header or metadata root is damaged.
pub fn probe(data: &[u8]) -> Result<ImageInfo> {
    if data.is_empty() {
        return Err(malformed_error!("Image is empty"));
    }

    let pe = PE::parse(data)?;
    let bitness = if pe.is_64 { Bitness::X64 } else { Bitness::X86 };

    let Some(optional_header) = pe.header.optional_header else {
        return Err(malformed_error!("Image does not have an OptionalHeader"));
    };
    let Some(clr) = optional_header.data_directories.get_clr_runtime_header() else {
        return Ok(ImageInfo {
            bitness,
            is_managed: false,
            runtime_version: None,
        });
    };

    let clr_offset = rva_to_offset(&pe, clr.virtual_address)?;
    let metadata_rva = read_u32(data, clr_offset + 8)?;
    let metadata_offset = rva_to_offset(&pe, metadata_rva)?;
    let Some(metadata) = data.get(metadata_offset..) else {
        return Err(malformed_error!(
            "Metadata root out of bounds - offset {}",
            metadata_offset
        ));
    };

    Ok(ImageInfo {
        bitness,
        is_managed: true,
        runtime_version: Some(metadata_version(metadata)?),
    })
}

/// Probes an image on disk through a read-only memory map.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and the errors of
/// [`probe`] otherwise.
pub fn probe_file(path: impl AsRef<Path>) -> Result<ImageInfo> {
    let file = fs::File::open(path)?;
    let mmap = unsafe { Mmap::map(&file) }?;

    probe(&mmap)
}

/// Reads the version string out of a metadata root.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the signature is wrong or the string is out of bounds.
pub fn metadata_version(metadata: &[u8]) -> Result<String> {
    let signature = read_u32(metadata, 0)?;
    if signature != METADATA_SIGNATURE {
        return Err(malformed_error!(
            "Invalid metadata signature - 0x{:08X}",
            signature
        ));
    }

    let length = read_u32(metadata, 12)? as usize;
    let Some(raw) = metadata.get(16..16 + length) else {
        return Err(malformed_error!(
            "Metadata version string out of bounds - {} bytes",
            length
        ));
    };

    let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    match data.get(offset..offset + 4) {
        Some(bytes) => Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        None => Err(malformed_error!("Read past end of image at offset {}", offset)),
    }
}

fn rva_to_offset(pe: &PE, rva: u32) -> Result<usize> {
    for section in &pe.sections {
        let Some(section_max) = section.virtual_address.checked_add(section.virtual_size) else {
            return Err(malformed_error!(
                "Section malformed, causing integer overflow - {} + {}",
                section.virtual_address,
                section.virtual_size
            ));
        };

        if section.virtual_address <= rva && section_max > rva {
            return Ok((rva - section.virtual_address) as usize
                + section.pointer_to_raw_data as usize);
        }
    }

    Err(malformed_error!("RVA could not be converted to offset - {}", rva))
}
