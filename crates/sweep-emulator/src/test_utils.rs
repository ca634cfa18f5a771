//! Test utilities for emulator supervision
//!
//! Provides a scripted [`ProcessRunner`] that replays canned status output and
//! records every command it receives, plus a builder for small PE images
//! carrying a version resource.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;

use crate::command::EmulatorCommand;
use crate::runner::{ProcessResult, ProcessRunner};
use crate::version::{
    FIXED_FILE_INFO_LEN, FIXED_FILE_INFO_SIGNATURE, FIXED_FILE_INFO_STRUC_VERSION, RT_VERSION,
    VERSION_INFO_KEY,
};
use sweep_core::prelude::*;

/// Realistic `status` output for a running or stopped emulator
pub fn status_output(running: bool) -> String {
    format!(
        "Windows Azure Storage Emulator 5.10.0.0 command line tool\r\n\
         IsRunning: {}\r\n\
         BlobEndpoint: http://127.0.0.1:10000/\r\n\
         QueueEndpoint: http://127.0.0.1:10001/\r\n\
         TableEndpoint: http://127.0.0.1:10002/\r\n",
        if running { "True" } else { "False" }
    )
}

/// A [`ProcessRunner`] that replays scripted output.
///
/// Status responses are consumed in order; the last one repeats forever.
/// With no statuses scripted, `status` prints nothing (not running).
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    statuses: Mutex<VecDeque<String>>,
    start_stderr: String,
    stop_stderr: String,
    launch_error: Option<String>,
    calls: Mutex<Vec<EmulatorCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulator reporting the same liveness on every status check
    pub fn always(running: bool) -> Self {
        Self::new().with_statuses([status_output(running)])
    }

    /// Liveness sequence, one entry per status check
    pub fn with_liveness(running: impl IntoIterator<Item = bool>) -> Self {
        Self::new().with_statuses(running.into_iter().map(status_output))
    }

    pub fn with_statuses<S: Into<String>>(mut self, statuses: impl IntoIterator<Item = S>) -> Self {
        self.statuses = Mutex::new(statuses.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_start_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.start_stderr = stderr.into();
        self
    }

    pub fn with_stop_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stop_stderr = stderr.into();
        self
    }

    /// Every invocation fails as if the executable were missing
    pub fn failing_launch(mut self, reason: impl Into<String>) -> Self {
        self.launch_error = Some(reason.into());
        self
    }

    /// Commands received so far, in order
    pub fn calls(&self) -> Vec<EmulatorCommand> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of times `command` was received
    pub fn count(&self, command: EmulatorCommand) -> usize {
        self.calls().iter().filter(|c| **c == command).count()
    }

    fn next_status(&self) -> String {
        let Ok(mut statuses) = self.statuses.lock() else {
            return String::new();
        };
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or_default()
        } else {
            statuses.front().cloned().unwrap_or_default()
        }
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn run(&self, command: EmulatorCommand) -> Result<ProcessResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command);
        }

        if let Some(reason) = &self.launch_error {
            return Err(Error::launch_failure("AzureStorageEmulator.exe", reason.clone()));
        }

        let result = match command {
            EmulatorCommand::Status => ProcessResult::exited(self.next_status(), ""),
            EmulatorCommand::Start => ProcessResult::exited("", self.start_stderr.clone()),
            EmulatorCommand::Stop => ProcessResult::exited("", self.stop_stderr.clone()),
        };
        Ok(result)
    }
}

/// Leading `VS_FIXEDFILEINFO` fields carrying the given file version
pub fn fixed_file_info_bytes(major: u16, minor: u16, build: u16, revision: u16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(16);
    put_u32(&mut bytes, FIXED_FILE_INFO_SIGNATURE);
    put_u32(&mut bytes, FIXED_FILE_INFO_STRUC_VERSION);
    put_u32(&mut bytes, (u32::from(major) << 16) | u32::from(minor));
    put_u32(&mut bytes, (u32::from(build) << 16) | u32::from(revision));
    bytes
}

const PE_OFFSET: usize = 0x40;
const SECTION_TABLE_OFFSET: usize = 0x138;
const FILE_ALIGNMENT: usize = 0x200;
const RSRC_RVA: u32 = 0x1000;

/// Zero-filled header bytes between the section table and `.rsrc`
pub const PE_HEADER_PADDING: Range<usize> = SECTION_TABLE_OFFSET + 40..FILE_ALIGNMENT;

/// A minimal PE32 image whose only section holds an `RT_VERSION` resource
pub fn fake_emulator_binary(major: u16, minor: u16, build: u16) -> Vec<u8> {
    let rsrc = version_resource_section(major, minor, build);

    let mut bytes = vec![0u8; FILE_ALIGNMENT];
    bytes[..2].copy_from_slice(b"MZ");
    bytes[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());

    let mut headers = b"PE\0\0".to_vec();
    // COFF: i386, one section, PE32 optional header, executable
    put_u16(&mut headers, 0x014C);
    put_u16(&mut headers, 1);
    headers.extend_from_slice(&[0u8; 12]);
    put_u16(&mut headers, 0xE0);
    put_u16(&mut headers, 0x0102);

    // Optional header, standard fields
    put_u16(&mut headers, 0x010B);
    headers.extend_from_slice(&[0u8; 26]);
    // Windows fields
    put_u32(&mut headers, 0x0040_0000);
    put_u32(&mut headers, 0x1000);
    put_u32(&mut headers, FILE_ALIGNMENT as u32);
    for version in [4u16, 0, 0, 0, 4, 0] {
        put_u16(&mut headers, version);
    }
    put_u32(&mut headers, 0);
    put_u32(&mut headers, 0x2000);
    put_u32(&mut headers, FILE_ALIGNMENT as u32);
    put_u32(&mut headers, 0);
    put_u16(&mut headers, 3);
    put_u16(&mut headers, 0);
    for reserve in [0x10_0000u32, 0x1000, 0x10_0000, 0x1000, 0] {
        put_u32(&mut headers, reserve);
    }
    put_u32(&mut headers, 16);
    // Data directories; index 2 is the resource table
    for index in 0..16 {
        let (rva, size) = if index == 2 {
            (RSRC_RVA, rsrc.len() as u32)
        } else {
            (0, 0)
        };
        put_u32(&mut headers, rva);
        put_u32(&mut headers, size);
    }

    // Section table
    headers.extend_from_slice(b".rsrc\0\0\0");
    put_u32(&mut headers, rsrc.len() as u32);
    put_u32(&mut headers, RSRC_RVA);
    put_u32(&mut headers, FILE_ALIGNMENT as u32);
    put_u32(&mut headers, FILE_ALIGNMENT as u32);
    headers.extend_from_slice(&[0u8; 12]);
    put_u32(&mut headers, 0x4000_0040);

    bytes[PE_OFFSET..PE_OFFSET + headers.len()].copy_from_slice(&headers);
    debug_assert_eq!(PE_OFFSET + headers.len(), PE_HEADER_PADDING.start);

    bytes.extend_from_slice(&rsrc);
    bytes.resize(2 * FILE_ALIGNMENT, 0);
    bytes
}

/// `.rsrc` contents: `RT_VERSION / 1 / en-US` pointing at a `VS_VERSIONINFO`
fn version_resource_section(major: u16, minor: u16, build: u16) -> Vec<u8> {
    const SUBDIRECTORY: u32 = 0x8000_0000;
    const DATA_ENTRY: u32 = 0x48;
    const VERSION_INFO: u32 = 0x58;

    let mut rsrc = Vec::new();
    for (id, offset) in [
        (RT_VERSION, 0x18 | SUBDIRECTORY),
        (1, 0x30 | SUBDIRECTORY),
        (0x0409, DATA_ENTRY),
    ] {
        rsrc.extend_from_slice(&[0u8; 12]);
        put_u16(&mut rsrc, 0);
        put_u16(&mut rsrc, 1);
        put_u32(&mut rsrc, id);
        put_u32(&mut rsrc, offset);
    }

    let info = version_info(major, minor, build);
    put_u32(&mut rsrc, RSRC_RVA + VERSION_INFO);
    put_u32(&mut rsrc, info.len() as u32);
    rsrc.extend_from_slice(&[0u8; 8]);
    debug_assert_eq!(rsrc.len(), VERSION_INFO as usize);

    rsrc.extend_from_slice(&info);
    rsrc
}

fn version_info(major: u16, minor: u16, build: u16) -> Vec<u8> {
    let mut fixed = fixed_file_info_bytes(major, minor, build, 0);
    // Product version mirrors the file version
    let file_version = fixed[8..16].to_vec();
    fixed.extend_from_slice(&file_version);
    fixed.resize(FIXED_FILE_INFO_LEN, 0);

    let mut info = Vec::new();
    put_u16(&mut info, 0);
    put_u16(&mut info, FIXED_FILE_INFO_LEN as u16);
    put_u16(&mut info, 0);
    for unit in VERSION_INFO_KEY.encode_utf16().chain([0]) {
        put_u16(&mut info, unit);
    }
    info.resize((info.len() + 3) & !3, 0);
    info.extend_from_slice(&fixed);

    let len = info.len() as u16;
    info[..2].copy_from_slice(&len.to_le_bytes());
    info
}

fn put_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}
