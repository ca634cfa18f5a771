//! Emulator version types
//!
//! The emulator publishes its release as a three-part file version. Only the
//! major and minor parts gate compatibility; the build number is informational.

use std::fmt;

/// Minimum emulator release required for the `2017-04-17` storage API version
pub const MINIMUM_EMULATOR_VERSION: MinimumVersion = MinimumVersion::new(5, 3);

/// A `(major, minor, build)` version read from executable metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionTriple {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl VersionTriple {
    /// Sentinel for "not installed / unknown version"
    pub const ZERO: VersionTriple = VersionTriple::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    /// True when the version could not be determined
    pub fn is_unknown(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Lower bound on `(major, minor)`; the build part is unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumVersion {
    pub major: u32,
    pub minor: u32,
}

impl MinimumVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Compare `(major, minor)` lexicographically, so `6.0` satisfies `5.3`.
    pub fn is_satisfied_by(&self, version: VersionTriple) -> bool {
        (version.major, version.minor) >= (self.major, self.minor)
    }
}

impl fmt::Display for MinimumVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
