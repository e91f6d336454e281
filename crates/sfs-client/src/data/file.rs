use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Hash algorithms the service reports for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HashType {
    Sha1,
    Sha256,
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashType::Sha1 => write!(f, "Sha1"),
            HashType::Sha256 => write!(f, "Sha256"),
        }
    }
}

impl FromStr for HashType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("sha1") {
            Ok(HashType::Sha1)
        } else if s.eq_ignore_ascii_case("sha256") {
            Ok(HashType::Sha256)
        } else {
            Err(s.to_string())
        }
    }
}

/// Processor architectures an app file applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Architecture {
    None,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::None => write!(f, "None"),
            Architecture::X86 => write!(f, "x86"),
            Architecture::Amd64 => write!(f, "amd64"),
            Architecture::Arm => write!(f, "arm"),
            Architecture::Arm64 => write!(f, "arm64"),
        }
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Architecture::None,
            Architecture::X86,
            Architecture::Amd64,
            Architecture::Arm,
            Architecture::Arm64,
        ]
        .into_iter()
        .find(|arch| arch.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| s.to_string())
    }
}

/// A downloadable file of a content version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct File {
    file_id: String,
    url: String,
    size_in_bytes: u64,
    hashes: HashMap<HashType, String>,
}

impl File {
    pub fn new(
        file_id: impl Into<String>,
        url: impl Into<String>,
        size_in_bytes: u64,
        hashes: HashMap<HashType, String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            url: url.into(),
            size_in_bytes,
            hashes,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    pub fn hashes(&self) -> &HashMap<HashType, String> {
        &self.hashes
    }
}

/// Where an app file can be installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicabilityDetails {
    architectures: Vec<Architecture>,
    platform_applicability_for_package: Vec<String>,
}

impl ApplicabilityDetails {
    pub fn new(
        architectures: Vec<Architecture>,
        platform_applicability_for_package: Vec<String>,
    ) -> Self {
        Self {
            architectures,
            platform_applicability_for_package,
        }
    }

    pub fn architectures(&self) -> &[Architecture] {
        &self.architectures
    }

    pub fn platform_applicability_for_package(&self) -> &[String] {
        &self.platform_applicability_for_package
    }
}

/// A file of an app content: the generic file data plus app metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppFile {
    #[serde(flatten)]
    file: File,
    file_moniker: String,
    applicability_details: ApplicabilityDetails,
}

impl AppFile {
    pub fn new(
        file: File,
        file_moniker: impl Into<String>,
        applicability_details: ApplicabilityDetails,
    ) -> Self {
        Self {
            file,
            file_moniker: file_moniker.into(),
            applicability_details,
        }
    }

    /// The generic part of this file.
    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_id(&self) -> &str {
        self.file.file_id()
    }

    pub fn url(&self) -> &str {
        self.file.url()
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.file.size_in_bytes()
    }

    pub fn hashes(&self) -> &HashMap<HashType, String> {
        self.file.hashes()
    }

    pub fn file_moniker(&self) -> &str {
        &self.file_moniker
    }

    pub fn applicability_details(&self) -> &ApplicabilityDetails {
        &self.applicability_details
    }
}
