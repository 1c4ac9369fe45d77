use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// SPIR-V versions a generated module may declare.
///
/// Untyped pointers need at least 1.4, so older versions are not listed. Ordering follows the
/// version number, which lets callers raise a minimum with [`Ord::max`].
#[allow(non_camel_case_types)]
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    IntoStaticStr,
    EnumIter,
    Display,
)]
pub enum SpirvVersion {
    #[strum(to_string = "1.4")]
    Spv_1_4,
    #[strum(to_string = "1.5")]
    Spv_1_5,
    #[strum(to_string = "1.6")]
    Spv_1_6,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unsupported SPIR-V version `{0}`, expected one of 1.4, 1.5, 1.6")]
pub struct SpirvVersionParseError(pub String);

impl SpirvVersion {
    /// The version the untyped pointer extension requires.
    pub const MIN: Self = Self::Spv_1_4;

    pub fn parse(version: &str) -> Result<Self, SpirvVersionParseError> {
        FromStr::from_str(version).map_err(|_e| SpirvVersionParseError(version.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

impl Default for SpirvVersion {
    fn default() -> Self {
        Self::MIN
    }
}

impl Serialize for SpirvVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpirvVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        Self::parse(&version).map_err(serde::de::Error::custom)
    }
}
