//! Compiled patterns shared by the string rules

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHANUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_ANY_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_V1_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_V3_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_V4_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_V5_REGEX: OnceLock<Regex> = OnceLock::new();

/// UUID versions the `uuid` rule understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidVersion {
    V1,
    V3,
    V4,
    V5,
}

impl UuidVersion {
    fn digit(&self) -> char {
        match self {
            UuidVersion::V1 => '1',
            UuidVersion::V3 => '3',
            UuidVersion::V4 => '4',
            UuidVersion::V5 => '5',
        }
    }
}

impl fmt::Display for UuidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.digit())
    }
}

fn uuid_pattern(versions: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^[0-9a-f]{{8}}-[0-9a-f]{{4}}-[{versions}][0-9a-f]{{3}}-[89ab][0-9a-f]{{3}}-[0-9a-f]{{12}}$"
    ))
    .expect("uuid pattern is valid")
}

pub fn email() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

pub fn alpha() -> &'static Regex {
    ALPHA_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z]+$").expect("alpha pattern is valid"))
}

pub fn alphanumeric() -> &'static Regex {
    ALPHANUMERIC_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("alphanumeric pattern is valid"))
}

/// UUID pattern for one version, or for any of v1/v3/v4/v5
pub fn uuid(version: Option<UuidVersion>) -> &'static Regex {
    match version {
        None => UUID_ANY_REGEX.get_or_init(|| uuid_pattern("1345")),
        Some(UuidVersion::V1) => UUID_V1_REGEX.get_or_init(|| uuid_pattern("1")),
        Some(UuidVersion::V3) => UUID_V3_REGEX.get_or_init(|| uuid_pattern("3")),
        Some(UuidVersion::V4) => UUID_V4_REGEX.get_or_init(|| uuid_pattern("4")),
        Some(UuidVersion::V5) => UUID_V5_REGEX.get_or_init(|| uuid_pattern("5")),
    }
}
