//! Fixed code tables shared by the API client and the feed controller.
//!
//! `ContentType` mirrors the eight `contentTypeId` values TourAPI publishes;
//! `AreaCode` wraps the top-level `areaCode` values (metropolitan cities and
//! provinces).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("unknown area code: {0}")]
    UnknownAreaCode(String),

    #[error("unknown sort mode: {0} (expected default, name, or latest)")]
    UnknownSortMode(String),
}

/// Category of a listing record (`contenttypeid` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    TouristSpot,
    CulturalFacility,
    Festival,
    TravelCourse,
    Leisure,
    Lodging,
    Shopping,
    Restaurant,
    Unknown,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        ContentType::TouristSpot,
        ContentType::CulturalFacility,
        ContentType::Festival,
        ContentType::TravelCourse,
        ContentType::Leisure,
        ContentType::Lodging,
        ContentType::Shopping,
        ContentType::Restaurant,
    ];

    /// Maps a wire code to a content type. Unrecognised codes become
    /// [`ContentType::Unknown`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "12" => ContentType::TouristSpot,
            "14" => ContentType::CulturalFacility,
            "15" => ContentType::Festival,
            "25" => ContentType::TravelCourse,
            "28" => ContentType::Leisure,
            "32" => ContentType::Lodging,
            "38" => ContentType::Shopping,
            "39" => ContentType::Restaurant,
            _ => ContentType::Unknown,
        }
    }

    #[must_use]
    pub fn code(self) -> Option<&'static str> {
        match self {
            ContentType::TouristSpot => Some("12"),
            ContentType::CulturalFacility => Some("14"),
            ContentType::Festival => Some("15"),
            ContentType::TravelCourse => Some("25"),
            ContentType::Leisure => Some("28"),
            ContentType::Lodging => Some("32"),
            ContentType::Shopping => Some("38"),
            ContentType::Restaurant => Some("39"),
            ContentType::Unknown => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ContentType::TouristSpot => "관광지",
            ContentType::CulturalFacility => "문화시설",
            ContentType::Festival => "축제공연행사",
            ContentType::TravelCourse => "여행코스",
            ContentType::Leisure => "레포츠",
            ContentType::Lodging => "숙박",
            ContentType::Shopping => "쇼핑",
            ContentType::Restaurant => "음식점",
            ContentType::Unknown => "기타",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the numeric wire code (`"12"`) or the snake-case name
/// (`"tourist_spot"`).
impl FromStr for ContentType {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let by_code = ContentType::from_code(s);
        if by_code != ContentType::Unknown {
            return Ok(by_code);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "tourist_spot" => Ok(ContentType::TouristSpot),
            "cultural_facility" => Ok(ContentType::CulturalFacility),
            "festival" => Ok(ContentType::Festival),
            "travel_course" => Ok(ContentType::TravelCourse),
            "leisure" => Ok(ContentType::Leisure),
            "lodging" => Ok(ContentType::Lodging),
            "shopping" => Ok(ContentType::Shopping),
            "restaurant" => Ok(ContentType::Restaurant),
            _ => Err(CodeError::UnknownContentType(s.to_string())),
        }
    }
}

const AREAS: &[(&str, &str)] = &[
    ("1", "서울"),
    ("2", "인천"),
    ("3", "대전"),
    ("4", "대구"),
    ("5", "광주"),
    ("6", "부산"),
    ("7", "울산"),
    ("8", "세종"),
    ("31", "경기"),
    ("32", "강원"),
    ("33", "충북"),
    ("34", "충남"),
    ("35", "경북"),
    ("36", "경남"),
    ("37", "전북"),
    ("38", "전남"),
    ("39", "제주"),
];

/// A validated top-level region code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AreaCode(String);

impl AreaCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        AREAS
            .iter()
            .find(|(code, _)| *code == self.0)
            .map_or("", |(_, name)| name)
    }

    pub fn all() -> impl Iterator<Item = AreaCode> {
        AREAS.iter().map(|(code, _)| AreaCode((*code).to_string()))
    }
}

impl FromStr for AreaCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AREAS
            .iter()
            .find(|(code, name)| *code == trimmed || *name == trimmed)
            .map(|(code, _)| AreaCode((*code).to_string()))
            .ok_or_else(|| CodeError::UnknownAreaCode(s.to_string()))
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// How the visible list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Remote order, untouched.
    #[default]
    Default,
    /// Ascending by display name.
    Name,
    /// Descending by last-modified timestamp.
    Latest,
}

impl SortMode {
    /// The `arrange` parameter that asks the remote for the same order, so
    /// appended pages continue the sequence of earlier ones.
    #[must_use]
    pub fn arrange_param(self) -> Option<&'static str> {
        match self {
            SortMode::Default => None,
            SortMode::Name => Some("A"),
            SortMode::Latest => Some("C"),
        }
    }
}

impl FromStr for SortMode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(SortMode::Default),
            "name" => Ok(SortMode::Name),
            "latest" => Ok(SortMode::Latest),
            _ => Err(CodeError::UnknownSortMode(s.to_string())),
        }
    }
}
