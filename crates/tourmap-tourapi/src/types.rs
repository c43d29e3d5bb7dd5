//! TourAPI response types.
//!
//! Every JSON response is wrapped as
//! `{"response": {"header": {...}, "body": {...}}}`; some gateways omit the
//! outer `response` key, so [`crate::client`] unwraps it before decoding an
//! [`ApiEnvelope`].
//!
//! ## Observed quirks
//!
//! - `body.items` is an object `{"item": [...]}` when there are results and
//!   the empty string `""` when there are none.
//! - `items.item` is an array for multi-row pages but a bare object when the
//!   page holds exactly one row (always the case for detail endpoints).
//! - Scalars are documented as strings, but `totalCount`, `pageNo`, and some
//!   item fields arrive as JSON numbers depending on the endpoint version.
//!   [`lenient_string`] and [`lenient_u32`] accept either.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `resultCode` value signalling success.
pub const SUCCESS_CODE: &str = "0000";

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub header: ApiHeader,
    #[serde(default)]
    pub body: Option<ApiBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeader {
    #[serde(deserialize_with = "required_string")]
    pub result_code: String,
    #[serde(default)]
    pub result_msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBody {
    #[serde(default)]
    pub items: ItemsField,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub page_no: Option<u32>,
}

/// The `items` field: an object, a blank string, or absent/null.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
pub enum ItemsField {
    Items {
        #[serde(default)]
        item: Option<OneOrMany>,
    },
    Blank(String),
    #[default]
    Missing,
}

impl ItemsField {
    /// Flattens the field into raw item values, in wire order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            ItemsField::Items { item: Some(items) } => items.into_vec(),
            ItemsField::Items { item: None } | ItemsField::Blank(_) | ItemsField::Missing => {
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl OneOrMany {
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            OneOrMany::Many(values) => values,
            OneOrMany::One(Value::Null) => Vec::new(),
            OneOrMany::One(value) => vec![value],
        }
    }
}

/// One row from `areaBasedList2` / `searchKeyword2`.
#[derive(Debug, Deserialize)]
pub struct RawListingItem {
    #[serde(deserialize_with = "required_string")]
    pub contentid: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contenttypeid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub addr1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub addr2: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mapx: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mapy: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstimage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstimage2: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cat1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cat2: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cat3: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub areacode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sigungucode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub modifiedtime: Option<String>,
}

/// One row from `detailPetTour2`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPetTourItem {
    #[serde(deserialize_with = "required_string")]
    pub contentid: String,
    /// Accompaniment type, e.g. `"전 구역 동반가능"` or `"소형견 동반가능"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub acmpy_type_cd: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub acmpy_psbl_cpam: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub acmpy_need_mtr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub etc_acmpy_info: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rela_poses_fclty: Option<String>,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts a string or a number; blank strings and `null` become `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

pub(crate) fn required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a non-empty string"))
}

pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_to_string)
        .and_then(|s| s.parse::<u32>().ok()))
}
