use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Investment, VoterMembership};

const MAX_SHORT_FIELD: usize = 200;
const MAX_DESCRIPTION: usize = 5000;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by login and session check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub username: String,
    pub is_admin: bool,
}

// -- Investments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateInvestmentRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub author_name: String,
    pub author_address: String,
}

impl CreateInvestmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        required("title", &self.title, MAX_SHORT_FIELD)?;
        required("description", &self.description, MAX_DESCRIPTION)?;
        required("type", &self.kind, MAX_SHORT_FIELD)?;
        required("location", &self.location, MAX_SHORT_FIELD)?;
        required("authorName", &self.author_name, MAX_SHORT_FIELD)?;
        required("authorAddress", &self.author_address, MAX_SHORT_FIELD)?;
        coordinates(self.lat, self.lng)
    }
}

/// Partial update. Only fields that are present are written; `likes` is not
/// accepted here and only moves through the like endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateInvestmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    /// Absent keeps the stored value, `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub lng: Option<Option<f64>>,
    pub author_name: Option<String>,
    pub author_address: Option<String>,
    pub approved: Option<bool>,
}

impl UpdateInvestmentRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.kind.is_none()
            && self.location.is_none()
            && self.lat.is_none()
            && self.lng.is_none()
            && self.author_name.is_none()
            && self.author_address.is_none()
            && self.approved.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("no valid fields to update".into());
        }
        let optional = [
            ("title", &self.title, MAX_SHORT_FIELD),
            ("description", &self.description, MAX_DESCRIPTION),
            ("type", &self.kind, MAX_SHORT_FIELD),
            ("location", &self.location, MAX_SHORT_FIELD),
            ("authorName", &self.author_name, MAX_SHORT_FIELD),
            ("authorAddress", &self.author_address, MAX_SHORT_FIELD),
        ];
        for (name, value, max) in optional {
            if let Some(value) = value {
                required(name, value, max)?;
            }
        }
        // Pairing is checked against the stored row by the caller
        if let Some(Some(lat)) = self.lat {
            latitude(lat)?;
        }
        if let Some(Some(lng)) = self.lng {
            longitude(lng)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateFinishedInvestmentRequest {
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub completed: bool,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub completed_date: String,
    pub contractor: String,
}

impl CreateFinishedInvestmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        required("title", &self.title, MAX_SHORT_FIELD)?;
        required("description", &self.description, MAX_DESCRIPTION)?;
        required("region", &self.region, MAX_SHORT_FIELD)?;
        required("type", &self.kind, MAX_SHORT_FIELD)?;
        required("location", &self.location, MAX_SHORT_FIELD)?;
        required("completedDate", &self.completed_date, MAX_SHORT_FIELD)?;
        required("contractor", &self.contractor, MAX_SHORT_FIELD)?;
        if self.budget <= 0 {
            return Err("budget must be positive".into());
        }
        coordinates(self.lat, self.lng)
    }
}

// -- Likes --

/// The voter's remembered state, sent with every like request.
/// A missing token is minted by the server and returned in the response.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LikeRequest {
    pub voter_token: Option<String>,
    #[serde(default)]
    pub liked: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub investment: Investment,
    /// Whether the voter now likes this investment.
    pub liked: bool,
    /// Updated membership for the client to persist.
    pub membership: VoterMembership,
}

fn required(name: &str, value: &str, max: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} is required"));
    }
    if trimmed.chars().count() > max {
        return Err(format!("{name} exceeds {max} characters"));
    }
    Ok(())
}

fn coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), String> {
    match (lat, lng) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            latitude(lat)?;
            longitude(lng)
        }
        _ => Err("lat and lng must be given together".into()),
    }
}

fn latitude(lat: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err("lat out of range".into());
    }
    Ok(())
}

fn longitude(lng: f64) -> Result<(), String> {
    if !(-180.0..=180.0).contains(&lng) {
        return Err("lng out of range".into());
    }
    Ok(())
}

fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<f64>>, D::Error> {
    Option::<f64>::deserialize(deserializer).map(Some)
}
