//! Append-only customer reviews.

use crate::error::{MarketError, MarketResult};
use crate::loose;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Author name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(alias = "review")]
    pub text: String,

    /// 1 to 5 stars, half stars allowed
    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn validate(&self) -> MarketResult<()> {
        if self.name.trim().is_empty() || self.text.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "review needs a name and a text".to_string(),
            ));
        }
        if let Some(rating) = self.rating {
            if !(1.0..=5.0).contains(&rating) {
                return Err(MarketError::InvalidRequest(format!(
                    "rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }
        Ok(())
    }
}
