//! Housing projects and user/project associations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::{finite_field, timestamp_date};

/// A housing development offered for financing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_from: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<Value>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub status: String,
}

impl ProjectRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the delivery date
    pub fn with_delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(Value::String(date.format("%Y-%m-%d").to_string()));
        self
    }

    /// Delivery date, if present and parseable
    pub fn delivery_on(&self) -> Option<NaiveDate> {
        self.delivery_date.as_ref().and_then(timestamp_date)
    }

    /// Listed price, falling back to the "from" price
    pub fn listed_price(&self) -> Option<f64> {
        finite_field(self.price.as_ref()).or_else(|| finite_field(self.price_from.as_ref()))
    }
}

/// Link between a user and a project for payment tracking
///
/// Payment history entries hang off an association, not off the simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Association {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            project_id: project_id.into(),
            created_at: None,
        }
    }
}
