//! Data Transfer Objects

use serde::Deserialize;

/// Raw list parameters as they arrive in the query string
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsParams {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub severity: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}
