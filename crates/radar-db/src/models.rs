/// Database row types — these map directly to SQLite rows.
/// Distinct from radar-types API models to keep the DB layer independent.

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub likes: i64,
    pub author_name: String,
    pub author_address: String,
    pub approved: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinishedInvestmentRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub completed: bool,
    pub region: String,
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub completed_date: String,
    pub contractor: String,
    pub created_at: String,
}

/// Insert payload for a citizen suggestion. New rows start unapproved with
/// zero likes.
#[derive(Debug, Clone, Default)]
pub struct NewInvestment {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub author_name: String,
    pub author_address: String,
}

/// Column-wise partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct InvestmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub location: Option<String>,
    /// `Some(None)` clears the coordinate.
    pub lat: Option<Option<f64>>,
    pub lng: Option<Option<f64>>,
    pub author_name: Option<String>,
    pub author_address: Option<String>,
    pub approved: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFinishedInvestment {
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub completed: bool,
    pub region: String,
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub completed_date: String,
    pub contractor: String,
}
