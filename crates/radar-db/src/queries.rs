use crate::models::{
    FinishedInvestmentRow, InvestmentPatch, InvestmentRow, NewFinishedInvestment, NewInvestment,
};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const INVESTMENT_COLUMNS: &str = "id, title, description, type, location, lat, lng, likes, \
     author_name, author_address, approved, created_at";

const FINISHED_COLUMNS: &str = "id, title, description, budget, completed, region, type, \
     location, lat, lng, completed_date, contractor, created_at";

impl Database {
    // -- Investments --

    pub fn insert_investment(&self, new: &NewInvestment) -> Result<InvestmentRow> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO investments (title, description, type, location, lat, lng, author_name, author_address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {INVESTMENT_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                rusqlite::params![
                    new.title,
                    new.description,
                    new.kind,
                    new.location,
                    new.lat,
                    new.lng,
                    new.author_name,
                    new.author_address,
                ],
                investment_row,
            )?;
            Ok(row)
        })
    }

    /// Most-liked first. Unapproved rows are only included when asked for.
    pub fn list_investments(&self, include_unapproved: bool) -> Result<Vec<InvestmentRow>> {
        self.with_conn(|conn| query_investments(conn, include_unapproved))
    }

    pub fn get_investment(&self, id: i64) -> Result<Option<InvestmentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {INVESTMENT_COLUMNS} FROM investments WHERE id = ?1");
            conn.query_row(&sql, [id], investment_row).optional()
        })
    }

    /// Applies the present fields of `patch` in one statement.
    /// Returns `None` if the row does not exist.
    pub fn update_investment(&self, id: i64, patch: &InvestmentPatch) -> Result<Option<InvestmentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE investments SET
                    title          = COALESCE(?2, title),
                    description    = COALESCE(?3, description),
                    type           = COALESCE(?4, type),
                    location       = COALESCE(?5, location),
                    lat            = CASE WHEN ?6 THEN ?7 ELSE lat END,
                    lng            = CASE WHEN ?8 THEN ?9 ELSE lng END,
                    author_name    = COALESCE(?10, author_name),
                    author_address = COALESCE(?11, author_address),
                    approved       = COALESCE(?12, approved)
                 WHERE id = ?1
                 RETURNING {INVESTMENT_COLUMNS}"
            );
            conn.query_row(
                &sql,
                rusqlite::params![
                    id,
                    patch.title,
                    patch.description,
                    patch.kind,
                    patch.location,
                    patch.lat.is_some(),
                    patch.lat.flatten(),
                    patch.lng.is_some(),
                    patch.lng.flatten(),
                    patch.author_name,
                    patch.author_address,
                    patch.approved,
                ],
                investment_row,
            )
            .optional()
        })
    }

    pub fn approve_investment(&self, id: i64) -> Result<Option<InvestmentRow>> {
        self.update_investment(
            id,
            &InvestmentPatch {
                approved: Some(true),
                ..Default::default()
            },
        )
    }

    /// Returns false if nothing was deleted.
    pub fn delete_investment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM investments WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    // -- Like counter --

    /// Atomic `likes + 1`. Returns `None` if the row does not exist.
    pub fn increment_likes(&self, id: i64) -> Result<Option<InvestmentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE investments SET likes = likes + 1 WHERE id = ?1 RETURNING {INVESTMENT_COLUMNS}"
            );
            conn.query_row(&sql, [id], investment_row).optional()
        })
    }

    /// Atomic `likes - 1`, floored at zero. Returns `None` if the row does not exist.
    pub fn decrement_likes(&self, id: i64) -> Result<Option<InvestmentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE investments SET likes = MAX(likes - 1, 0) WHERE id = ?1 RETURNING {INVESTMENT_COLUMNS}"
            );
            conn.query_row(&sql, [id], investment_row).optional()
        })
    }

    // -- Finished investments --

    pub fn insert_finished_investment(&self, new: &NewFinishedInvestment) -> Result<FinishedInvestmentRow> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO finished_investments
                    (title, description, budget, completed, region, type, location, lat, lng, completed_date, contractor)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 RETURNING {FINISHED_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                rusqlite::params![
                    new.title,
                    new.description,
                    new.budget,
                    new.completed,
                    new.region,
                    new.kind,
                    new.location,
                    new.lat,
                    new.lng,
                    new.completed_date,
                    new.contractor,
                ],
                finished_row,
            )?;
            Ok(row)
        })
    }

    pub fn list_finished_investments(&self) -> Result<Vec<FinishedInvestmentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {FINISHED_COLUMNS} FROM finished_investments ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], finished_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_investments(conn: &Connection, include_unapproved: bool) -> Result<Vec<InvestmentRow>> {
    let sql = format!(
        "SELECT {INVESTMENT_COLUMNS} FROM investments
         WHERE approved = 1 OR ?1
         ORDER BY likes DESC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([include_unapproved], investment_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn investment_row(row: &Row<'_>) -> rusqlite::Result<InvestmentRow> {
    Ok(InvestmentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        kind: row.get(3)?,
        location: row.get(4)?,
        lat: row.get(5)?,
        lng: row.get(6)?,
        likes: row.get(7)?,
        author_name: row.get(8)?,
        author_address: row.get(9)?,
        approved: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn finished_row(row: &Row<'_>) -> rusqlite::Result<FinishedInvestmentRow> {
    Ok(FinishedInvestmentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        budget: row.get(3)?,
        completed: row.get(4)?,
        region: row.get(5)?,
        kind: row.get(6)?,
        location: row.get(7)?,
        lat: row.get(8)?,
        lng: row.get(9)?,
        completed_date: row.get(10)?,
        contractor: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
