//! Postgres incident store.
//!
//! Spatial predicates are explicit lon/lat range comparisons; the vote
//! increment and threshold flip are a single conditional UPDATE so two
//! concurrent invalidations can never lose an increment or miss the flip.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use roadpulse_common::{BoundingBox, GeoPoint, RoadPulseError};

use crate::incident::{Incident, INVALIDATION_THRESHOLD};
use crate::repo::{IncidentRepo, ReportFilter};

const COLUMNS: &str = "id, source, incident_type, lon, lat, description, severity, \
     active, expires_at, created_at, updated_at, reporter_id, validations, invalidations";

#[derive(Clone)]
pub struct PgIncidentStore {
    pool: PgPool,
}

impl PgIncidentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent schema setup. The `(incident_type, active)` index backs
    /// both the matcher's scan and the query service's filtering.
    pub async fn migrate(&self) -> Result<(), RoadPulseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS incidents (
                id            UUID              PRIMARY KEY,
                source        TEXT              NOT NULL,
                incident_type TEXT              NOT NULL,
                lon           DOUBLE PRECISION  NOT NULL,
                lat           DOUBLE PRECISION  NOT NULL,
                description   TEXT              NOT NULL,
                severity      TEXT              NOT NULL,
                active        BOOLEAN           NOT NULL,
                expires_at    TIMESTAMPTZ       NOT NULL,
                created_at    TIMESTAMPTZ       NOT NULL,
                updated_at    TIMESTAMPTZ       NOT NULL,
                reporter_id   TEXT,
                validations   INTEGER,
                invalidations INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_incidents_type_active \
             ON incidents (incident_type, active)",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}

#[async_trait]
impl IncidentRepo for PgIncidentStore {
    async fn insert(&self, incident: &Incident) -> Result<(), RoadPulseError> {
        sqlx::query(
            r#"
            INSERT INTO incidents (id, source, incident_type, lon, lat, description,
                severity, active, expires_at, created_at, updated_at,
                reporter_id, validations, invalidations)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(incident.id)
        .bind(incident.source.to_string())
        .bind(incident.incident_type.to_string())
        .bind(incident.location.lon)
        .bind(incident.location.lat)
        .bind(&incident.description)
        .bind(incident.severity.to_string())
        .bind(incident.active)
        .bind(incident.expires_at)
        .bind(incident.created_at)
        .bind(incident.updated_at)
        .bind(&incident.reporter_id)
        .bind(incident.validations)
        .bind(incident.invalidations)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, RoadPulseError> {
        sqlx::query_as::<_, Incident>(&format!(
            "SELECT {COLUMNS} FROM incidents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn active_vendor_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<Incident>, RoadPulseError> {
        sqlx::query_as::<_, Incident>(&format!(
            r#"
            SELECT {COLUMNS} FROM incidents
            WHERE source = 'vendor' AND active = TRUE
              AND lon BETWEEN $1 AND $3
              AND lat BETWEEN $2 AND $4
            "#
        ))
        .bind(bbox.min_lon)
        .bind(bbox.min_lat)
        .bind(bbox.max_lon)
        .bind(bbox.max_lat)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn user_reports(&self, filter: &ReportFilter) -> Result<Vec<Incident>, RoadPulseError> {
        // Optional predicates collapse to TRUE when the filter is absent.
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM incidents
            WHERE source = 'user'
              AND ($1::float8 IS NULL OR (lon BETWEEN $1 AND $3 AND lat BETWEEN $2 AND $4))
              AND ($5::text IS NULL OR reporter_id = $5)
              AND ($6::boolean IS NULL OR active = $6)
              AND ($7::text IS NULL OR incident_type = $7)
            ORDER BY created_at DESC
            "#
        );
        let mut rows = sqlx::query_as::<_, Incident>(&sql);
        rows = match filter.bbox {
            Some(b) => rows
                .bind(Some(b.min_lon))
                .bind(Some(b.min_lat))
                .bind(Some(b.max_lon))
                .bind(Some(b.max_lat)),
            None => rows
                .bind(None::<f64>)
                .bind(None::<f64>)
                .bind(None::<f64>)
                .bind(None::<f64>),
        };
        rows.bind(filter.reporter_id.as_deref())
            .bind(filter.active)
            .bind(filter.incident_type.map(|t| t.to_string()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Incident, RoadPulseError> {
        sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents SET active = $2, updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RoadPulseError::NotFound(id))
    }

    async fn record_validation(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents \
             SET validations = validations + 1, updated_at = now() \
             WHERE id = $1 AND source = 'user' RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RoadPulseError::NotFound(id))
    }

    async fn record_invalidation(&self, id: Uuid) -> Result<Incident, RoadPulseError> {
        // Increment and threshold flip in one statement. `active AND ...`
        // keeps the transition one-directional.
        sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents \
             SET invalidations = invalidations + 1, \
                 active = active AND (invalidations + 1 < $2), \
                 updated_at = now() \
             WHERE id = $1 AND source = 'user' RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(INVALIDATION_THRESHOLD)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RoadPulseError::NotFound(id))
    }
}

fn db_err(err: sqlx::Error) -> RoadPulseError {
    RoadPulseError::Database(err.to_string())
}

impl<'r> sqlx::FromRow<'r, PgRow> for Incident {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Incident {
            id: row.try_get("id")?,
            source: parse_enum(row, "source")?,
            incident_type: parse_enum(row, "incident_type")?,
            location: GeoPoint::new(row.try_get("lon")?, row.try_get("lat")?),
            description: row.try_get("description")?,
            severity: parse_enum(row, "severity")?,
            active: row.try_get("active")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            reporter_id: row.try_get("reporter_id")?,
            validations: row.try_get("validations")?,
            invalidations: row.try_get("invalidations")?,
        })
    }
}

fn parse_enum<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}
