//! Enquiry Repository — Database access layer
//!
//! Provides all database queries for agent routing and enquiry intake:
//! candidate agents with workload counts, round-robin context, duplicate
//! lookups, enquiry creation, and the conditional assignment update.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::intake::IntakeStore;
use crate::models::{CandidateAgent, Enquiry, EnquirySource, EnquiryStatus, NewEnquiry};

/// Repository for enquiry and routing database operations
pub struct EnquiryRepository {
    pool: PgPool,
}

// ============================================================================
// Private FromRow types — converted to public API types via From
// ============================================================================

#[derive(sqlx::FromRow)]
struct CandidateAgentRow {
    agent_id: Uuid,
    display_name: String,
    office: Option<String>,
    open_lead_count: i64,
    open_enquiry_count: i64,
}

impl From<CandidateAgentRow> for CandidateAgent {
    fn from(r: CandidateAgentRow) -> Self {
        Self {
            agent_id: r.agent_id,
            display_name: r.display_name,
            office: r.office,
            open_lead_count: r.open_lead_count,
            open_enquiry_count: r.open_enquiry_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EnquiryRow {
    enquiry_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    message: Option<String>,
    source: EnquirySource,
    source_ref: Option<String>,
    status: EnquiryStatus,
    assigned_agent_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EnquiryRow> for Enquiry {
    fn from(r: EnquiryRow) -> Self {
        Self {
            enquiry_id: r.enquiry_id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            message: r.message,
            source: r.source,
            source_ref: r.source_ref,
            status: r.status,
            assigned_agent_id: r.assigned_agent_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl EnquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IntakeStore for EnquiryRepository {
    /// Active routable agents with open workload counts, in stable
    /// `agent_id` order (the round-robin policy indexes into this list)
    async fn candidate_agents(&self) -> Result<Vec<CandidateAgent>> {
        let rows = sqlx::query_as::<_, CandidateAgentRow>(
            r#"
            SELECT a.agent_id, a.display_name, a.office,
                   (SELECT COUNT(*) FROM crm.leads l
                     WHERE l.agent_id = a.agent_id
                       AND l.status NOT IN ('won', 'lost')) AS open_lead_count,
                   (SELECT COUNT(*) FROM crm.enquiries e
                     WHERE e.assigned_agent_id = a.agent_id
                       AND e.status NOT IN ('converted', 'spam')) AS open_enquiry_count
            FROM crm.agents a
            WHERE a.active = true
              AND a.role IN ('sales_agent', 'sales_manager')
            ORDER BY a.agent_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list candidate agents")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn last_assigned_agent(&self) -> Result<Option<Uuid>> {
        let row = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT assigned_agent_id FROM crm.enquiries
            WHERE assigned_agent_id IS NOT NULL
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch last assigned agent")?;

        Ok(row)
    }

    async fn find_by_submission_marker(&self, marker: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT enquiry_id FROM crm.enquiries
            WHERE source_ref LIKE '%' || $1 || '%'
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(marker)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to search for submission marker")?;

        Ok(row)
    }

    async fn find_duplicate(
        &self,
        email: &str,
        source: EnquirySource,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Result<Option<Uuid>> {
        let row = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT enquiry_id FROM crm.enquiries
            WHERE email = $1
              AND source = $2
              AND created_at BETWEEN $3 AND $4
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(source)
        .bind(lower)
        .bind(upper)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to search for duplicate enquiry")?;

        Ok(row)
    }

    async fn insert_enquiry(&self, new: &NewEnquiry) -> Result<Uuid> {
        let row = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO crm.enquiries
                (first_name, last_name, email, phone, message,
                 source, source_ref, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'new', $8, $8)
            RETURNING enquiry_id
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.message)
        .bind(new.source)
        .bind(&new.source_ref)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert enquiry")?;

        Ok(row)
    }

    /// Conditional single-row update: terminal enquiries are left untouched
    /// and reported as "no row changed"
    async fn assign_enquiry(&self, enquiry_id: Uuid, agent_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE crm.enquiries
            SET assigned_agent_id = $2, status = 'assigned', updated_at = now()
            WHERE enquiry_id = $1
              AND status NOT IN ('converted', 'spam')
            "#,
        )
        .bind(enquiry_id)
        .bind(agent_id)
        .execute(&self.pool)
        .await
        .context("Failed to assign enquiry")?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_enquiry(&self, enquiry_id: Uuid) -> Result<Option<Enquiry>> {
        let row = sqlx::query_as::<_, EnquiryRow>(
            r#"SELECT * FROM crm.enquiries WHERE enquiry_id = $1"#,
        )
        .bind(enquiry_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch enquiry")?;

        Ok(row.map(Into::into))
    }

    async fn list_enquiries(&self, limit: i64) -> Result<Vec<Enquiry>> {
        let rows = sqlx::query_as::<_, EnquiryRow>(
            r#"
            SELECT * FROM crm.enquiries
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list enquiries")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
