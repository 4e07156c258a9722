use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::VerificationRecord;
use crate::normalizer::VerificationFields;

/// Database storage for normalized verification statuses.
pub struct VerificationStorage {
    pool: PgPool,
}

impl VerificationStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or fully overwrites the record for an applicant.
    ///
    /// A single `INSERT ... ON CONFLICT DO UPDATE` writes the complete field
    /// set, so concurrent fetches for the same applicant resolve to
    /// last-writer-wins with no partial merges. `created_at` is preserved on
    /// update; `updated_at` always advances.
    ///
    /// # Arguments
    ///
    /// * `applicant_id` - The provider-issued applicant identifier.
    /// * `fields` - The normalized field set to persist.
    pub async fn upsert(
        &self,
        applicant_id: &str,
        fields: &VerificationFields,
    ) -> Result<VerificationRecord, AppError> {
        let record = sqlx::query_as::<_, VerificationRecord>(
            r#"
            INSERT INTO kyc.verification_statuses (
                applicant_id, country, id_doc_type, image_ids,
                image_review_results, forbidden, partial_completion,
                step_statuses, image_statuses, selfie
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (applicant_id) DO UPDATE
            SET country = EXCLUDED.country,
                id_doc_type = EXCLUDED.id_doc_type,
                image_ids = EXCLUDED.image_ids,
                image_review_results = EXCLUDED.image_review_results,
                forbidden = EXCLUDED.forbidden,
                partial_completion = EXCLUDED.partial_completion,
                step_statuses = EXCLUDED.step_statuses,
                image_statuses = EXCLUDED.image_statuses,
                selfie = EXCLUDED.selfie,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(applicant_id)
        .bind(&fields.country)
        .bind(&fields.id_doc_type)
        .bind(&fields.image_ids)
        .bind(&fields.image_review_results)
        .bind(fields.forbidden)
        .bind(fields.partial_completion)
        .bind(&fields.step_statuses)
        .bind(&fields.image_statuses)
        .bind(&fields.selfie)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        tracing::debug!(
            "Upserted verification status for applicant {}",
            applicant_id
        );
        Ok(record)
    }

    /// Fetches the stored record for an applicant, if any.
    ///
    /// # Arguments
    ///
    /// * `applicant_id` - The provider-issued applicant identifier.
    pub async fn get(&self, applicant_id: &str) -> Result<Option<VerificationRecord>, AppError> {
        let record = sqlx::query_as::<_, VerificationRecord>(
            "SELECT * FROM kyc.verification_statuses WHERE applicant_id = $1 LIMIT 1",
        )
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(record)
    }
}
