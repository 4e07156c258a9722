use std::env;
use uuid::Uuid;

use rust_kyc_api::db::Database;
use rust_kyc_api::normalizer;
use rust_kyc_api::storage::VerificationStorage;
use serde_json::json;

/// Integration smoke test for verification status storage.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn upsert_then_get_round_trip() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;

    // Make sure the schema exists on a fresh test database.
    sqlx::query("CREATE SCHEMA IF NOT EXISTS kyc")
        .execute(&db.pool)
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kyc.verification_statuses (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            applicant_id TEXT NOT NULL UNIQUE,
            country TEXT NOT NULL DEFAULT 'Unknown',
            id_doc_type TEXT NOT NULL DEFAULT 'Unknown',
            image_ids JSONB NOT NULL DEFAULT '[]'::jsonb,
            image_review_results JSONB NOT NULL DEFAULT '{}'::jsonb,
            forbidden BOOLEAN NOT NULL DEFAULT false,
            partial_completion BOOLEAN,
            step_statuses JSONB,
            image_statuses JSONB,
            selfie TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(&db.pool)
    .await?;

    let storage = VerificationStorage::new(db.pool.clone());

    // Unique applicant id per run to avoid conflicts on repeated runs.
    let applicant_id = format!("test-apl-{}", Uuid::new_v4().simple());

    let payload = json!({
        "IDENTITY": {
            "country": "USA",
            "idDocType": "PASSPORT",
            "imageIds": ["img-1"],
            "forbidden": false
        },
        "SELFIE": {"status": "approved"}
    });
    let fields = normalizer::normalize(&payload).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let inserted = storage
        .upsert(&applicant_id, &fields)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(inserted.country, "USA");
    assert_eq!(inserted.id_doc_type, "PASSPORT");

    // Round trip: get returns exactly what normalize produced.
    let fetched = storage
        .get(&applicant_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .ok_or_else(|| anyhow::anyhow!("record missing after upsert"))?;
    assert_eq!(fetched.country, fields.country);
    assert_eq!(fetched.id_doc_type, fields.id_doc_type);
    assert_eq!(fetched.image_ids, fields.image_ids);
    assert_eq!(fetched.forbidden, fields.forbidden);
    assert_eq!(fetched.selfie, fields.selfie);

    // Re-upsert with new data: same row, derived fields overwritten,
    // created_at preserved.
    let second = normalizer::normalize(&json!({
        "IDENTITY": {"country": "BRA", "forbidden": true}
    }))
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let updated = storage
        .upsert(&applicant_id, &second)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(updated.id, inserted.id);
    assert_eq!(updated.country, "BRA");
    assert!(updated.forbidden);
    assert_eq!(updated.created_at, inserted.created_at);
    assert!(updated.updated_at >= inserted.updated_at);

    // Unknown ids are a distinct not-found, not an error.
    let missing = storage
        .get("test-apl-does-not-exist")
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(missing.is_none());

    Ok(())
}
