//! PostgreSQL-backed patient store
//!
//! Production implementation of the PatientStore trait. Email uniqueness is
//! enforced by a unique index so concurrent registrations cannot race past
//! the service-level duplicate check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::domain::{Patient, PatientId, ProfileUpdate, Role};
use crate::infra::{PatientStore, Result, StoreError};

/// Row shape shared by every SELECT/RETURNING in this module.
type PatientRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<f64>,
    Option<f64>,
    Option<String>,
    DateTime<Utc>,
);

const PATIENT_COLUMNS: &str = "id, email, password_hash, role, name, last_name, \
     phone, address, gender, age, weight, height, blood_type, created_at";

/// PostgreSQL-backed patient store
pub struct PgPatientStore {
    pool: PgPool,
}

impl PgPatientStore {
    /// Create a new PostgreSQL patient store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema for patient records
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY,
                email VARCHAR(255) NOT NULL,
                password_hash TEXT NOT NULL,
                role VARCHAR(16) NOT NULL DEFAULT 'PATIENT',
                name VARCHAR(120) NOT NULL,
                last_name VARCHAR(120) NOT NULL,
                phone VARCHAR(40),
                address TEXT,
                gender VARCHAR(20),
                age INTEGER,
                weight DOUBLE PRECISION,
                height DOUBLE PRECISION,
                blood_type VARCHAR(8),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_email
            ON patients (email)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert a database row to a Patient
    fn row_to_patient(row: PatientRow) -> Patient {
        let (
            id,
            email,
            password_hash,
            role,
            name,
            last_name,
            phone,
            address,
            gender,
            age,
            weight,
            height,
            blood_type,
            created_at,
        ) = row;

        // Unknown role strings fall back to the least-privileged role.
        let role = role.parse::<Role>().unwrap_or_default();

        Patient {
            id: PatientId::from_uuid(id),
            email,
            password_hash,
            role,
            name,
            last_name,
            phone,
            address,
            gender,
            age,
            weight,
            height,
            blood_type,
            created_at,
        }
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Patient>> {
        let row: Option<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::row_to_patient))
    }

    async fn find_by_id(&self, id: &PatientId) -> Result<Option<Patient>> {
        let row: Option<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::row_to_patient))
    }

    async fn insert(&self, patient: &Patient) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO patients
                (id, email, password_hash, role, name, last_name,
                 phone, address, gender, age, weight, height, blood_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(patient.id.as_uuid())
        .bind(&patient.email)
        .bind(&patient.password_hash)
        .bind(patient.role.as_str())
        .bind(&patient.name)
        .bind(&patient.last_name)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(&patient.gender)
        .bind(patient.age)
        .bind(patient.weight)
        .bind(patient.height)
        .bind(&patient.blood_type)
        .bind(patient.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateEmail(patient.email.clone()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    async fn update_profile(&self, id: &PatientId, update: &ProfileUpdate) -> Result<Patient> {
        let row: Option<PatientRow> = sqlx::query_as(&format!(
            r#"
            UPDATE patients SET
                phone = COALESCE($2, phone),
                address = COALESCE($3, address),
                gender = COALESCE($4, gender),
                age = COALESCE($5, age),
                weight = COALESCE($6, weight),
                height = COALESCE($7, height),
                blood_type = COALESCE($8, blood_type)
            WHERE id = $1
            RETURNING {PATIENT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.gender)
        .bind(update.age)
        .bind(update.weight)
        .bind(update.height)
        .bind(&update.blood_type)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_patient)
            .ok_or(StoreError::PatientNotFound(*id))
    }

    async fn list(&self) -> Result<Vec<Patient>> {
        let rows: Vec<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at ASC, email ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_patient).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn connect_db() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .ok()
    }

    // Needs a live PostgreSQL; run with `cargo test -- --ignored` and
    // DATABASE_URL pointing at a disposable database.
    #[tokio::test]
    #[ignore]
    async fn test_insert_fetch_update_round_trip() {
        let Some(pool) = connect_db().await else {
            eprintln!("DATABASE_URL not set; skipping");
            return;
        };

        let store = PgPatientStore::new(pool);
        store.initialize().await.unwrap();

        // Unique address per run so reruns survive the unique index.
        let email = format!("rt-{}@clinic.example", Uuid::new_v4());
        let patient = Patient::new(email.as_str(), "hash", Role::Patient, "Ana", "Souza");
        store.insert(&patient).await.unwrap();

        let found = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, patient.id);
        assert_eq!(found.email, email);
        assert_eq!(found.role, Role::Patient);

        // Same email under a fresh id must trip the unique index.
        let dup = Patient::new(email.as_str(), "hash2", Role::Patient, "Eva", "Lima");
        let err = store.insert(&dup).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)), "got {err:?}");

        let update = ProfileUpdate {
            phone: Some("+55-11-5555-0100".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = store.update_profile(&patient.id, &update).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+55-11-5555-0100"));
        assert_eq!(updated.name, "Ana");

        let by_id = store.find_by_id(&patient.id).await.unwrap().unwrap();
        assert_eq!(by_id.phone.as_deref(), Some("+55-11-5555-0100"));
    }
}
