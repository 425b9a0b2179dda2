use chrono::{DateTime, Utc};
use kongre_core::models::{NewSubmission, Submission};
use kongre_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Trait for submission persistence
#[async_trait::async_trait]
pub trait SubmissionRepositoryTrait: Send + Sync {
    /// Insert one submission atomically and return the stored record
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, AppError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    degree: String,
    full_name: String,
    phone: Option<String>,
    email: String,
    university: String,
    title: String,
    presentation: String,
    keywords: Vec<String>,
    summary: String,
    file_name: String,
    file_mime: String,
    file_size: i64,
    file_path: String,
    ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let degree = row
            .degree
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown degree in row: {}", row.degree)))?;
        let presentation = row.presentation.parse().map_err(|_| {
            AppError::Internal(format!("Unknown presentation in row: {}", row.presentation))
        })?;

        Ok(Submission {
            id: row.id,
            fields: NewSubmission {
                degree,
                full_name: row.full_name,
                phone: row.phone,
                email: row.email,
                university: row.university,
                title: row.title,
                presentation,
                keywords: row.keywords,
                summary: row.summary,
                file_name: row.file_name,
                file_mime: row.file_mime,
                file_size: row.file_size,
                file_path: row.file_path,
                ip: row.ip,
                user_agent: row.user_agent,
            },
            created_at: row.created_at,
        })
    }
}

const SUBMISSION_COLUMNS: &str = "id, degree, full_name, phone, email, university, title, \
     presentation, keywords, summary, file_name, file_mime, file_size, file_path, ip, \
     user_agent, created_at";

/// PostgreSQL repository for submissions
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubmissionRepositoryTrait for SubmissionRepository {
    #[tracing::instrument(
        skip(self, submission),
        fields(file_path = %submission.file_path, submission_id = tracing::field::Empty),
        err
    )]
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, AppError> {
        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let query = format!(
            r#"
            INSERT INTO submissions (
                degree, full_name, phone, email, university, title, presentation,
                keywords, summary, file_name, file_mime, file_size, file_path, ip, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            SUBMISSION_COLUMNS
        );

        let row = sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(submission.degree.as_str())
            .bind(&submission.full_name)
            .bind(&submission.phone)
            .bind(&submission.email)
            .bind(&submission.university)
            .bind(&submission.title)
            .bind(submission.presentation.as_str())
            .bind(&submission.keywords)
            .bind(&submission.summary)
            .bind(&submission.file_name)
            .bind(&submission.file_mime)
            .bind(submission.file_size)
            .bind(&submission.file_path)
            .bind(&submission.ip)
            .bind(&submission.user_agent)
            .fetch_one(&self.pool)
            .await?;

        let stored = Submission::try_from(row)?;
        tracing::Span::current().record("submission_id", tracing::field::display(stored.id));
        tracing::info!("Submission stored");
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, AppError> {
        let query = format!("SELECT {} FROM submissions WHERE id = $1", SUBMISSION_COLUMNS);
        let row = sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
