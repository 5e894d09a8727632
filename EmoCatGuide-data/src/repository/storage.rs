use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::cat_card::CatCardRecord;
use crate::models::health_report::HealthReportRecord;
use crate::models::psychology_test::PsychologyTestRecord;
use crate::models::user::UserRecord;
use super::errors::RepositoryError;

const USER_COLUMNS: &str = "id, email, password_hash, gender, created_at, last_login";

const HEALTH_REPORT_COLUMNS: &str = "id, user_id, filename, storage_path, file_type, upload_time, \
     analysis_status, report_date, vital_stats, health_score, warnings";

const PSYCHOLOGY_TEST_COLUMNS: &str = "id, user_id, question1, question2, submit_time";

const CAT_CARD_COLUMNS: &str = "id, user_id, cat, title, image_url, feedback, mood, health_score, created_at";

/// Database storage operations for all tables
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a user. A second account for the same email is a conflict.
    pub async fn store_user(pool: &DatabasePool, user: &UserRecord) -> Result<(), RepositoryError> {
        debug!("Storing user in database: id={}", user.id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        conn.execute(
            "INSERT INTO users (id, email, password_hash, gender, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &user.id,
                &user.email,
                &user.password_hash,
                &user.gender,
                &user.created_at,
                &user.last_login,
            ],
        ).map_err(|e| {
            if is_constraint_violation(&e) {
                RepositoryError::Conflict(format!("email already registered: {}", user.email))
            } else {
                RepositoryError::Sqlite(e)
            }
        })?;

        Ok(())
    }

    pub async fn get_user_by_email(pool: &DatabasePool, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        debug!("Getting user by email from database");

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let user = conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE", USER_COLUMNS),
            [email],
            map_user,
        ).optional()?;

        Ok(user)
    }

    pub async fn get_user_by_id(pool: &DatabasePool, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        debug!("Getting user by ID from database: id={}", id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let user = conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [id],
            map_user,
        ).optional()?;

        Ok(user)
    }

    pub async fn update_last_login(pool: &DatabasePool, id: &str, timestamp: &str) -> Result<(), RepositoryError> {
        debug!("Updating last login in database: id={}", id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let updated = conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![timestamp, id],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Insert a health report with its analysis results
    pub async fn store_health_report(pool: &DatabasePool, report: &HealthReportRecord) -> Result<(), RepositoryError> {
        debug!("Storing health report in database: id={}", report.id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let vital_stats = report.vital_stats
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let warnings = serde_json::to_string(&report.warnings)?;

        conn.execute(
            "INSERT INTO health_reports
             (id, user_id, filename, storage_path, file_type, upload_time,
              analysis_status, report_date, vital_stats, health_score, warnings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &report.id,
                &report.user_id,
                &report.filename,
                &report.storage_path,
                &report.file_type,
                &report.upload_time,
                &report.analysis_status,
                &report.report_date,
                vital_stats,
                report.health_score.map(i64::from),
                warnings,
            ],
        ).map_err(|e| {
            if is_constraint_violation(&e) {
                RepositoryError::Conflict(format!("user {} already has a health report", report.user_id))
            } else {
                RepositoryError::Sqlite(e)
            }
        })?;

        Ok(())
    }

    /// Reports of one user, newest first
    pub async fn list_health_reports(pool: &DatabasePool, user_id: &str) -> Result<Vec<HealthReportRecord>, RepositoryError> {
        debug!("Listing health reports from database: user_id={}", user_id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM health_reports WHERE user_id = ?1 ORDER BY upload_time DESC",
            HEALTH_REPORT_COLUMNS
        ))?;

        let rows = stmt.query_map([user_id], read_health_report_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_record()?);
        }

        Ok(result)
    }

    pub async fn get_health_report(pool: &DatabasePool, id: &str) -> Result<Option<HealthReportRecord>, RepositoryError> {
        debug!("Getting health report by ID from database: id={}", id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let row = conn.query_row(
            &format!("SELECT {} FROM health_reports WHERE id = ?1", HEALTH_REPORT_COLUMNS),
            [id],
            read_health_report_row,
        ).optional()?;

        row.map(HealthReportRow::into_record).transpose()
    }

    pub async fn store_psychology_test(pool: &DatabasePool, test: &PsychologyTestRecord) -> Result<(), RepositoryError> {
        debug!("Storing psychology test in database: id={}", test.id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        conn.execute(
            "INSERT INTO psychology_tests (id, user_id, question1, question2, submit_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&test.id, &test.user_id, &test.question1, &test.question2, &test.submit_time],
        )?;

        Ok(())
    }

    /// Submissions of one user, newest first
    pub async fn list_psychology_tests(pool: &DatabasePool, user_id: &str) -> Result<Vec<PsychologyTestRecord>, RepositoryError> {
        debug!("Listing psychology tests from database: user_id={}", user_id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM psychology_tests WHERE user_id = ?1 ORDER BY submit_time DESC",
            PSYCHOLOGY_TEST_COLUMNS
        ))?;

        let tests = stmt.query_map([user_id], |row| {
            Ok(PsychologyTestRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                question1: row.get(2)?,
                question2: row.get(3)?,
                submit_time: row.get(4)?,
            })
        })?;

        let mut result = Vec::new();
        for test in tests {
            result.push(test?);
        }

        Ok(result)
    }

    pub async fn store_cat_card(pool: &DatabasePool, card: &CatCardRecord) -> Result<(), RepositoryError> {
        debug!("Storing cat card in database: id={}", card.id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        conn.execute(
            "INSERT INTO cat_cards
             (id, user_id, cat, title, image_url, feedback, mood, health_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &card.id,
                &card.user_id,
                &card.cat,
                &card.title,
                &card.image_url,
                &card.feedback,
                &card.mood,
                card.health_score.map(i64::from),
                &card.created_at,
            ],
        )?;

        Ok(())
    }

    /// Cards of one user, newest first
    pub async fn list_cat_cards(pool: &DatabasePool, user_id: &str) -> Result<Vec<CatCardRecord>, RepositoryError> {
        debug!("Listing cat cards from database: user_id={}", user_id);

        let DatabasePool::SQLite(pool) = pool;
        let conn = pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cat_cards WHERE user_id = ?1 ORDER BY created_at DESC",
            CAT_CARD_COLUMNS
        ))?;

        let cards = stmt.query_map([user_id], |row| {
            Ok(CatCardRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                cat: row.get(2)?,
                title: row.get(3)?,
                image_url: row.get(4)?,
                feedback: row.get(5)?,
                mood: row.get(6)?,
                health_score: row.get::<_, Option<i64>>(7)?.map(clamp_score),
                created_at: row.get(8)?,
            })
        })?;

        let mut result = Vec::new();
        for card in cards {
            result.push(card?);
        }

        Ok(result)
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        gender: row.get(3)?,
        created_at: row.get(4)?,
        last_login: row.get(5)?,
    })
}

/// Raw health report row before the JSON columns are decoded
struct HealthReportRow {
    record: HealthReportRecord,
    vital_stats: Option<String>,
    warnings: String,
}

impl HealthReportRow {
    fn into_record(self) -> Result<HealthReportRecord, RepositoryError> {
        let mut record = self.record;
        record.vital_stats = self.vital_stats
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        record.warnings = serde_json::from_str(&self.warnings)?;
        Ok(record)
    }
}

fn read_health_report_row(row: &Row<'_>) -> rusqlite::Result<HealthReportRow> {
    Ok(HealthReportRow {
        record: HealthReportRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            filename: row.get(2)?,
            storage_path: row.get(3)?,
            file_type: row.get(4)?,
            upload_time: row.get(5)?,
            analysis_status: row.get(6)?,
            report_date: row.get(7)?,
            vital_stats: None,
            health_score: row.get::<_, Option<i64>>(9)?.map(clamp_score),
            warnings: Vec::new(),
        },
        vital_stats: row.get(8)?,
        warnings: row.get(10)?,
    })
}

fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
