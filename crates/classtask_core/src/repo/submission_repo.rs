//! Submission repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist submissions append-only and answer the "current submission"
//!   and dashboard count queries.
//!
//! # Invariants
//! - Rows are never updated except by `record_grade`; resubmission inserts
//!   a new row.
//! - "Current" means newest `submitted_at`, larger `id` on ties. Every
//!   listing here uses that ordering.
//! - A submission counts as ungraded while `grade` is NULL.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{verify_connection, RepoError, RepoResult};
use crate::model::submission::{
    check_feedback, Submission, SubmissionId, SubmissionStatus,
};
use crate::model::task::TaskId;
use crate::model::user::UserId;

const SUBMISSION_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    student_id,
    comment,
    file_key,
    file_name,
    submitted_at,
    grade,
    feedback,
    status
FROM submissions";

const REQUIRED_SUBMISSION_COLUMNS: &[&str] = &[
    "id",
    "task_id",
    "student_id",
    "comment",
    "file_key",
    "file_name",
    "submitted_at",
    "grade",
    "feedback",
    "status",
];

/// Repository interface for submission persistence.
pub trait SubmissionRepository {
    fn create_submission(&self, submission: &Submission) -> RepoResult<SubmissionId>;
    fn get_submission(&self, id: SubmissionId) -> RepoResult<Option<Submission>>;
    /// Overwrites grade and feedback, marking the row graded.
    fn record_grade(&self, id: SubmissionId, grade: i32, feedback: Option<&str>) -> RepoResult<()>;
    /// The current submission of `student_id` for `task_id`, if any.
    fn latest_for(&self, task_id: TaskId, student_id: UserId) -> RepoResult<Option<Submission>>;
    fn list_by_task(&self, task_id: TaskId) -> RepoResult<Vec<Submission>>;
    fn list_by_student(&self, student_id: UserId) -> RepoResult<Vec<Submission>>;
    fn list_by_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<Submission>>;
    fn count_by_task(&self, task_id: TaskId) -> RepoResult<u64>;
    fn ungraded_count_by_task(&self, task_id: TaskId) -> RepoResult<u64>;
    fn ungraded_count_by_teacher(&self, teacher_id: UserId) -> RepoResult<u64>;
}

/// SQLite-backed submission repository.
pub struct SqliteSubmissionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubmissionRepository<'conn> {
    /// Builds a repository after checking the connection's schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_connection(conn, "submissions", REQUIRED_SUBMISSION_COLUMNS)?;
        Ok(Self { conn })
    }

    fn count_where(&self, sql: &str, key: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(sql, [key], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl SubmissionRepository for SqliteSubmissionRepository<'_> {
    fn create_submission(&self, submission: &Submission) -> RepoResult<SubmissionId> {
        submission.validate()?;

        self.conn.execute(
            "INSERT INTO submissions (
                id,
                task_id,
                student_id,
                comment,
                file_key,
                file_name,
                submitted_at,
                grade,
                feedback,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                submission.id.to_string(),
                submission.task_id.to_string(),
                submission.student_id.to_string(),
                submission.comment.as_deref(),
                submission.file_key.as_deref(),
                submission.file_name.as_deref(),
                submission.submitted_at,
                submission.grade,
                submission.feedback.as_deref(),
                submission_status_to_db(submission.status),
            ],
        )?;

        Ok(submission.id)
    }

    fn get_submission(&self, id: SubmissionId) -> RepoResult<Option<Submission>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBMISSION_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_submission_row(row)?));
        }

        Ok(None)
    }

    fn record_grade(&self, id: SubmissionId, grade: i32, feedback: Option<&str>) -> RepoResult<()> {
        check_feedback(feedback)?;

        let changed = self.conn.execute(
            "UPDATE submissions
             SET
                grade = ?2,
                feedback = ?3,
                status = 'graded'
             WHERE id = ?1;",
            params![id.to_string(), grade, feedback],
        )?;

        if changed == 0 {
            return Err(RepoError::SubmissionNotFound(id));
        }

        Ok(())
    }

    fn latest_for(&self, task_id: TaskId, student_id: UserId) -> RepoResult<Option<Submission>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBMISSION_SELECT_SQL}
             WHERE task_id = ?1 AND student_id = ?2
             ORDER BY submitted_at DESC, id DESC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![task_id.to_string(), student_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_submission_row(row)?));
        }

        Ok(None)
    }

    fn list_by_task(&self, task_id: TaskId) -> RepoResult<Vec<Submission>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBMISSION_SELECT_SQL}
             WHERE task_id = ?1
             ORDER BY submitted_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query([task_id.to_string()])?;
        collect_submissions(&mut rows)
    }

    fn list_by_student(&self, student_id: UserId) -> RepoResult<Vec<Submission>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBMISSION_SELECT_SQL}
             WHERE student_id = ?1
             ORDER BY submitted_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query([student_id.to_string()])?;
        collect_submissions(&mut rows)
    }

    fn list_by_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<Submission>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                s.id,
                s.task_id,
                s.student_id,
                s.comment,
                s.file_key,
                s.file_name,
                s.submitted_at,
                s.grade,
                s.feedback,
                s.status
             FROM submissions s
             JOIN tasks t ON t.id = s.task_id
             JOIN courses c ON c.id = t.course_id
             WHERE c.teacher_id = ?1
             ORDER BY s.submitted_at DESC, s.id DESC;",
        )?;

        let mut rows = stmt.query([teacher_id.to_string()])?;
        collect_submissions(&mut rows)
    }

    fn count_by_task(&self, task_id: TaskId) -> RepoResult<u64> {
        self.count_where(
            "SELECT COUNT(*) FROM submissions WHERE task_id = ?1;",
            &task_id.to_string(),
        )
    }

    fn ungraded_count_by_task(&self, task_id: TaskId) -> RepoResult<u64> {
        self.count_where(
            "SELECT COUNT(*) FROM submissions WHERE task_id = ?1 AND grade IS NULL;",
            &task_id.to_string(),
        )
    }

    fn ungraded_count_by_teacher(&self, teacher_id: UserId) -> RepoResult<u64> {
        self.count_where(
            "SELECT COUNT(*)
             FROM submissions s
             JOIN tasks t ON t.id = s.task_id
             JOIN courses c ON c.id = t.course_id
             WHERE c.teacher_id = ?1 AND s.grade IS NULL;",
            &teacher_id.to_string(),
        )
    }
}

fn collect_submissions(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Submission>> {
    let mut submissions = Vec::new();
    while let Some(row) = rows.next()? {
        submissions.push(parse_submission_row(row)?);
    }
    Ok(submissions)
}

fn parse_submission_row(row: &Row<'_>) -> RepoResult<Submission> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in submissions.id"))
    })?;

    let task_text: String = row.get("task_id")?;
    let task_id = Uuid::parse_str(&task_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{task_text}` in submissions.task_id"
        ))
    })?;

    let student_text: String = row.get("student_id")?;
    let student_id = Uuid::parse_str(&student_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{student_text}` in submissions.student_id"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_submission_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid submission status `{status_text}` in submissions.status"
        ))
    })?;

    let submission = Submission {
        id,
        task_id,
        student_id,
        comment: row.get("comment")?,
        file_key: row.get("file_key")?,
        file_name: row.get("file_name")?,
        submitted_at: row.get("submitted_at")?,
        grade: row.get("grade")?,
        feedback: row.get("feedback")?,
        status,
    };
    submission.validate()?;
    Ok(submission)
}

fn submission_status_to_db(status: SubmissionStatus) -> &'static str {
    match status {
        SubmissionStatus::Submitted => "submitted",
        SubmissionStatus::Graded => "graded",
    }
}

fn parse_submission_status(value: &str) -> Option<SubmissionStatus> {
    match value {
        "submitted" => Some(SubmissionStatus::Submitted),
        "graded" => Some(SubmissionStatus::Graded),
        _ => None,
    }
}
