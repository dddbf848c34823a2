//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks and answer the course/teacher/upcoming queries the
//!   services need.
//!
//! # Invariants
//! - `updated_at` is stamped here on every successful update.
//! - Deleting a task removes its submissions through the schema cascade.
//! - Listings order by due date, then id, so they are reproducible.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

use super::{verify_connection, RepoError, RepoResult};
use crate::model::course::CourseId;
use crate::model::now_epoch_ms;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::user::UserId;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    course_id,
    title,
    description,
    due_at,
    points,
    status,
    created_at,
    updated_at
FROM tasks";

const REQUIRED_TASK_COLUMNS: &[&str] = &[
    "id",
    "course_id",
    "title",
    "description",
    "due_at",
    "points",
    "status",
    "created_at",
    "updated_at",
];

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn list_by_course(&self, course_id: CourseId) -> RepoResult<Vec<Task>>;
    fn list_by_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<Task>>;
    /// Tasks in any of `course_ids` due strictly after `after`.
    fn list_upcoming(&self, course_ids: &[CourseId], after: i64) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Builds a repository after checking the connection's schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_connection(conn, "tasks", REQUIRED_TASK_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                course_id,
                title,
                description,
                due_at,
                points,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                task.id.to_string(),
                task.course_id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.due_at,
                task.points,
                task_status_to_db(task.status),
                task.created_at,
                task.updated_at,
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                due_at = ?3,
                points = ?4,
                status = ?5,
                updated_at = ?6
             WHERE id = ?7;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.due_at,
                task.points,
                task_status_to_db(task.status),
                now_epoch_ms(),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn list_by_course(&self, course_id: CourseId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE course_id = ?1
             ORDER BY due_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([course_id.to_string()])?;
        collect_tasks(&mut rows)
    }

    fn list_by_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.id,
                t.course_id,
                t.title,
                t.description,
                t.due_at,
                t.points,
                t.status,
                t.created_at,
                t.updated_at
             FROM tasks t
             JOIN courses c ON c.id = t.course_id
             WHERE c.teacher_id = ?1
             ORDER BY t.due_at ASC, t.id ASC;",
        )?;

        let mut rows = stmt.query([teacher_id.to_string()])?;
        collect_tasks(&mut rows)
    }

    fn list_upcoming(&self, course_ids: &[CourseId], after: i64) -> RepoResult<Vec<Task>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; course_ids.len()].join(", ");
        let sql = format!(
            "{TASK_SELECT_SQL}
             WHERE course_id IN ({placeholders})
               AND due_at > ?
             ORDER BY due_at ASC, id ASC;"
        );

        let mut bind_values: Vec<Value> = course_ids
            .iter()
            .map(|id| Value::Text(id.to_string()))
            .collect();
        bind_values.push(Value::Integer(after));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        collect_tasks(&mut rows)
    }
}

fn collect_tasks(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Task>> {
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let course_text: String = row.get("course_id")?;
    let course_id = Uuid::parse_str(&course_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{course_text}` in tasks.course_id"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_task_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let task = Task {
        id,
        course_id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_at: row.get("due_at")?,
        points: row.get("points")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn task_status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Active => "active",
        TaskStatus::Closed => "closed",
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "pending" => Some(TaskStatus::Pending),
        "active" => Some(TaskStatus::Active),
        "closed" => Some(TaskStatus::Closed),
        _ => None,
    }
}
