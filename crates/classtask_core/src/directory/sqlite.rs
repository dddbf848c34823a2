//! SQLite-backed directory adapter.
//!
//! # Responsibility
//! - Serve `DirectoryProvider` reads from the `users`, `courses` and
//!   `course_students` tables.
//! - Offer seed writes so tests and embedders can populate the directory.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - `enroll_student` is idempotent; enrolling twice is not an error.

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::provider::{DirectoryError, DirectoryProvider, DirectoryResult};
use crate::model::course::{CourseId, CourseRecord};
use crate::model::user::{Role, User, UserId};

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    full_name,
    role,
    active
FROM users";

const COURSE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    code,
    teacher_id,
    active,
    created_at
FROM courses";

/// Directory reads and seed writes over one SQLite connection.
pub struct SqliteDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts an account row.
    pub fn add_user(&self, user: &User) -> DirectoryResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, email, full_name, role, active)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.full_name.as_str(),
                role_to_db(user.role),
                i64::from(user.active),
            ],
        )?;
        Ok(())
    }

    /// Inserts a course row.
    pub fn add_course(&self, course: &CourseRecord) -> DirectoryResult<()> {
        self.conn.execute(
            "INSERT INTO courses (id, name, description, code, teacher_id, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                course.id.to_string(),
                course.name.as_str(),
                course.description.as_deref(),
                course.code.as_str(),
                course.teacher_id.to_string(),
                i64::from(course.active),
                course.created_at,
            ],
        )?;
        Ok(())
    }

    /// Adds a student to a course roster. Repeated calls are no-ops.
    pub fn enroll_student(&self, course_id: CourseId, student_id: UserId) -> DirectoryResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO course_students (course_id, student_id)
             VALUES (?1, ?2);",
            params![course_id.to_string(), student_id.to_string()],
        )?;
        Ok(())
    }

    /// Fetches a course record, if present.
    pub fn get_course(&self, id: CourseId) -> DirectoryResult<Option<CourseRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COURSE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_row(row)?));
        }
        Ok(None)
    }

    fn course_exists(&self, course_id: CourseId) -> DirectoryResult<bool> {
        let found = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1);",
            [course_id.to_string()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found != 0)
    }

    fn user_exists(&self, user_id: UserId) -> DirectoryResult<bool> {
        let found = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.to_string()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found != 0)
    }
}

impl DirectoryProvider for SqliteDirectory<'_> {
    fn resolve_user(&self, id: UserId) -> DirectoryResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_user_row(row);
        }
        Err(DirectoryError::UserNotFound(id))
    }

    fn course_owner(&self, course_id: CourseId) -> DirectoryResult<UserId> {
        let mut stmt = self
            .conn
            .prepare("SELECT teacher_id FROM courses WHERE id = ?1;")?;
        let mut rows = stmt.query([course_id.to_string()])?;
        if let Some(row) = rows.next()? {
            let teacher_text: String = row.get(0)?;
            return parse_uuid(&teacher_text, "courses.teacher_id");
        }
        Err(DirectoryError::CourseNotFound(course_id))
    }

    fn is_enrolled(&self, course_id: CourseId, student_id: UserId) -> DirectoryResult<bool> {
        let found = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM course_students
                WHERE course_id = ?1 AND student_id = ?2
            );",
            params![course_id.to_string(), student_id.to_string()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(found != 0)
    }

    fn enrolled_students(&self, course_id: CourseId) -> DirectoryResult<Vec<UserId>> {
        if !self.course_exists(course_id)? {
            return Err(DirectoryError::CourseNotFound(course_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT student_id FROM course_students
             WHERE course_id = ?1
             ORDER BY student_id;",
        )?;
        let mut rows = stmt.query([course_id.to_string()])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            let student_text: String = row.get(0)?;
            students.push(parse_uuid(&student_text, "course_students.student_id")?);
        }
        Ok(students)
    }

    fn enrolled_courses(&self, student_id: UserId) -> DirectoryResult<Vec<CourseId>> {
        if !self.user_exists(student_id)? {
            return Err(DirectoryError::UserNotFound(student_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT course_id FROM course_students
             WHERE student_id = ?1
             ORDER BY course_id;",
        )?;
        let mut rows = stmt.query([student_id.to_string()])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            let course_text: String = row.get(0)?;
            courses.push(parse_uuid(&course_text, "course_students.course_id")?);
        }
        Ok(courses)
    }
}

fn parse_user_row(row: &Row<'_>) -> DirectoryResult<User> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "users.id")?;

    let role_text: String = row.get("role")?;
    let role = parse_role(&role_text).ok_or_else(|| {
        DirectoryError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(User {
        id,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        role,
        active: row.get::<_, i64>("active")? != 0,
    })
}

fn parse_course_row(row: &Row<'_>) -> DirectoryResult<CourseRecord> {
    let id_text: String = row.get("id")?;
    let teacher_text: String = row.get("teacher_id")?;

    Ok(CourseRecord {
        id: parse_uuid(&id_text, "courses.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        code: row.get("code")?,
        teacher_id: parse_uuid(&teacher_text, "courses.teacher_id")?,
        active: row.get::<_, i64>("active")? != 0,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid(text: &str, column: &str) -> DirectoryResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| DirectoryError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn role_to_db(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Teacher => "teacher",
        Role::Student => "student",
    }
}

fn parse_role(value: &str) -> Option<Role> {
    match value {
        "admin" => Some(Role::Admin),
        "teacher" => Some(Role::Teacher),
        "student" => Some(Role::Student),
        _ => None,
    }
}
