//! Task lifecycle service.
//!
//! # Responsibility
//! - Create, edit, delete and list tasks on behalf of an acting user.
//! - Fan out assignment notifications to the enrolled roster on creation.
//!
//! # Invariants
//! - Only the owning teacher mutates a course's tasks.
//! - Creation notifies every currently-enrolled student, best-effort;
//!   edits and deletions notify nobody.
//! - Notification dispatch runs after the task row is committed and never
//!   fails the operation.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::access;
use crate::directory::{DirectoryError, DirectoryProvider};
use crate::model::course::CourseId;
use crate::model::notification::NotificationRequest;
use crate::model::now_epoch_ms;
use crate::model::task::{Task, TaskChanges, TaskDraft, TaskId, TaskValidationError};
use crate::model::user::UserId;
use crate::notify::{self, DeliveryReport, NotificationSink};
use crate::repo::{RepoError, TaskRepository};
use crate::service::ErrorKind;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Referenced course does not exist.
    CourseNotFound(CourseId),
    /// Acting user does not exist.
    UserNotFound(UserId),
    /// Actor lacks the teacher role.
    NotTeacher(UserId),
    /// Actor is a teacher but does not own the course.
    NotCourseOwner { actor: UserId, course_id: CourseId },
    /// Task field constraint violated.
    Validation(TaskValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Directory lookup failure.
    Directory(DirectoryError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl TaskServiceError {
    /// Coarse classification for transport mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::CourseNotFound(_) | Self::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::NotTeacher(_) | Self::NotCourseOwner { .. } => ErrorKind::Forbidden,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Repo(_) | Self::Directory(_) | Self::InconsistentState(_) => ErrorKind::Internal,
        }
    }
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::NotTeacher(id) => {
                write!(f, "user {id} may not create tasks: teacher role required")
            }
            Self::NotCourseOwner { actor, course_id } => {
                write!(f, "user {actor} does not own course {course_id}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::TaskValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DirectoryError> for TaskServiceError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::UserNotFound(id) => Self::UserNotFound(id),
            DirectoryError::CourseNotFound(id) => Self::CourseNotFound(id),
            other => Self::Directory(other),
        }
    }
}

/// Result of a successful task creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreated {
    /// The task as persisted.
    pub task: Task,
    /// Fan-out outcome; informational only.
    pub delivery: DeliveryReport,
}

/// Task use-case facade over the repository, directory and sink.
pub struct TaskService<R: TaskRepository, D: DirectoryProvider, N: NotificationSink> {
    tasks: R,
    directory: D,
    sink: N,
}

impl<R: TaskRepository, D: DirectoryProvider, N: NotificationSink> TaskService<R, D, N> {
    /// Creates a service using the provided collaborators.
    pub fn new(tasks: R, directory: D, sink: N) -> Self {
        Self {
            tasks,
            directory,
            sink,
        }
    }

    /// Publishes a task to a course.
    ///
    /// # Contract
    /// - `actor_id` must resolve to the teacher owning `course_id`.
    /// - The task is persisted as `Pending` before any notification runs.
    /// - Every currently-enrolled student gets one `TaskAssigned` request;
    ///   delivery failures are counted in the report, never returned.
    pub fn create_task(
        &self,
        course_id: CourseId,
        draft: &TaskDraft,
        actor_id: UserId,
    ) -> Result<TaskCreated, TaskServiceError> {
        let actor = self.directory.resolve_user(actor_id)?;
        if !access::can_create_task(&actor) {
            return Err(TaskServiceError::NotTeacher(actor_id));
        }
        let owner = self.directory.course_owner(course_id)?;
        if !access::can_manage_task(&actor, owner) {
            return Err(TaskServiceError::NotCourseOwner {
                actor: actor_id,
                course_id,
            });
        }
        draft.validate().map_err(TaskServiceError::Validation)?;

        // Roster is resolved before the write; once the row is committed
        // the remaining path must not produce an error.
        let roster = self.directory.enrolled_students(course_id)?;

        let task = Task::from_draft(course_id, draft);
        self.tasks.create_task(&task)?;
        let task = self.read_back(task.id, "created task not found in read-back")?;

        let requests: Vec<NotificationRequest> = roster
            .into_iter()
            .map(|student| NotificationRequest::task_assigned(&task, student))
            .collect();
        let delivery = notify::dispatch(&self.sink, &requests);

        Ok(TaskCreated { task, delivery })
    }

    /// Overwrites every editable field of a task.
    ///
    /// # Contract
    /// - `actor_id` must own the task's course.
    /// - Edits are silent: no notifications are sent, not even for due
    ///   date or status changes.
    pub fn update_task(
        &self,
        task_id: TaskId,
        changes: &TaskChanges,
        actor_id: UserId,
    ) -> Result<Task, TaskServiceError> {
        let actor = self.directory.resolve_user(actor_id)?;
        let current = self
            .tasks
            .get_task(task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))?;
        let owner = self.directory.course_owner(current.course_id)?;
        if !access::can_manage_task(&actor, owner) {
            return Err(TaskServiceError::NotCourseOwner {
                actor: actor_id,
                course_id: current.course_id,
            });
        }
        changes.validate().map_err(TaskServiceError::Validation)?;

        self.tasks.update_task(&current.with_changes(changes))?;
        self.read_back(task_id, "updated task not found in read-back")
    }

    /// Deletes a task; its submissions go with it through the schema
    /// cascade. Stored attachment files are left behind.
    pub fn delete_task(&self, task_id: TaskId, actor_id: UserId) -> Result<(), TaskServiceError> {
        let actor = self.directory.resolve_user(actor_id)?;
        let current = self
            .tasks
            .get_task(task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))?;
        let owner = self.directory.course_owner(current.course_id)?;
        if !access::can_manage_task(&actor, owner) {
            return Err(TaskServiceError::NotCourseOwner {
                actor: actor_id,
                course_id: current.course_id,
            });
        }

        self.tasks.delete_task(task_id)?;
        Ok(())
    }

    /// Fetches one task by id.
    pub fn get_task(&self, task_id: TaskId) -> Result<Task, TaskServiceError> {
        self.tasks
            .get_task(task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Lists a course's tasks ordered by due date.
    pub fn list_for_course(&self, course_id: CourseId) -> Result<Vec<Task>, TaskServiceError> {
        self.directory.course_owner(course_id)?;
        Ok(self.tasks.list_by_course(course_id)?)
    }

    /// Lists every task across the courses a teacher owns.
    pub fn list_for_teacher(&self, teacher_id: UserId) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.tasks.list_by_teacher(teacher_id)?)
    }

    /// Tasks due strictly after now across the student's enrolled courses,
    /// soonest first.
    pub fn list_upcoming_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let courses = self.directory.enrolled_courses(student_id)?;
        Ok(self.tasks.list_upcoming(&courses, now_epoch_ms())?)
    }

    fn read_back(&self, id: TaskId, context: &'static str) -> Result<Task, TaskServiceError> {
        self.tasks
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(context))
    }
}
