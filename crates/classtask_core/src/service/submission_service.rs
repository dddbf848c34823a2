//! Submission lifecycle service.
//!
//! # Responsibility
//! - Accept student work, store attachment bytes, grade submissions and
//!   serve submission reads and dashboard counts.
//!
//! # Invariants
//! - Only enrolled students submit; the enrollment gate runs before any
//!   byte or row is written.
//! - A failed attachment write aborts the whole submission; no row exists
//!   without its bytes.
//! - Grading overwrites grade and feedback; a graded row never returns to
//!   `Submitted`.
//! - Notification dispatch runs after the mutation committed and never
//!   fails the operation.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::access;
use crate::directory::{DirectoryError, DirectoryProvider};
use crate::model::course::CourseId;
use crate::model::notification::NotificationRequest;
use crate::model::submission::{
    check_comment, check_feedback, check_grade, Submission, SubmissionId,
    SubmissionValidationError,
};
use crate::model::task::TaskId;
use crate::model::user::UserId;
use crate::notify::{self, DeliveryReport, NotificationSink};
use crate::repo::{RepoError, SubmissionRepository, TaskRepository};
use crate::service::ErrorKind;
use crate::storage::{AttachmentError, AttachmentStore};

/// Service error for submission use-cases.
#[derive(Debug)]
pub enum SubmissionServiceError {
    /// Referenced task does not exist.
    TaskNotFound(TaskId),
    /// Target submission does not exist.
    SubmissionNotFound(SubmissionId),
    /// Referenced user does not exist.
    UserNotFound(UserId),
    /// Referenced course does not exist.
    CourseNotFound(CourseId),
    /// Submitter is not an enrolled student of the task's course.
    NotEnrolled { task_id: TaskId, student_id: UserId },
    /// Actor may not grade work in this task's course.
    NotCourseTeacher { actor: UserId, task_id: TaskId },
    /// Actor may not read this submission.
    ViewDenied {
        actor: UserId,
        submission_id: SubmissionId,
    },
    /// Download requested but the submission carries no file.
    NoAttachment(SubmissionId),
    /// Submission field constraint violated.
    Validation(SubmissionValidationError),
    /// Attachment byte storage failure.
    Storage(AttachmentError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Directory lookup failure.
    Directory(DirectoryError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl SubmissionServiceError {
    /// Coarse classification for transport mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_)
            | Self::SubmissionNotFound(_)
            | Self::UserNotFound(_)
            | Self::CourseNotFound(_)
            | Self::NoAttachment(_) => ErrorKind::NotFound,
            Self::NotEnrolled { .. } | Self::NotCourseTeacher { .. } | Self::ViewDenied { .. } => {
                ErrorKind::Forbidden
            }
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Repo(_) | Self::Directory(_) | Self::InconsistentState(_) => ErrorKind::Internal,
        }
    }
}

impl Display for SubmissionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubmissionNotFound(id) => write!(f, "submission not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::NotEnrolled {
                task_id,
                student_id,
            } => write!(
                f,
                "student {student_id} is not enrolled in the course for task {task_id}"
            ),
            Self::NotCourseTeacher { actor, task_id } => {
                write!(f, "user {actor} may not grade submissions for task {task_id}")
            }
            Self::ViewDenied {
                actor,
                submission_id,
            } => write!(f, "user {actor} may not view submission {submission_id}"),
            Self::NoAttachment(id) => write!(f, "submission {id} has no attachment"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent submission state: {details}")
            }
        }
    }
}

impl Error for SubmissionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SubmissionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::SubmissionNotFound(id) => Self::SubmissionNotFound(id),
            RepoError::SubmissionValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DirectoryError> for SubmissionServiceError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::UserNotFound(id) => Self::UserNotFound(id),
            DirectoryError::CourseNotFound(id) => Self::CourseNotFound(id),
            other => Self::Directory(other),
        }
    }
}

/// Uploaded file handed in with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    /// Name as provided by the student; sanitized by the store.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Attachment content returned to an authorized viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDownload {
    /// Original upload name for download headers.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// The submission as persisted.
    pub submission: Submission,
    /// Teacher notification outcome; informational only.
    pub delivery: DeliveryReport,
}

/// Result of a successful grade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedSubmission {
    /// The submission with grade and feedback recorded.
    pub submission: Submission,
    /// Student notification outcome; informational only.
    pub delivery: DeliveryReport,
}

/// Submission use-case facade over repositories, directory, sink and
/// attachment storage.
pub struct SubmissionService<R, T, D, N, S>
where
    R: SubmissionRepository,
    T: TaskRepository,
    D: DirectoryProvider,
    N: NotificationSink,
    S: AttachmentStore,
{
    submissions: R,
    tasks: T,
    directory: D,
    sink: N,
    attachments: S,
}

impl<R, T, D, N, S> SubmissionService<R, T, D, N, S>
where
    R: SubmissionRepository,
    T: TaskRepository,
    D: DirectoryProvider,
    N: NotificationSink,
    S: AttachmentStore,
{
    /// Creates a service using the provided collaborators.
    pub fn new(submissions: R, tasks: T, directory: D, sink: N, attachments: S) -> Self {
        Self {
            submissions,
            tasks,
            directory,
            sink,
            attachments,
        }
    }

    /// Turns in work for a task.
    ///
    /// # Contract
    /// - `student_id` must resolve to a student enrolled in the task's
    ///   course; the gate runs before anything is written.
    /// - If an attachment is given, its bytes are stored first; a storage
    ///   failure aborts the whole submission.
    /// - Resubmission is a new row; earlier rows stay untouched.
    /// - The course's teacher gets one `TaskSubmitted` request after the
    ///   row is committed.
    pub fn submit(
        &self,
        task_id: TaskId,
        student_id: UserId,
        comment: Option<String>,
        attachment: Option<AttachmentUpload>,
    ) -> Result<SubmissionReceipt, SubmissionServiceError> {
        let task = self
            .tasks
            .get_task(task_id)?
            .ok_or(SubmissionServiceError::TaskNotFound(task_id))?;
        let student = self.directory.resolve_user(student_id)?;
        let enrolled = self.directory.is_enrolled(task.course_id, student_id)?;
        if !access::can_submit(&student, enrolled) {
            return Err(SubmissionServiceError::NotEnrolled {
                task_id,
                student_id,
            });
        }
        check_comment(comment.as_deref()).map_err(SubmissionServiceError::Validation)?;

        // Owner is resolved before any write; the post-commit path must
        // not produce an error.
        let owner = self.directory.course_owner(task.course_id)?;

        let mut submission = Submission::new(task_id, student_id, comment);
        if let Some(upload) = &attachment {
            let stored = self
                .attachments
                .put(&upload.file_name, &upload.bytes)
                .map_err(SubmissionServiceError::Storage)?;
            submission.attach(stored.key, stored.original_name);
        }

        self.submissions.create_submission(&submission)?;
        let submission =
            self.read_back(submission.id, "created submission not found in read-back")?;

        let requests = [NotificationRequest::task_submitted(&task, &student, owner)];
        let delivery = notify::dispatch(&self.sink, &requests);

        Ok(SubmissionReceipt {
            submission,
            delivery,
        })
    }

    /// Records a grade and optional feedback on a submission.
    ///
    /// # Contract
    /// - `actor_id` must own the course the submission's task belongs to.
    /// - `grade` must lie in `0..=task.points`.
    /// - Grading is an overwrite: regrading replaces grade and feedback
    ///   and notifies the student again.
    pub fn grade(
        &self,
        submission_id: SubmissionId,
        grade: i32,
        feedback: Option<String>,
        actor_id: UserId,
    ) -> Result<GradedSubmission, SubmissionServiceError> {
        let submission = self
            .submissions
            .get_submission(submission_id)?
            .ok_or(SubmissionServiceError::SubmissionNotFound(submission_id))?;
        let task = self
            .tasks
            .get_task(submission.task_id)?
            .ok_or(SubmissionServiceError::TaskNotFound(submission.task_id))?;
        let actor = self.directory.resolve_user(actor_id)?;
        let owner = self.directory.course_owner(task.course_id)?;
        if !access::can_grade(&actor, owner) {
            return Err(SubmissionServiceError::NotCourseTeacher {
                actor: actor_id,
                task_id: task.id,
            });
        }
        check_grade(grade, task.points).map_err(SubmissionServiceError::Validation)?;
        check_feedback(feedback.as_deref()).map_err(SubmissionServiceError::Validation)?;

        self.submissions
            .record_grade(submission_id, grade, feedback.as_deref())?;
        let submission =
            self.read_back(submission_id, "graded submission not found in read-back")?;

        let requests = [NotificationRequest::task_graded(
            &task,
            grade,
            submission.student_id,
        )];
        let delivery = notify::dispatch(&self.sink, &requests);

        Ok(GradedSubmission {
            submission,
            delivery,
        })
    }

    /// The student's current submission for a task, if any.
    ///
    /// Current means newest `submitted_at`; the larger id wins a tie.
    pub fn current_submission_for(
        &self,
        task_id: TaskId,
        student_id: UserId,
    ) -> Result<Option<Submission>, SubmissionServiceError> {
        if self.tasks.get_task(task_id)?.is_none() {
            return Err(SubmissionServiceError::TaskNotFound(task_id));
        }
        self.directory.resolve_user(student_id)?;
        Ok(self.submissions.latest_for(task_id, student_id)?)
    }

    /// Returns the attachment of a submission to an authorized viewer.
    ///
    /// # Contract
    /// - Allowed for the submission's author and the course's teacher.
    /// - A submission without a file yields `NoAttachment`; stored bytes
    ///   gone missing from disk yield `Storage`.
    pub fn download_attachment(
        &self,
        submission_id: SubmissionId,
        actor_id: UserId,
    ) -> Result<AttachmentDownload, SubmissionServiceError> {
        let submission = self
            .submissions
            .get_submission(submission_id)?
            .ok_or(SubmissionServiceError::SubmissionNotFound(submission_id))?;
        let task = self
            .tasks
            .get_task(submission.task_id)?
            .ok_or(SubmissionServiceError::TaskNotFound(submission.task_id))?;
        let actor = self.directory.resolve_user(actor_id)?;
        let owner = self.directory.course_owner(task.course_id)?;
        if !access::can_view_submission(&actor, submission.student_id, owner) {
            return Err(SubmissionServiceError::ViewDenied {
                actor: actor_id,
                submission_id,
            });
        }

        let (key, file_name) = match (submission.file_key, submission.file_name) {
            (Some(key), Some(name)) => (key, name),
            _ => return Err(SubmissionServiceError::NoAttachment(submission_id)),
        };
        let bytes = self
            .attachments
            .get(&key)
            .map_err(SubmissionServiceError::Storage)?;

        Ok(AttachmentDownload { file_name, bytes })
    }

    /// Every submission for a task, current-first.
    pub fn list_for_task(
        &self,
        task_id: TaskId,
    ) -> Result<Vec<Submission>, SubmissionServiceError> {
        if self.tasks.get_task(task_id)?.is_none() {
            return Err(SubmissionServiceError::TaskNotFound(task_id));
        }
        Ok(self.submissions.list_by_task(task_id)?)
    }

    /// Every submission a student has made, newest first.
    pub fn list_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Submission>, SubmissionServiceError> {
        self.directory.resolve_user(student_id)?;
        Ok(self.submissions.list_by_student(student_id)?)
    }

    /// Every submission across the courses a teacher owns, newest first.
    pub fn list_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<Submission>, SubmissionServiceError> {
        Ok(self.submissions.list_by_teacher(teacher_id)?)
    }

    /// How many submissions a task has received, resubmissions included.
    pub fn submission_count_for_task(
        &self,
        task_id: TaskId,
    ) -> Result<u64, SubmissionServiceError> {
        if self.tasks.get_task(task_id)?.is_none() {
            return Err(SubmissionServiceError::TaskNotFound(task_id));
        }
        Ok(self.submissions.count_by_task(task_id)?)
    }

    /// How many of a task's submissions still await a grade.
    pub fn ungraded_count_for_task(
        &self,
        task_id: TaskId,
    ) -> Result<u64, SubmissionServiceError> {
        if self.tasks.get_task(task_id)?.is_none() {
            return Err(SubmissionServiceError::TaskNotFound(task_id));
        }
        Ok(self.submissions.ungraded_count_by_task(task_id)?)
    }

    /// Ungraded submissions across every course a teacher owns.
    pub fn ungraded_count_for_teacher(
        &self,
        teacher_id: UserId,
    ) -> Result<u64, SubmissionServiceError> {
        Ok(self.submissions.ungraded_count_by_teacher(teacher_id)?)
    }

    fn read_back(
        &self,
        id: SubmissionId,
        context: &'static str,
    ) -> Result<Submission, SubmissionServiceError> {
        self.submissions
            .get_submission(id)?
            .ok_or(SubmissionServiceError::InconsistentState(context))
    }
}
