use classtask_core::db::open_db_in_memory;
use classtask_core::model::now_epoch_ms;
use classtask_core::{
    CourseRecord, ErrorKind, FsAttachmentStore, Role, SqliteDirectory, SqliteNotificationSink,
    SqliteSubmissionRepository, SqliteTaskRepository, SubmissionService, SubmissionServiceError,
    SubmissionStatus, Task, TaskDraft, TaskRepository, User,
};
use rusqlite::{params, Connection};
use std::path::Path;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

#[test]
fn submit_creates_a_row_and_notifies_the_teacher() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(
            world.task.id,
            world.student.id,
            Some("Here is my essay".to_string()),
            None,
        )
        .unwrap();

    assert_eq!(receipt.submission.task_id, world.task.id);
    assert_eq!(receipt.submission.student_id, world.student.id);
    assert_eq!(receipt.submission.status, SubmissionStatus::Submitted);
    assert_eq!(receipt.submission.comment.as_deref(), Some("Here is my essay"));
    assert!(receipt.submission.grade.is_none());
    assert!(!receipt.submission.has_attachment());
    assert_eq!(receipt.delivery.delivered, 1);
    assert_eq!(receipt.delivery.failed, 0);

    let (recipient, message): (String, String) = world
        .conn
        .query_row(
            "SELECT user_id, message FROM notifications WHERE kind = 'task_submitted';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(recipient, world.teacher.id.to_string());
    assert_eq!(
        message,
        "Student Ana Soto has submitted the task: Week 3 essay"
    );
}

#[test]
fn submit_requires_enrollment() {
    let world = World::seed();
    let outsider = world.add_student("outsider@school.test", "Out Sider");
    let service = world.service();

    let err = service
        .submit(world.task.id, outsider.id, None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        SubmissionServiceError::NotEnrolled { task_id, student_id }
            if task_id == world.task.id && student_id == outsider.id
    ));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(world.submission_count(), 0);
}

#[test]
fn enrollment_alone_is_not_enough_for_non_students() {
    let world = World::seed();
    // A teacher row slipped into the enrollment table must still be
    // rejected by the role check.
    SqliteDirectory::new(&world.conn)
        .enroll_student(world.course.id, world.teacher.id)
        .unwrap();
    let service = world.service();

    let err = service
        .submit(world.task.id, world.teacher.id, None, None)
        .unwrap_err();
    assert!(matches!(err, SubmissionServiceError::NotEnrolled { .. }));
    assert_eq!(world.submission_count(), 0);
}

#[test]
fn submit_rejects_oversized_comments() {
    let world = World::seed();
    let service = world.service();

    let long_comment = "c".repeat(501);
    let err = service
        .submit(world.task.id, world.student.id, Some(long_comment), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(world.submission_count(), 0);

    let boundary = "c".repeat(500);
    service
        .submit(world.task.id, world.student.id, Some(boundary), None)
        .unwrap();
    assert_eq!(world.submission_count(), 1);
}

#[test]
fn submit_to_unknown_task_fails_not_found() {
    let world = World::seed();
    let service = world.service();

    let nowhere = Uuid::new_v4();
    let err = service
        .submit(nowhere, world.student.id, None, None)
        .unwrap_err();
    assert!(matches!(err, SubmissionServiceError::TaskNotFound(id) if id == nowhere));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn resubmission_adds_a_row_and_becomes_current() {
    let world = World::seed();
    let service = world.service();

    let first = service
        .submit(
            world.task.id,
            world.student.id,
            Some("first try".to_string()),
            None,
        )
        .unwrap();
    world.backdate_submission(first.submission.id, 60_000);

    let second = service
        .submit(
            world.task.id,
            world.student.id,
            Some("second try".to_string()),
            None,
        )
        .unwrap();

    assert_eq!(world.submission_count(), 2);
    assert_eq!(
        service.submission_count_for_task(world.task.id).unwrap(),
        2
    );

    let current = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, second.submission.id);
    assert_eq!(current.comment.as_deref(), Some("second try"));
}

#[test]
fn current_submission_tie_breaks_on_larger_id() {
    let world = World::seed();
    let service = world.service();

    let first = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    let second = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    // Force an exact timestamp collision; the larger id must win.
    let frozen = now_epoch_ms();
    world.set_submitted_at(first.submission.id, frozen);
    world.set_submitted_at(second.submission.id, frozen);

    let expected = first
        .submission
        .id
        .to_string()
        .max(second.submission.id.to_string());

    let current = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id.to_string(), expected);
}

#[test]
fn current_submission_is_none_before_any_submit() {
    let world = World::seed();
    let service = world.service();

    let current = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap();
    assert!(current.is_none());

    let err = service
        .current_submission_for(Uuid::new_v4(), world.student.id)
        .unwrap_err();
    assert!(matches!(err, SubmissionServiceError::TaskNotFound(_)));
}

#[test]
fn task_listing_returns_the_newest_submission_first() {
    let world = World::seed();
    let classmate = world.add_enrolled_student("ben@school.test", "Ben Reyes");
    let service = world.service();

    let old = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    world.backdate_submission(old.submission.id, 120_000);
    let mid = service
        .submit(world.task.id, classmate.id, None, None)
        .unwrap();
    world.backdate_submission(mid.submission.id, 60_000);
    let new = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    let listed = service.list_for_task(world.task.id).unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, new.submission.id);
    assert_eq!(listed[1].id, mid.submission.id);
    assert_eq!(listed[2].id, old.submission.id);

    let err = service.list_for_task(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, SubmissionServiceError::TaskNotFound(_)));
}

#[test]
fn student_listing_spans_tasks() {
    let world = World::seed();
    let second_task = world.add_task("Week 4 quiz");
    let service = world.service();

    let essay = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    world.backdate_submission(essay.submission.id, 60_000);
    let quiz = service
        .submit(second_task.id, world.student.id, None, None)
        .unwrap();

    let listed = service.list_for_student(world.student.id).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, quiz.submission.id);
    assert_eq!(listed[1].id, essay.submission.id);

    let err = service.list_for_student(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, SubmissionServiceError::UserNotFound(_)));
}

#[test]
fn teacher_listing_covers_only_owned_courses() {
    let world = World::seed();
    let service = world.service();
    service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    let other_teacher = world.add_teacher("rival@school.test", "Rival Teacher");

    let mine = service.list_for_teacher(world.teacher.id).unwrap();
    assert_eq!(mine.len(), 1);
    let theirs = service.list_for_teacher(other_teacher.id).unwrap();
    assert!(theirs.is_empty());
}

/// One course with its teacher, one enrolled student and one task.
struct World {
    conn: Connection,
    store_dir: TempDir,
    teacher: User,
    course: CourseRecord,
    student: User,
    task: Task,
}

impl World {
    fn seed() -> Self {
        let conn = open_db_in_memory().unwrap();
        let store_dir = tempdir().unwrap();
        let directory = SqliteDirectory::new(&conn);

        let teacher = User::new("maria@school.test", "Maria Lopez", Role::Teacher);
        directory.add_user(&teacher).unwrap();
        let course = CourseRecord::new("Biology 101", "BIO-101", teacher.id);
        directory.add_course(&course).unwrap();
        let student = User::new("ana@school.test", "Ana Soto", Role::Student);
        directory.add_user(&student).unwrap();
        directory.enroll_student(course.id, student.id).unwrap();

        let task = Task::from_draft(
            course.id,
            &TaskDraft {
                title: "Week 3 essay".to_string(),
                description: None,
                due_at: now_epoch_ms() + 86_400_000,
                points: 10,
            },
        );
        SqliteTaskRepository::try_new(&conn)
            .unwrap()
            .create_task(&task)
            .unwrap();

        Self {
            conn,
            store_dir,
            teacher,
            course,
            student,
            task,
        }
    }

    fn service(
        &self,
    ) -> SubmissionService<
        SqliteSubmissionRepository<'_>,
        SqliteTaskRepository<'_>,
        SqliteDirectory<'_>,
        SqliteNotificationSink<'_>,
        FsAttachmentStore,
    > {
        submission_service(&self.conn, self.store_dir.path())
    }

    fn add_student(&self, email: &str, name: &str) -> User {
        let user = User::new(email, name, Role::Student);
        SqliteDirectory::new(&self.conn).add_user(&user).unwrap();
        user
    }

    fn add_enrolled_student(&self, email: &str, name: &str) -> User {
        let user = self.add_student(email, name);
        SqliteDirectory::new(&self.conn)
            .enroll_student(self.course.id, user.id)
            .unwrap();
        user
    }

    fn add_teacher(&self, email: &str, name: &str) -> User {
        let user = User::new(email, name, Role::Teacher);
        SqliteDirectory::new(&self.conn).add_user(&user).unwrap();
        user
    }

    fn add_task(&self, title: &str) -> Task {
        let task = Task::from_draft(
            self.course.id,
            &TaskDraft {
                title: title.to_string(),
                description: None,
                due_at: now_epoch_ms() + 86_400_000,
                points: 10,
            },
        );
        SqliteTaskRepository::try_new(&self.conn)
            .unwrap()
            .create_task(&task)
            .unwrap();
        task
    }

    fn submission_count(&self) -> i64 {
        self.conn
            .query_row("SELECT COUNT(*) FROM submissions;", [], |row| row.get(0))
            .unwrap()
    }

    fn backdate_submission(&self, id: Uuid, by_ms: i64) {
        self.conn
            .execute(
                "UPDATE submissions SET submitted_at = submitted_at - ?1 WHERE id = ?2;",
                params![by_ms, id.to_string()],
            )
            .unwrap();
    }

    fn set_submitted_at(&self, id: Uuid, at: i64) {
        self.conn
            .execute(
                "UPDATE submissions SET submitted_at = ?1 WHERE id = ?2;",
                params![at, id.to_string()],
            )
            .unwrap();
    }
}

fn submission_service<'conn>(
    conn: &'conn Connection,
    store_root: &Path,
) -> SubmissionService<
    SqliteSubmissionRepository<'conn>,
    SqliteTaskRepository<'conn>,
    SqliteDirectory<'conn>,
    SqliteNotificationSink<'conn>,
    FsAttachmentStore,
> {
    SubmissionService::new(
        SqliteSubmissionRepository::try_new(conn).unwrap(),
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteDirectory::new(conn),
        SqliteNotificationSink::new(conn),
        FsAttachmentStore::new(store_root),
    )
}
