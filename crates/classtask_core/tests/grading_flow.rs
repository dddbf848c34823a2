use classtask_core::db::open_db_in_memory;
use classtask_core::model::now_epoch_ms;
use classtask_core::{
    CourseRecord, ErrorKind, FsAttachmentStore, Role, SqliteDirectory, SqliteNotificationSink,
    SqliteSubmissionRepository, SqliteTaskRepository, SubmissionService, SubmissionServiceError,
    SubmissionStatus, Task, TaskDraft, TaskRepository, User,
};
use rusqlite::{params, Connection};
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

#[test]
fn grade_records_grade_feedback_and_notifies_the_student() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    let graded = service
        .grade(
            receipt.submission.id,
            8,
            Some("Good work".to_string()),
            world.teacher.id,
        )
        .unwrap();

    assert_eq!(graded.submission.grade, Some(8));
    assert_eq!(graded.submission.feedback.as_deref(), Some("Good work"));
    assert_eq!(graded.submission.status, SubmissionStatus::Graded);
    assert!(graded.submission.is_graded());
    assert_eq!(graded.delivery.delivered, 1);

    let (recipient, message): (String, String) = world
        .conn
        .query_row(
            "SELECT user_id, message FROM notifications WHERE kind = 'task_graded';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(recipient, world.student.id.to_string());
    assert_eq!(message, "Your task 'Week 3 essay' has been graded: 8 points");
}

#[test]
fn regrading_overwrites_grade_and_feedback() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    service
        .grade(
            receipt.submission.id,
            5,
            Some("Missing sources".to_string()),
            world.teacher.id,
        )
        .unwrap();
    let regraded = service
        .grade(
            receipt.submission.id,
            9,
            Some("Much better after revision".to_string()),
            world.teacher.id,
        )
        .unwrap();

    assert_eq!(regraded.submission.grade, Some(9));
    assert_eq!(
        regraded.submission.feedback.as_deref(),
        Some("Much better after revision")
    );
    assert_eq!(regraded.submission.status, SubmissionStatus::Graded);

    // Each grading pass tells the student.
    assert_eq!(world.notification_count("task_graded"), 2);
}

#[test]
fn regrading_may_clear_feedback() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    service
        .grade(
            receipt.submission.id,
            5,
            Some("See margin notes".to_string()),
            world.teacher.id,
        )
        .unwrap();
    let regraded = service
        .grade(receipt.submission.id, 6, None, world.teacher.id)
        .unwrap();

    assert_eq!(regraded.submission.grade, Some(6));
    assert!(regraded.submission.feedback.is_none());
    assert_eq!(regraded.submission.status, SubmissionStatus::Graded);
}

#[test]
fn grade_must_fit_the_task_scale() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    let err = service
        .grade(receipt.submission.id, 11, None, world.teacher.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .grade(receipt.submission.id, -1, None, world.teacher.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let still = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap()
        .unwrap();
    assert_eq!(still.status, SubmissionStatus::Submitted);

    // Both ends of the scale are valid grades.
    service
        .grade(receipt.submission.id, 0, None, world.teacher.id)
        .unwrap();
    let graded = service
        .grade(receipt.submission.id, 10, None, world.teacher.id)
        .unwrap();
    assert_eq!(graded.submission.grade, Some(10));
}

#[test]
fn feedback_is_capped_at_a_thousand_characters() {
    let world = World::seed();
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    let err = service
        .grade(
            receipt.submission.id,
            7,
            Some("f".repeat(1001)),
            world.teacher.id,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let graded = service
        .grade(
            receipt.submission.id,
            7,
            Some("f".repeat(1000)),
            world.teacher.id,
        )
        .unwrap();
    assert_eq!(graded.submission.grade, Some(7));
}

#[test]
fn grading_requires_course_ownership() {
    let world = World::seed();
    let rival = world.add_user("rival@school.test", "Rival Teacher", Role::Teacher);
    let service = world.service();

    let receipt = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    let err = service
        .grade(receipt.submission.id, 5, None, rival.id)
        .unwrap_err();
    assert!(matches!(
        err,
        SubmissionServiceError::NotCourseTeacher { actor, task_id }
            if actor == rival.id && task_id == world.task.id
    ));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Students cannot grade, not even their own work.
    let err = service
        .grade(receipt.submission.id, 10, None, world.student.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let untouched = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap()
        .unwrap();
    assert!(untouched.grade.is_none());
    assert!(untouched.feedback.is_none());
    assert_eq!(untouched.status, SubmissionStatus::Submitted);
}

#[test]
fn grading_a_missing_submission_fails_not_found() {
    let world = World::seed();
    let service = world.service();

    let nowhere = Uuid::new_v4();
    let err = service
        .grade(nowhere, 5, None, world.teacher.id)
        .unwrap_err();
    assert!(matches!(err, SubmissionServiceError::SubmissionNotFound(id) if id == nowhere));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn ungraded_counts_track_grading_progress() {
    let world = World::seed();
    let classmate = world.add_enrolled_student("ben@school.test", "Ben Reyes");
    let rival = world.add_user("rival@school.test", "Rival Teacher", Role::Teacher);
    let service = world.service();

    let first = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    service
        .submit(world.task.id, classmate.id, None, None)
        .unwrap();

    assert_eq!(service.submission_count_for_task(world.task.id).unwrap(), 2);
    assert_eq!(service.ungraded_count_for_task(world.task.id).unwrap(), 2);
    assert_eq!(
        service.ungraded_count_for_teacher(world.teacher.id).unwrap(),
        2
    );

    service
        .grade(first.submission.id, 8, None, world.teacher.id)
        .unwrap();

    assert_eq!(service.submission_count_for_task(world.task.id).unwrap(), 2);
    assert_eq!(service.ungraded_count_for_task(world.task.id).unwrap(), 1);
    assert_eq!(
        service.ungraded_count_for_teacher(world.teacher.id).unwrap(),
        1
    );
    assert_eq!(service.ungraded_count_for_teacher(rival.id).unwrap(), 0);
}

#[test]
fn grading_an_old_submission_leaves_the_current_one_alone() {
    let world = World::seed();
    let service = world.service();

    let first = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();
    world.backdate_submission(first.submission.id, 60_000);
    let second = service
        .submit(world.task.id, world.student.id, None, None)
        .unwrap();

    service
        .grade(first.submission.id, 4, None, world.teacher.id)
        .unwrap();

    let current = service
        .current_submission_for(world.task.id, world.student.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, second.submission.id);
    assert!(current.grade.is_none());
    assert_eq!(service.ungraded_count_for_task(world.task.id).unwrap(), 1);
}

/// One course with its teacher, one enrolled student and one 10-point task.
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
        SubmissionService::new(
            SqliteSubmissionRepository::try_new(&self.conn).unwrap(),
            SqliteTaskRepository::try_new(&self.conn).unwrap(),
            SqliteDirectory::new(&self.conn),
            SqliteNotificationSink::new(&self.conn),
            FsAttachmentStore::new(self.store_dir.path()),
        )
    }

    fn add_user(&self, email: &str, name: &str, role: Role) -> User {
        let user = User::new(email, name, role);
        SqliteDirectory::new(&self.conn).add_user(&user).unwrap();
        user
    }

    fn add_enrolled_student(&self, email: &str, name: &str) -> User {
        let user = self.add_user(email, name, Role::Student);
        SqliteDirectory::new(&self.conn)
            .enroll_student(self.course.id, user.id)
            .unwrap();
        user
    }

    fn notification_count(&self, kind: &str) -> i64 {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE kind = ?1;",
                [kind],
                |row| row.get(0),
            )
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
}
