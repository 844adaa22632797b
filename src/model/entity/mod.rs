mod user;
pub use user::{UserEntity, UserEntityCreate, UserEntityUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseUpdate, CourseWithCreatorRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonUpdate, LessonWithCompletionsRow};

mod lesson_completion;
pub use lesson_completion::LessonCompletion;

mod enrollment;
pub use enrollment::{CourseEnrollmentRow, Enrollment, UserEnrollmentRow, progress_percent};

mod stats;
pub use stats::{PlatformStats, RoleCount};
