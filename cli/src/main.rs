use clap::{Parser, Subcommand};
use coursehub::Config;
use coursehub::auth::hash_password;
use coursehub::model::entity::{
    Course, CourseCreate, Lesson, LessonCreate, UserEntity, UserEntityCreate,
};
use coursehub::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursehub::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the course database", long_about = None)]
pub struct Cli {
    /// Read config.toml from the working directory
    #[arg(long, global = true, default_value_t = false)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// student, teacher or admin
        #[arg(long, default_value_t = UserRole::Student)]
        role: UserRole,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Username of the author
        #[arg(long)]
        creator: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Keep the course hidden from students
        #[arg(long, default_value_t = false)]
        draft: bool,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course title to attach the lesson to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long)]
        video_url: Option<String>,
        /// Position in the course, appended after the last lesson by default
        #[arg(long)]
        order: Option<i32>,
        /// Length in minutes
        #[arg(long)]
        duration: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> coursehub::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let config = Config::load(args.local)?;
    let db_con = DbConnection::connect(config.app().database_uri()).await?;
    db_con.migrate().await?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                email,
                password,
                role,
            } => {
                let user = UserEntity::create_with_role(
                    &mm,
                    &actor,
                    UserEntityCreate {
                        username,
                        email: email.to_lowercase(),
                        password_hash: hash_password(&password)?,
                    },
                    role,
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                creator,
                title,
                description,
                draft,
            } => {
                let creator_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
                        .bind(&creator)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        title,
                        description,
                        creator_id,
                        is_published: Some(!draft),
                        banner_image: None,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                course_title,
                title,
                description,
                file,
                video_url,
                order,
                duration,
            } => {
                let course_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
                        .bind(&course_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let order = match order {
                    Some(order) => order,
                    None => Lesson::all_by_course(&mm, &actor, course_id)
                        .await?
                        .iter()
                        .map(|l| l.order_index() + 1)
                        .max()
                        .unwrap_or(0),
                };

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id,
                        title,
                        description,
                        content,
                        video_url,
                        order_index: Some(order),
                        duration,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },
    }

    Ok(())
}
