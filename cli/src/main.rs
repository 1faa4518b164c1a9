use std::path::Path;

use clap::{Parser, Subcommand};
use lernboard::Config;
use lernboard::error::AppResult;
use lernboard::model::entity::{
    CourseDraft, CourseStatus, UserEntity, UserEntityCreate, UserEntityUpdate,
};
use lernboard::model::{CrudRepository, MockDatabase, ModelManager};
use lernboard::progress::reconcile;
use lernboard::store::{CourseContentStore, LocalCache, RemoteRepository};
use lernboard::web::UserRole;

#[derive(Parser, Debug)]
#[command(about = "Maintenance tool for lernboard data and the local cache", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage courses through the content store
    Courses {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Inspect and repair cached progress
    Progress {
        #[command(subcommand)]
        action: ProgressCommands,
    },

    /// Inspect the local cache
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Manage users of the mock database
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        instructor: Option<String>,
    },
    Status {
        #[arg(long)]
        id: String,
        /// draft, published or archived
        #[arg(long)]
        status: CourseStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProgressCommands {
    /// Stored next to recomputed percentages
    Show {
        #[arg(long)]
        user: Option<String>,
    },
    /// Drops stale module ids and corrupted entries
    Repair,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    Keys,
    ClearProgress,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
    Enroll {
        #[arg(long)]
        email: String,
        #[arg(long)]
        course: String,
    },
}

async fn open_store(config: &Config) -> AppResult<CourseContentStore> {
    let remote = RemoteRepository::from_config(config)?;
    let store = CourseContentStore::load(Box::new(remote), LocalCache::from_config(config)).await?;
    if store.is_offline() {
        println!("(offline, using {})", config.client().cache_file().display());
    }
    Ok(store)
}

async fn open_database(config: &Config) -> AppResult<ModelManager> {
    let path = config.app().data_file().unwrap_or(Path::new("./db.json"));
    Ok(ModelManager::new(MockDatabase::open(path).await?))
}

async fn courses(config: &Config, action: CourseCommands) -> AppResult<()> {
    let mut store = open_store(config).await?;

    match action {
        CourseCommands::List => {
            for course in store.courses() {
                println!(
                    "{}\t{}\t{}\t{} modules",
                    course.id(),
                    course.status(),
                    course.title(),
                    course.modules().len()
                );
            }
        }
        CourseCommands::Create {
            title,
            description,
            category,
            instructor,
        } => {
            let course = store
                .create_course(CourseDraft {
                    title,
                    description,
                    category,
                    instructor_id: instructor,
                })
                .await?;
            println!("Course created: {}", course.id());
        }
        CourseCommands::Status { id, status } => {
            store.set_course_status(&id, status).await?;
            println!("{id} is now {status}");
        }
    }

    Ok(())
}

async fn progress(config: &Config, action: ProgressCommands) -> AppResult<()> {
    let store = open_store(config).await?;
    let cache = store.cache();

    for entry in cache.progress_entries().await? {
        let Some(mut blob) = entry.blob else {
            match action {
                ProgressCommands::Show { .. } => println!("{}\tcorrupted", entry.key),
                ProgressCommands::Repair => {
                    cache.storage().remove_item(&entry.key).await?;
                    println!("{}\tremoved (corrupted)", entry.key);
                }
            }
            continue;
        };

        if let ProgressCommands::Show { user: Some(user) } = &action {
            if &blob.user_id != user {
                continue;
            }
        }

        let Some(course) = store.course(&blob.course_id) else {
            println!("{}\tcourse {} no longer exists", entry.key, blob.course_id);
            continue;
        };

        let report = reconcile(course, &mut blob.progress);
        match action {
            ProgressCommands::Show { .. } => println!(
                "{}\tstored {}%\tactual {}%\tstale {:?}",
                entry.key, report.previous, report.current, report.stale_modules
            ),
            ProgressCommands::Repair if report.changed() => {
                cache
                    .save_progress(&blob.course_id, &blob.user_id, &blob.progress)
                    .await?;
                println!("{}\t{}% -> {}%", entry.key, report.previous, report.current);
            }
            ProgressCommands::Repair => {}
        }
    }

    Ok(())
}

async fn cache(config: &Config, action: CacheCommands) -> AppResult<()> {
    let cache = LocalCache::from_config(config);

    match action {
        CacheCommands::Keys => {
            for key in cache.storage().keys().await? {
                println!("{key}");
            }
        }
        CacheCommands::ClearProgress => {
            let removed = cache.clear_progress_cache().await?;
            println!("Removed {} progress entries", removed.len());
        }
    }

    Ok(())
}

async fn user(config: &Config, action: UserCommands) -> AppResult<()> {
    let mm = open_database(config).await?;

    match action {
        UserCommands::Add {
            name,
            email,
            password,
            role,
        } => {
            let user = UserEntity::create(
                &mm,
                UserEntityCreate {
                    name,
                    email,
                    password_hash: lernboard::auth::hash_password(&password)?,
                    role: UserRole::from(role.as_str()),
                },
            )
            .await?;
            println!("User created: {} ({})", user.id(), user.role());
        }
        UserCommands::Enroll { email, course } => {
            let Some(user) = UserEntity::find_by_email(&mm, &email).await? else {
                println!("No user with email {email}");
                return Ok(());
            };

            if user.is_enrolled(&course) {
                println!("{email} is already enrolled in {course}");
                return Ok(());
            }

            let mut enrolled = user.enrolled_courses().to_vec();
            enrolled.push(course.clone());
            user.update(
                &mm,
                UserEntityUpdate {
                    enrolled_courses: Some(enrolled),
                    ..Default::default()
                },
            )
            .await?;
            println!("{email} enrolled in {course}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    lernboard::setup_trace();
    let args = Cli::parse();
    let config = Config::get_or_init(cfg!(debug_assertions)).await;

    match args.command {
        Commands::Courses { action } => courses(config, action).await,
        Commands::Progress { action } => progress(config, action).await,
        Commands::Cache { action } => cache(config, action).await,
        Commands::User { action } => user(config, action).await,
    }
}
