use log::{error, info};
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use rocket::fairing::AdHoc;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(database) => {
                info!("✓ MongoDB connected successfully");
                if let Err(e) = ensure_indexes(&database).await {
                    error!("✗ Failed to create indexes: {}", e);
                }
                rocket.manage(database)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    Ok(client.database(&crate::config::Config::database_name()))
}

/// Unique indexes back the one-review-per-user-per-doctor and
/// one-bookmark-per-user-per-doctor guarantees. Duplicate inserts racing
/// past the application-level checks surface as E11000 write errors.
async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    let users = db.collection::<crate::models::User>("users");
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<crate::models::Review>("reviews")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "doctor_id": 1, "user_id": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<crate::models::SavedDoctor>("saved_doctors")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "doctor_id": 1 })
                .options(unique)
                .build(),
            None,
        )
        .await?;

    Ok(())
}

pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

pub type DbConn = Database;
