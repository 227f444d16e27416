use mongodb::{Database, IndexModel};
use tracing::info;

use crate::models::LogoTask;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Logo tasks: owner history lookups and the stale-task sweep
    create_indexes(
        db,
        LogoTask::COLLECTION,
        vec![
            index(bson::doc! { "owner_id": 1, "created_at": -1 }),
            index(bson::doc! { "status": 1, "created_at": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
