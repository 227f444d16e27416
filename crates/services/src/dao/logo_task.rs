use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use logoforge_db::models::{LogoTask, TaskResult, TaskStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};
use crate::generation::task_store::{TaskStore, check_transition};

/// MongoDB-backed [`TaskStore`].
pub struct LogoTaskDao {
    pub base: BaseDao<LogoTask>,
}

impl LogoTaskDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, LogoTask::COLLECTION),
        }
    }
}

#[async_trait]
impl TaskStore for LogoTaskDao {
    async fn insert(&self, task: &LogoTask) -> DaoResult<()> {
        self.base.insert_one(task).await
    }

    async fn find_owned(&self, id: &str, owner_id: &str) -> DaoResult<Option<LogoTask>> {
        self.base
            .find_one(doc! { "_id": id, "owner_id": owner_id })
            .await
    }

    async fn find(&self, id: &str) -> DaoResult<Option<LogoTask>> {
        self.base.find_one(doc! { "_id": id }).await
    }

    async fn transition(
        &self,
        id: &str,
        from: TaskStatus,
        to: TaskStatus,
        result: Option<TaskResult>,
        now: DateTime<Utc>,
    ) -> DaoResult<bool> {
        check_transition(from, to)?;

        let mut set = doc! {
            "status": to.as_str(),
            "updated_at": bson::DateTime::from_chrono(now),
        };
        if let Some(result) = result {
            set.insert("result", bson::to_bson(&result)?);
        }

        // Filtering on the current status makes the update a compare-and-set
        self.base
            .update_one(doc! { "_id": id, "status": from.as_str() }, doc! { "$set": set })
            .await
    }

    async fn find_by_status(&self, statuses: &[TaskStatus]) -> DaoResult<Vec<LogoTask>> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        self.base
            .find_many(
                doc! { "status": { "$in": statuses } },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }
}
