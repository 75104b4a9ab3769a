use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::PgPool;
use crate::error::StoreError;
use crate::pings::Ping;
use crate::schema::pings;

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::pings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct PingRow {
    id: Uuid,
    message: String,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PingsRepository {
    pool: PgPool,
}

impl PingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ping: &Ping) -> Result<(), StoreError> {
        let row = PingRow {
            id: ping.id,
            message: ping.message.clone(),
            created_at: ping.created_at,
        };
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            diesel::insert_into(pings::table)
                .values(&row)
                .execute(&mut conn)?;
            Ok::<(), StoreError>(())
        })
        .await??;

        Ok(())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let pool = self.pool.clone();

        let count = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let count = pings::table.count().get_result(&mut conn)?;
            Ok::<i64, StoreError>(count)
        })
        .await??;

        Ok(count)
    }
}
