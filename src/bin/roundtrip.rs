//! Roundtrip smoke binary.
//!
//! Declares a users table, inserts one row, and reads it back through the
//! pool. Expects `DB_*` environment variables pointing at a reachable
//! PostgreSQL instance.

use std::sync::Arc;
use tablemap::*;

#[tokio::main]
async fn main() {
    log();
    let registry = Registry::new();
    let users = registry
        .declare(
            Schema::builder("users")
                .field(Field::varchar("id", 50).primary_key().default_with(next_id))
                .field(Field::string("name"))
                .field(Field::integer("age").default_value(0i64)),
        )
        .unwrap();
    let pool = Pool::init(Config::from_env()).await.unwrap();
    pool.write(
        r#"CREATE TABLE IF NOT EXISTS "users" ("id" varchar(50) PRIMARY KEY, "name" varchar(100), "age" bigint)"#,
        &[],
        true,
    )
    .await
    .unwrap();

    let mut user = Record::new(Arc::clone(&users));
    user.set("name", "Alice").unwrap();
    user.save(&pool).await.unwrap();
    let key = user.get("id").cloned().unwrap();
    log::info!("saved user ({:?})", key);

    let found = users
        .find_all(
            &pool,
            Filter::new().condition(r#""id" = ?"#, vec![key.clone()]),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("age"), Some(&Value::Int(0)));
    log::info!("roundtrip verified ({:?})", key);

    user.remove(&pool).await.unwrap();
    pool.close();
    pool.wait_closed().await;
}
