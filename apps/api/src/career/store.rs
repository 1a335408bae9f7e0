use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::career::plan::PlanDay;
use crate::models::career::{CareerPlan, DailyTask};
use crate::models::chat::{ChatMessage, ChatSession, Sender, DEFAULT_SESSION_NAME};

// ────────────────────────────────────────────────────────────────────────────
// Chat sessions
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_sessions(pool: &SqlitePool, user_id: i64) -> Result<Vec<ChatSession>, sqlx::Error> {
    sqlx::query_as::<_, ChatSession>(
        "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY created_date DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_session(pool: &SqlitePool, session_id: i64) -> Result<Option<ChatSession>, sqlx::Error> {
    sqlx::query_as::<_, ChatSession>("SELECT * FROM chat_sessions WHERE id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_session(pool: &SqlitePool, user_id: i64) -> Result<ChatSession, sqlx::Error> {
    sqlx::query_as::<_, ChatSession>(
        r#"
        INSERT INTO chat_sessions (user_id, session_name, created_date, has_career_plan)
        VALUES (?, ?, ?, 0)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_SESSION_NAME)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Every message of a session, oldest first.
pub async fn session_messages(pool: &SqlitePool, session_id: i64) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY timestamp, id",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}

pub async fn add_message(
    pool: &SqlitePool,
    session_id: i64,
    sender: Sender,
    content: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO chat_messages (session_id, timestamp, sender, content) VALUES (?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(Utc::now())
    .bind(sender.as_str())
    .bind(content)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn rename_session(pool: &SqlitePool, session_id: i64, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chat_sessions SET session_name = ? WHERE id = ?")
        .bind(name)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes a session and its messages together.
pub async fn delete_session(pool: &SqlitePool, session_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
        .bind(session_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

// ────────────────────────────────────────────────────────────────────────────
// Career plans
// ────────────────────────────────────────────────────────────────────────────

/// Stores `days` as the user's only active plan. The previous active plan is
/// deactivated and the originating chat session flagged in the same
/// transaction.
pub async fn create_active_plan(
    pool: &SqlitePool,
    user_id: i64,
    career_goal: &str,
    days: &[PlanDay],
    session_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE career_plans SET is_active = 0 WHERE user_id = ? AND is_active = 1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let plan_id = sqlx::query(
        r#"
        INSERT INTO career_plans (user_id, career_goal, created_date, last_updated, is_active)
        VALUES (?, ?, ?, ?, 1)
        "#,
    )
    .bind(user_id)
    .bind(career_goal)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for day in days {
        let resources = serde_json::to_string(&day.resources).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            r#"
            INSERT INTO daily_tasks (career_plan_id, day_number, task_description, resources, is_completed)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(plan_id)
        .bind(day.day)
        .bind(&day.task)
        .bind(resources)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(session_id) = session_id {
        sqlx::query("UPDATE chat_sessions SET has_career_plan = 1 WHERE id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(plan_id)
}

/// Whether the user has ever had a plan, active or not.
pub async fn has_any_plan(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM career_plans WHERE user_id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn active_plan(pool: &SqlitePool, user_id: i64) -> Result<Option<CareerPlan>, sqlx::Error> {
    sqlx::query_as::<_, CareerPlan>(
        "SELECT * FROM career_plans WHERE user_id = ? AND is_active = 1 ORDER BY id DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Tasks of a plan ordered by day.
pub async fn plan_tasks(pool: &SqlitePool, plan_id: i64) -> Result<Vec<DailyTask>, sqlx::Error> {
    sqlx::query_as::<_, DailyTask>(
        "SELECT * FROM daily_tasks WHERE career_plan_id = ? ORDER BY day_number, id",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
}

/// Deletes the active plan and its tasks. Returns false when there was none.
pub async fn clear_active_plan(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let Some(plan) = active_plan(pool, user_id).await? else {
        return Ok(false);
    };
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM daily_tasks WHERE career_plan_id = ?")
        .bind(plan.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM career_plans WHERE id = ?")
        .bind(plan.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(true)
}

/// A task together with the user owning its plan.
#[derive(Debug, FromRow)]
pub struct OwnedTask {
    pub task_id: i64,
    pub plan_id: i64,
    pub owner_id: i64,
}

pub async fn find_task_owner(pool: &SqlitePool, task_id: i64) -> Result<Option<OwnedTask>, sqlx::Error> {
    sqlx::query_as::<_, OwnedTask>(
        r#"
        SELECT t.id AS task_id, p.id AS plan_id, p.user_id AS owner_id
        FROM daily_tasks t
        JOIN career_plans p ON p.id = t.career_plan_id
        WHERE t.id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
}

/// Marks a task done now and touches its plan's `last_updated`.
pub async fn complete_task(pool: &SqlitePool, task: &OwnedTask) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE daily_tasks SET is_completed = 1, completed_date = ? WHERE id = ?")
        .bind(now)
        .bind(task.task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE career_plans SET last_updated = ? WHERE id = ?")
        .bind(now)
        .bind(task.plan_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
