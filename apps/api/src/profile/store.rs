use sqlx::SqlitePool;

use crate::models::profile::Profile;

/// Validated profile fields as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub name: String,
    pub place: String,
    pub user_type: String,
    pub organization_name: Option<String>,
    pub details: String,
    pub interests: Option<String>,
    pub hobbies: Option<String>,
    pub additional_info: Option<String>,
}

pub async fn find_profile(pool: &SqlitePool, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_profile(
    pool: &SqlitePool,
    user_id: i64,
    fields: &ProfileFields,
    resume_path: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO profiles
            (user_id, name, place, user_type, organization_name, details,
             resume_path, interests, hobbies, additional_info)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&fields.name)
    .bind(&fields.place)
    .bind(&fields.user_type)
    .bind(&fields.organization_name)
    .bind(&fields.details)
    .bind(resume_path)
    .bind(&fields.interests)
    .bind(&fields.hobbies)
    .bind(&fields.additional_info)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Overwrites every editable field. `resume_path` is only replaced when a new
/// resume was uploaded.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    fields: &ProfileFields,
    new_resume_path: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE profiles SET
            name = ?, place = ?, user_type = ?, organization_name = ?, details = ?,
            interests = ?, hobbies = ?, additional_info = ?,
            resume_path = COALESCE(?, resume_path)
        WHERE user_id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.place)
    .bind(&fields.user_type)
    .bind(&fields.organization_name)
    .bind(&fields.details)
    .bind(&fields.interests)
    .bind(&fields.hobbies)
    .bind(&fields.additional_info)
    .bind(new_resume_path)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::insert_user;
    use crate::db::test_pool;

    fn fields(name: &str) -> ProfileFields {
        ProfileFields {
            name: name.to_string(),
            place: "London".to_string(),
            user_type: "student".to_string(),
            details: "Maths\n".to_string(),
            ..ProfileFields::default()
        }
    }

    #[tokio::test]
    async fn test_profile_is_one_to_one() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "ada", "ada@example.com", "h").await.unwrap();

        insert_profile(&pool, user_id, &fields("Ada"), None).await.unwrap();
        assert!(insert_profile(&pool, user_id, &fields("Ada again"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_keeps_resume_unless_replaced() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "ada", "ada@example.com", "h").await.unwrap();
        insert_profile(&pool, user_id, &fields("Ada"), Some("/r/old.pdf"))
            .await
            .unwrap();

        update_profile(&pool, user_id, &fields("Ada L."), None).await.unwrap();
        let profile = find_profile(&pool, user_id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Ada L.");
        assert_eq!(profile.resume_path.as_deref(), Some("/r/old.pdf"));

        update_profile(&pool, user_id, &fields("Ada L."), Some("/r/new.pdf"))
            .await
            .unwrap();
        let profile = find_profile(&pool, user_id).await.unwrap().unwrap();
        assert_eq!(profile.resume_path.as_deref(), Some("/r/new.pdf"));
    }
}
