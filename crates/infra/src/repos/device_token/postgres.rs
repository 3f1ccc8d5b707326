use super::IDeviceTokenRepo;
use eppets_scheduler_domain::{DeviceToken, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresDeviceTokenRepo {
    pool: PgPool,
}

impl PostgresDeviceTokenRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DeviceTokenRaw {
    user_uid: Uuid,
    fcm_token: String,
    platform: String,
}

impl Into<DeviceToken> for DeviceTokenRaw {
    fn into(self) -> DeviceToken {
        DeviceToken {
            user_id: self.user_uid.into(),
            token: self.fcm_token,
            // The db constraint only allows valid platforms
            platform: self.platform.parse().unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl IDeviceTokenRepo for PostgresDeviceTokenRepo {
    async fn insert(&self, device_token: &DeviceToken) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fcm_tokens
            (user_uid, fcm_token, platform)
            VALUES($1, $2, $3)
            ON CONFLICT (user_uid, fcm_token) DO NOTHING
            "#,
        )
        .bind(device_token.user_id.inner_ref())
        .bind(&device_token.token)
        .bind(device_token.platform.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<DeviceToken> {
        let device_tokens: Vec<DeviceTokenRaw> = sqlx::query_as(
            r#"
            SELECT * FROM fcm_tokens AS t
            WHERE t.user_uid = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to query device tokens for user {}: {:?}", user_id, e);
            vec![]
        });

        device_tokens.into_iter().map(|t| t.into()).collect()
    }

    async fn delete(&self, user_id: &ID, token: &str) -> Option<DeviceToken> {
        match sqlx::query_as::<_, DeviceTokenRaw>(
            r#"
            DELETE FROM fcm_tokens AS t
            WHERE t.user_uid = $1 AND t.fcm_token = $2
            RETURNING *
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(token)
        .fetch_one(&self.pool)
        .await
        {
            Ok(device_token) => Some(device_token.into()),
            Err(_) => None,
        }
    }
}
