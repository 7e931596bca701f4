use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::{Context, anyhow};
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let session_cache: Arc<dyn SessionCache> = match settings.session.backend.as_str() {
            "memory" => Arc::new(MemorySessionCache::new(
                settings.session.key_prefix.clone(),
                clock.clone(),
            )),
            "redis" => {
                let url = settings
                    .session
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("session.redis_url is required for redis"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client
                    .get_connection_manager()
                    .await
                    .context("connecting to redis")?;
                Arc::new(RedisSessionCache::new(
                    redis_manager,
                    settings.session.key_prefix.clone(),
                ))
            }
            other => return Err(anyhow!("Unknown session backend: {}", other)),
        };

        let mut pool = None;
        let user_repo: Arc<dyn UserRepo> = match settings.user.backend.as_str() {
            "memory" => Arc::new(MemoryUserRepo::new()),
            "mysql" => {
                let url = settings
                    .user
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("user.database_url is required for mysql"))?;
                let mysql = Pool::<MySql>::connect(url)
                    .await
                    .context("connecting to mysql")?;
                pool = Some(mysql.clone());
                Arc::new(MySqlUserRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let password = &settings.password;
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(
            Argon2PasswordHasher::with_params(
                password.memory_kib,
                password.iterations,
                password.parallelism,
            )
            .map_err(|e| anyhow!(e))?,
        );

        let jwt = &settings.jwt;
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(
            JwtConfig {
                issuer: jwt.issuer.clone(),
                access_secret: jwt.access_secret.clone().into_bytes(),
                refresh_secret: jwt.refresh_secret.clone().into_bytes(),
                access_ttl: jwt.access_ttl(),
                refresh_ttl: jwt.refresh_ttl(),
            },
            clock.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo,
            credential_hasher,
            token_codec,
            session_cache,
            clock,
            SessionTtl::new(jwt.access_ttl(), jwt.refresh_ttl()),
        ));

        info!(
            session = %settings.session.backend,
            user = %settings.user.backend,
            "server started"
        );

        Ok(Self { auth_service, pool })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
