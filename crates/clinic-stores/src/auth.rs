//! 认证存储
//!
//! "当前登录者"的唯一事实来源，也是唯一带持久化足迹的存储。
//! 构造时同步恢复上次会话，登出时同时清除内存与持久化状态。

use crate::fixtures;
use crate::transport::{RequestClass, Transport};
use clinic_core::{utils, ClinicError, Result, User};
use clinic_session::{PersistedSession, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 认证状态切片
#[derive(Debug, Clone, Default)]
struct AuthState {
    user: Option<User>,
    token: Option<String>,
    is_authenticated: bool,
    is_loading: bool,
}

/// 认证存储
#[derive(Clone)]
pub struct AuthStore {
    state: Arc<RwLock<AuthState>>,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    directory: HashMap<String, User>,
    passphrase: String,
}

impl AuthStore {
    /// 创建认证存储并同步恢复持久化会话
    ///
    /// 凭证目录来自种子用户，口令为模拟环境的共享口令。
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionStore>) -> Self {
        Self::with_directory(
            transport,
            session,
            fixtures::mock_users(),
            fixtures::MOCK_PASSWORD,
        )
    }

    /// 使用自定义凭证目录创建认证存储
    pub fn with_directory(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        users: Vec<User>,
        passphrase: impl Into<String>,
    ) -> Self {
        let directory = users
            .into_iter()
            .map(|user| (user.email.clone(), user))
            .collect();

        // 恢复必须在任何视图决策之前完成，失败降级为未登录
        let state = match session.load() {
            Ok(Some(persisted)) => {
                info!("Restored session for user {}", persisted.user.email);
                AuthState {
                    user: Some(persisted.user),
                    token: Some(persisted.token),
                    is_authenticated: persisted.is_authenticated,
                    is_loading: false,
                }
            }
            Ok(None) => AuthState::default(),
            Err(e) => {
                warn!("Failed to restore session, starting logged out: {}", e);
                AuthState::default()
            }
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            transport,
            session,
            directory,
            passphrase: passphrase.into(),
        }
    }

    /// 用户登录
    ///
    /// 成功时签发 {user, token} 并持久化；失败时此前的状态保持不变。
    /// 无论结果如何，忙碌标志恰好经历一次 busy→idle。
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
        }

        let outcome = self.authenticate(email, password).await;

        let mut state = self.state.write().await;
        state.is_loading = false;

        match outcome {
            Ok(user) => {
                let token = utils::mint_session_token();
                state.user = Some(user.clone());
                state.token = Some(token.clone());
                state.is_authenticated = true;
                drop(state);

                let persisted = PersistedSession {
                    user: user.clone(),
                    token,
                    is_authenticated: true,
                };
                if let Err(e) = self.session.save(&persisted) {
                    warn!("Failed to persist session: {}", e);
                }

                info!("User logged in: {}", email);
                Ok(user)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                Err(e)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        self.transport.round_trip(RequestClass::Login).await?;

        let user = self
            .directory
            .get(email)
            .ok_or(ClinicError::InvalidCredentials)?;

        if password != self.passphrase {
            return Err(ClinicError::InvalidCredentials);
        }

        Ok(user.clone())
    }

    /// 登出
    ///
    /// 清除内存状态和持久化足迹，重启后不得复活会话。
    pub async fn logout(&self) {
        {
            let mut state = self.state.write().await;
            state.user = None;
            state.token = None;
            state.is_authenticated = false;
        }

        if let Err(e) = self.session.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
        info!("User logged out");
    }

    /// 当前登录用户
    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// 当前会话令牌
    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InstantTransport;
    use clinic_core::UserRole;
    use clinic_session::MemorySessionStore;

    fn store_with_memory_session() -> (AuthStore, Arc<MemorySessionStore>) {
        let session = Arc::new(MemorySessionStore::new());
        let store = AuthStore::new(Arc::new(InstantTransport), session.clone());
        (store, session)
    }

    #[tokio::test]
    async fn test_login_success_yields_doctor_role() {
        let (store, session) = store_with_memory_session();

        let user = store.login("doctor@clinic.com", "password").await.unwrap();
        assert_eq!(user.role, UserRole::Doctor);
        assert!(store.is_authenticated().await);
        assert!(store.token().await.is_some());
        assert!(!store.is_loading().await);

        // 会话足迹已持久化，且从不包含忙碌标志
        let persisted = session.load().unwrap().unwrap();
        assert_eq!(persisted.user.email, "doctor@clinic.com");
        assert!(persisted.is_authenticated);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails_and_leaves_state_untouched() {
        let (store, session) = store_with_memory_session();

        let result = store.login("doctor@clinic.com", "wrong").await;
        assert!(matches!(result, Err(ClinicError::InvalidCredentials)));
        assert!(!store.is_authenticated().await);
        assert!(store.current_user().await.is_none());
        assert!(store.token().await.is_none());
        // 忙碌标志已回到 idle
        assert!(!store.is_loading().await);
        assert!(session.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_unknown_email_fails() {
        let (store, _session) = store_with_memory_session();

        let result = store.login("nobody@clinic.com", "password").await;
        assert!(matches!(result, Err(ClinicError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_failed_login_preserves_previous_session() {
        let (store, _session) = store_with_memory_session();

        store.login("admin@clinic.com", "password").await.unwrap();
        let before = store.current_user().await;

        let result = store.login("admin@clinic.com", "wrong").await;
        assert!(result.is_err());
        // 失败不影响已有登录
        assert_eq!(store.current_user().await, before);
        assert!(store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_persisted_state() {
        let (store, session) = store_with_memory_session();

        store.login("doctor@clinic.com", "password").await.unwrap();
        store.logout().await;

        assert!(!store.is_authenticated().await);
        assert!(store.current_user().await.is_none());
        assert!(store.token().await.is_none());
        assert!(session.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_restored_at_construction() {
        let session = Arc::new(MemorySessionStore::new());

        // 第一次运行：登录后留下足迹
        {
            let store = AuthStore::new(Arc::new(InstantTransport), session.clone());
            store.login("reception@clinic.com", "password").await.unwrap();
        }

        // 第二次运行：构造时同步恢复
        let store = AuthStore::new(Arc::new(InstantTransport), session);
        assert!(store.is_authenticated().await);
        let user = store.current_user().await.unwrap();
        assert_eq!(user.email, "reception@clinic.com");
        assert_eq!(user.role, UserRole::Reception);
    }
}
