//! 会话存储
//!
//! 固定命名空间下的持久键值记录，只保存 {user, token, isAuthenticated}，
//! 从不保存忙碌标志。恢复是同步操作，必须在视图决定是否显示登录页之前完成。

use clinic_core::{Result, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// 会话记录的固定命名空间键
pub const SESSION_NAMESPACE: &str = "auth-storage";

/// 持久化的会话记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: User,
    pub token: String,
    pub is_authenticated: bool,
}

/// 会话存储接口
///
/// 同步接口：进程启动时恢复不能等待异步调度。
pub trait SessionStore: Send + Sync {
    /// 读取持久化的会话，不存在时返回 None
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// 写入会话记录
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// 清除持久化足迹，重启后不得复活会话
    fn clear(&self) -> Result<()>;
}

/// 基于 JSON 文件的会话存储
///
/// 文件内容是以命名空间为键的对象映射，损坏的文件降级为无会话而不是报错。
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_namespaces(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("Session file {} is corrupt, ignoring: {}", self.path.display(), e);
                Ok(Map::new())
            }
        }
    }

    fn write_namespaces(&self, namespaces: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(namespaces)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let namespaces = self.read_namespaces()?;

        match namespaces.get(SESSION_NAMESPACE) {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    warn!("Persisted session entry is malformed, ignoring: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let mut namespaces = self.read_namespaces()?;
        namespaces.insert(
            SESSION_NAMESPACE.to_string(),
            serde_json::to_value(session)?,
        );
        self.write_namespaces(&namespaces)?;
        info!("Persisted session for user {}", session.user.email);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut namespaces = self.read_namespaces()?;
        namespaces.remove(SESSION_NAMESPACE);

        if namespaces.is_empty() {
            fs::remove_file(&self.path)?;
        } else {
            self.write_namespaces(&namespaces)?;
        }
        info!("Cleared persisted session");
        Ok(())
    }
}

/// 内存会话存储（测试用）
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一条会话记录，模拟上次运行留下的足迹
    pub fn seeded(session: PersistedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self
            .session
            .lock()
            .map_err(|_| clinic_core::ClinicError::Internal("session lock poisoned".to_string()))?
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self
            .session
            .lock()
            .map_err(|_| clinic_core::ClinicError::Internal("session lock poisoned".to_string()))? =
            Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .session
            .lock()
            .map_err(|_| clinic_core::ClinicError::Internal("session lock poisoned".to_string()))? =
            None;
        Ok(())
    }
}
