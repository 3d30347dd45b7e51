//! # Clinic Session
//!
//! 会话持久化：把认证身份的子集写入持久的客户端键值存储，
//! 使登录状态在进程重启后可以同步恢复。

pub mod storage;

pub use storage::{
    FileSessionStore, MemorySessionStore, PersistedSession, SessionStore, SESSION_NAMESPACE,
};
