//! 通用工具函数

use chrono::Utc;
use uuid::Uuid;

/// 生成新的实体标识符
///
/// 标识符对调用方是不透明字符串，真实后端可以换成服务端分配的ID。
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// 生成会话令牌
///
/// 不透明的 bearer 字符串。模拟环境下在客户端合成，
/// 真实后端中必须由服务端签发。
pub fn mint_session_token() -> String {
    format!(
        "session-{}-{}",
        Uuid::new_v4().simple(),
        Utc::now().timestamp_millis()
    )
}
