//! 模拟传输抽象
//!
//! 存储操作的唯一挂起点。模拟实现用固定延迟代替一次网络往返；
//! 替换为真实客户端时存储的操作签名保持不变。

use async_trait::async_trait;
use clinic_core::Result;
use std::time::Duration;
use tracing::debug;

/// 请求类别
///
/// 不同类别对应不同的模拟延迟档位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// 拉取集合
    Fetch,
    /// 按标识符查找单条记录
    Lookup,
    /// 登录验证
    Login,
    /// 变更操作
    Mutate,
}

/// 传输接口
///
/// 一次往返要么整体完成要么整体失败，不暴露部分失败状态。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, class: RequestClass) -> Result<()>;
}

/// 模拟延迟传输
///
/// 延迟档位复刻原型环境：拉取 800ms、单条查找 500ms、登录 1000ms、
/// 变更即时生效。
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    fetch: Duration,
    lookup: Duration,
    login: Duration,
    mutate: Duration,
}

impl SimulatedTransport {
    pub fn new(fetch: Duration, lookup: Duration, login: Duration, mutate: Duration) -> Self {
        Self {
            fetch,
            lookup,
            login,
            mutate,
        }
    }

    fn delay_for(&self, class: RequestClass) -> Duration {
        match class {
            RequestClass::Fetch => self.fetch,
            RequestClass::Lookup => self.lookup,
            RequestClass::Login => self.login,
            RequestClass::Mutate => self.mutate,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self {
            fetch: Duration::from_millis(800),
            lookup: Duration::from_millis(500),
            login: Duration::from_millis(1000),
            mutate: Duration::ZERO,
        }
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn round_trip(&self, class: RequestClass) -> Result<()> {
        let delay = self.delay_for(class);
        debug!("Simulating {:?} round trip ({:?})", class, delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// 即时传输（测试用）
#[derive(Debug, Clone, Default)]
pub struct InstantTransport;

#[async_trait]
impl Transport for InstantTransport {
    async fn round_trip(&self, _class: RequestClass) -> Result<()> {
        Ok(())
    }
}
