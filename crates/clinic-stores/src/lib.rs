//! # Clinic Stores
//!
//! 诊所管理系统的领域状态层：认证、患者、预约和仪表盘四个域存储，
//! 以及它们共享的模拟传输抽象与预约状态机。
//!
//! 每个存储独占一个状态切片并是该切片的唯一写入方；视图层只读取
//! 状态并调用操作，从不直接修改集合。所有操作在模拟延迟边界有且
//! 只有一个挂起点，状态变更对调用方是单步原子替换。

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod fixtures;
pub mod patients;
pub mod settings;
pub mod state_machine;
pub mod transport;

pub use appointments::AppointmentsStore;
pub use auth::AuthStore;
pub use dashboard::{compute_stats, DashboardStore, PROJECTION_LIMIT};
pub use patients::{filter_patients, PatientsStore};
pub use settings::{StoreSettings, TransportSettings};
pub use state_machine::{AppointmentEvent, AppointmentStateMachine};
pub use transport::{InstantTransport, RequestClass, SimulatedTransport, Transport};
