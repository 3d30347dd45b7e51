//! 预约存储
//!
//! 独占会话内的预约集合。创建时从患者/医生目录解析反规范化快照，
//! 目录查不到就显式拒绝，绝不顶替一条无关记录。

use crate::fixtures;
use crate::state_machine::AppointmentStateMachine;
use crate::transport::{RequestClass, Transport};
use clinic_core::{
    utils, Appointment, AppointmentDraft, AppointmentStatus, AppointmentUpdate, ClinicError,
    Patient, Result, User,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 预约状态切片
#[derive(Debug, Clone, Default)]
struct AppointmentsState {
    appointments: Vec<Appointment>,
    is_loading: bool,
}

/// 预约存储
#[derive(Clone)]
pub struct AppointmentsStore {
    state: Arc<RwLock<AppointmentsState>>,
    transport: Arc<dyn Transport>,
    lifecycle: AppointmentStateMachine,
    patient_directory: HashMap<String, Patient>,
    doctor_directory: HashMap<String, User>,
}

impl AppointmentsStore {
    /// 创建预约存储，快照目录来自种子数据
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_directory(transport, fixtures::mock_patients(), fixtures::mock_doctors())
    }

    /// 使用自定义快照目录创建预约存储
    pub fn with_directory(
        transport: Arc<dyn Transport>,
        patients: Vec<Patient>,
        doctors: Vec<User>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(AppointmentsState::default())),
            transport,
            lifecycle: AppointmentStateMachine::new(),
            patient_directory: patients.into_iter().map(|p| (p.id.clone(), p)).collect(),
            doctor_directory: doctors.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// 拉取预约集合
    ///
    /// 无过滤、无分页；忙碌标志在延迟窗口前后恰好经历一次 busy→idle。
    pub async fn fetch_appointments(&self) -> Result<Vec<Appointment>> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
        }

        let outcome = self.transport.round_trip(RequestClass::Fetch).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        outcome?;

        state.appointments = fixtures::mock_appointments();
        info!("Fetched {} appointments", state.appointments.len());
        Ok(state.appointments.clone())
    }

    /// 当前预约集合
    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.read().await.appointments.clone()
    }

    /// 新建预约
    ///
    /// 草稿不携带状态，新预约总是 Scheduled；`created_by` 取自
    /// 显式传入的当前用户。目录查不到患者或医生时拒绝。
    pub async fn create(&self, draft: AppointmentDraft, acting_user: &User) -> Result<Appointment> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        if draft.start_at >= draft.end_at {
            warn!("Rejecting appointment draft with inverted time window");
            return Err(ClinicError::Validation(
                "appointment must start before it ends".to_string(),
            ));
        }

        let patient = self
            .patient_directory
            .get(&draft.patient_id)
            .cloned()
            .ok_or_else(|| {
                warn!("Unknown patient {} in appointment draft", draft.patient_id);
                ClinicError::NotFound(format!("patient {} not found", draft.patient_id))
            })?;

        let doctor = self
            .doctor_directory
            .get(&draft.doctor_id)
            .cloned()
            .ok_or_else(|| {
                warn!("Unknown doctor {} in appointment draft", draft.doctor_id);
                ClinicError::NotFound(format!("doctor {} not found", draft.doctor_id))
            })?;

        let now = Utc::now();
        let appointment = Appointment {
            id: utils::new_entity_id(),
            patient_id: draft.patient_id,
            patient,
            doctor_id: draft.doctor_id,
            doctor,
            start_at: draft.start_at,
            end_at: draft.end_at,
            status: AppointmentStatus::Scheduled,
            reason: draft.reason,
            notes: draft.notes,
            created_by: acting_user.id.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        state.appointments.push(appointment.clone());
        info!(
            "Created appointment {} for patient {}",
            appointment.id, appointment.patient_id
        );
        Ok(appointment)
    }

    /// 更新预约
    ///
    /// 合并语义；标识符不存在时是无操作，返回 None。
    pub async fn update(&self, id: &str, update: AppointmentUpdate) -> Result<Option<Appointment>> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        let mut state = self.state.write().await;
        let updated = match state.appointments.iter_mut().find(|a| a.id == id) {
            Some(appointment) => {
                update.apply(appointment);
                info!("Updated appointment {}", appointment.id);
                Some(appointment.clone())
            }
            None => None,
        };

        Ok(updated)
    }

    /// 设置预约状态
    ///
    /// `update` 在状态字段上的便捷限制。存储保持宽容：接受全部四个
    /// 状态值，视图层再按状态机限制可见的转换。
    pub async fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>> {
        self.update(
            id,
            AppointmentUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// 删除预约
    ///
    /// 标识符不存在时是无操作。
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        let mut state = self.state.write().await;
        let before = state.appointments.len();
        state.appointments.retain(|a| a.id != id);
        if state.appointments.len() < before {
            info!("Removed appointment {}", id);
        }
        Ok(())
    }

    /// 视图可见的生命周期转换表
    pub fn lifecycle(&self) -> &AppointmentStateMachine {
        &self.lifecycle
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }
}
