//! 核心数据模型定义
//!
//! 所有标识符都是不透明字符串，时间戳为 ISO-8601 格式（UTC）。
//! 序列化字段名与前端契约保持一致（camelCase）。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 管理员 - 完全访问权限
    Admin,
    /// 医生 - 诊断和病历权限
    Doctor,
    /// 前台 - 预约和登记权限
    Reception,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Reception => write!(f, "reception"),
        }
    }
}

/// 系统用户
///
/// 会话期间不可变，角色驱动视图层的权限控制。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 性别枚举
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// 患者基本信息
///
/// `notes` 始终存在（可能为空字符串），不是可选字段。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 搜索匹配串：姓、名、电话、邮箱按固定顺序空格连接
    pub fn search_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.first_name, self.last_name, self.phone, self.email
        )
    }
}

/// 病历类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MedicalRecordType {
    Diagnosis,
    Treatment,
    Prescription,
    Note,
}

/// 病历记录
///
/// 每条记录归属于唯一的患者，按 `patient_id` 分区存储。
/// `author` 是创建时刻的快照副本，不随后续用户编辑更新。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub author_id: String,
    pub author: User,
    #[serde(rename = "type")]
    pub record_type: MedicalRecordType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 预约状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
    NoShow,
}

/// 预约记录
///
/// `patient` 和 `doctor` 是创建时刻的快照副本（显式的陈旧性取舍），
/// 不是活引用，后续对患者或用户的编辑不会回填到已有预约。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub patient: Patient,
    pub doctor_id: String,
    pub doctor: User,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 仪表盘统计快照
///
/// 只读的派生数据，每次获取时重新计算，不做增量维护。
/// `recent_patients` 与 `upcoming_appointments` 各自截断为有界前缀。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub today_appointments: usize,
    pub new_patients_this_week: usize,
    pub completed_appointments_today: usize,
    pub pending_appointments: usize,
    pub recent_patients: Vec<Patient>,
    pub upcoming_appointments: Vec<Appointment>,
}

/// 患者创建草稿
///
/// 调用方提供的部分实体，缺少服务端分配的字段（id、时间戳）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
    pub notes: String,
}

/// 患者部分更新
///
/// 合并语义：提供的字段覆盖，缺省的字段保留，`updated_at` 刷新。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub notes: Option<String>,
}

impl PatientUpdate {
    /// 将部分更新合并到患者记录
    pub fn apply(self, patient: &mut Patient) {
        if let Some(first_name) = self.first_name {
            patient.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            patient.last_name = last_name;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender;
        }
        if let Some(phone) = self.phone {
            patient.phone = phone;
        }
        if let Some(email) = self.email {
            patient.email = email;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            patient.date_of_birth = date_of_birth;
        }
        if let Some(address) = self.address {
            patient.address = address;
        }
        if let Some(emergency_contact) = self.emergency_contact {
            patient.emergency_contact = emergency_contact;
        }
        if let Some(emergency_phone) = self.emergency_phone {
            patient.emergency_phone = emergency_phone;
        }
        if let Some(notes) = self.notes {
            patient.notes = notes;
        }
        patient.updated_at = Utc::now();
    }
}

/// 预约创建草稿
///
/// 不包含状态字段：新建预约总是从 Scheduled 开始。
/// `created_by` 由显式传入的当前用户上下文填充，不在草稿中。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub patient_id: String,
    pub doctor_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// 预约部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentUpdate {
    /// 将部分更新合并到预约记录
    pub fn apply(self, appointment: &mut Appointment) {
        if let Some(start_at) = self.start_at {
            appointment.start_at = start_at;
        }
        if let Some(end_at) = self.end_at {
            appointment.end_at = end_at;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(reason) = self.reason {
            appointment.reason = reason;
        }
        if let Some(notes) = self.notes {
            appointment.notes = Some(notes);
        }
        appointment.updated_at = Utc::now();
    }
}

/// 病历创建草稿
///
/// 不包含 `patient_id` 与 `author`：分区键由操作参数提供，
/// 作者快照从当前用户上下文解析。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordDraft {
    #[serde(rename = "type")]
    pub record_type: MedicalRecordType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
}
