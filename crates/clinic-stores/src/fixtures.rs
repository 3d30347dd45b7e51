//! 模拟数据
//!
//! 模拟传输"返回"的种子数据，代替真实后端的响应体。
//! 预约中的患者/医生快照与对应的种子记录保持一致。

use chrono::{DateTime, NaiveDate, Utc};
use clinic_core::{
    Appointment, AppointmentStatus, Gender, MedicalRecord, MedicalRecordType, Patient, User,
    UserRole,
};

/// 模拟环境的共享登录口令
pub const MOCK_PASSWORD: &str = "password";

fn ts(value: &str) -> DateTime<Utc> {
    value.parse().unwrap_or_else(|_| Utc::now())
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap_or_default()
}

/// 种子用户：管理员、医生、前台各一
pub fn mock_users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            email: "admin@clinic.com".to_string(),
            first_name: "Alisher".to_string(),
            last_name: "Abdullayev".to_string(),
            role: UserRole::Admin,
            created_at: ts("2024-01-01T00:00:00Z"),
            updated_at: ts("2024-01-01T00:00:00Z"),
        },
        User {
            id: "2".to_string(),
            email: "doctor@clinic.com".to_string(),
            first_name: "Michael".to_string(),
            last_name: "Smith".to_string(),
            role: UserRole::Doctor,
            created_at: ts("2024-01-01T00:00:00Z"),
            updated_at: ts("2024-01-01T00:00:00Z"),
        },
        User {
            id: "3".to_string(),
            email: "reception@clinic.com".to_string(),
            first_name: "Sultonbek".to_string(),
            last_name: "Uskanboyev".to_string(),
            role: UserRole::Reception,
            created_at: ts("2024-01-01T00:00:00Z"),
            updated_at: ts("2024-01-01T00:00:00Z"),
        },
    ]
}

/// 种子用户中的医生
pub fn mock_doctors() -> Vec<User> {
    mock_users()
        .into_iter()
        .filter(|user| user.role == UserRole::Doctor)
        .collect()
}

/// 种子患者
pub fn mock_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: "1".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            gender: Gender::Male,
            phone: "+998901234567".to_string(),
            email: "john.doe@email.com".to_string(),
            date_of_birth: date("1985-03-15"),
            address: "123 Main St, Tashkent".to_string(),
            emergency_contact: "Jane Doe".to_string(),
            emergency_phone: "+998907654321".to_string(),
            notes: "Regular checkups needed".to_string(),
            created_at: ts("2024-01-15T10:00:00Z"),
            updated_at: ts("2024-01-15T10:00:00Z"),
        },
        Patient {
            id: "2".to_string(),
            first_name: "Maria".to_string(),
            last_name: "Garcia".to_string(),
            gender: Gender::Female,
            phone: "+998901234568".to_string(),
            email: "maria.garcia@email.com".to_string(),
            date_of_birth: date("1992-07-22"),
            address: "456 Oak Ave, Tashkent".to_string(),
            emergency_contact: "Carlos Garcia".to_string(),
            emergency_phone: "+998907654322".to_string(),
            notes: "Allergic to penicillin".to_string(),
            created_at: ts("2024-01-10T14:30:00Z"),
            updated_at: ts("2024-01-10T14:30:00Z"),
        },
        Patient {
            id: "3".to_string(),
            first_name: "Ahmed".to_string(),
            last_name: "Hassan".to_string(),
            gender: Gender::Male,
            phone: "+998901234569".to_string(),
            email: "ahmed.hassan@email.com".to_string(),
            date_of_birth: date("1978-11-08"),
            address: "789 Elm St, Tashkent".to_string(),
            emergency_contact: "Fatima Hassan".to_string(),
            emergency_phone: "+998907654323".to_string(),
            notes: "Diabetes patient".to_string(),
            created_at: ts("2024-01-05T09:15:00Z"),
            updated_at: ts("2024-01-05T09:15:00Z"),
        },
    ]
}

/// 种子预约
///
/// 患者/医生字段是对应种子记录在创建时刻的快照。
pub fn mock_appointments() -> Vec<Appointment> {
    let patients = mock_patients();
    let users = mock_users();
    let doctor = users[1].clone();

    vec![
        Appointment {
            id: "1".to_string(),
            patient_id: patients[0].id.clone(),
            patient: patients[0].clone(),
            doctor_id: doctor.id.clone(),
            doctor: doctor.clone(),
            start_at: ts("2024-01-25T09:00:00Z"),
            end_at: ts("2024-01-25T09:30:00Z"),
            status: AppointmentStatus::Scheduled,
            reason: "Regular checkup".to_string(),
            notes: None,
            created_by: "3".to_string(),
            created_at: ts("2024-01-20T08:00:00Z"),
            updated_at: ts("2024-01-20T08:00:00Z"),
        },
        Appointment {
            id: "2".to_string(),
            patient_id: patients[1].id.clone(),
            patient: patients[1].clone(),
            doctor_id: doctor.id.clone(),
            doctor,
            start_at: ts("2024-01-25T14:00:00Z"),
            end_at: ts("2024-01-25T14:30:00Z"),
            status: AppointmentStatus::Scheduled,
            reason: "Follow-up consultation".to_string(),
            notes: None,
            created_by: "3".to_string(),
            created_at: ts("2024-01-20T10:00:00Z"),
            updated_at: ts("2024-01-20T10:00:00Z"),
        },
    ]
}

/// 某个患者分区的种子病历
pub fn mock_medical_records(patient_id: &str) -> Vec<MedicalRecord> {
    let users = mock_users();
    let doctor = users[1].clone();

    vec![MedicalRecord {
        id: format!("rec-{}-1", patient_id),
        patient_id: patient_id.to_string(),
        author_id: doctor.id.clone(),
        author: doctor,
        record_type: MedicalRecordType::Diagnosis,
        title: "Annual Checkup".to_string(),
        description: "Patient appears healthy. Vital signs normal.".to_string(),
        prescription: None,
        attachments: None,
        created_at: ts("2024-01-20T11:00:00Z"),
        updated_at: ts("2024-01-20T11:00:00Z"),
    }]
}
