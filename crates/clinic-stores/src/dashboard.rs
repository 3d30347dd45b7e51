//! 仪表盘存储
//!
//! 只读聚合快照，每次 `fetch_stats` 都从传入的患者/预约快照整体
//! 重新计算，不做增量维护。输入是显式参数，不读取环境全局状态，
//! 也不跨存储调用。

use crate::transport::{RequestClass, Transport};
use chrono::{DateTime, Duration, Utc};
use clinic_core::{Appointment, AppointmentStatus, DashboardStats, Patient, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 有界投影的截断长度
pub const PROJECTION_LIMIT: usize = 5;

/// 仪表盘状态切片
#[derive(Debug, Clone, Default)]
struct DashboardState {
    stats: Option<DashboardStats>,
    is_loading: bool,
}

/// 仪表盘存储
#[derive(Clone)]
pub struct DashboardStore {
    state: Arc<RwLock<DashboardState>>,
    transport: Arc<dyn Transport>,
}

impl DashboardStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Arc::new(RwLock::new(DashboardState::default())),
            transport,
        }
    }

    /// 重新计算统计快照
    pub async fn fetch_stats(
        &self,
        patients: &[Patient],
        appointments: &[Appointment],
    ) -> Result<DashboardStats> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
        }

        let outcome = self.transport.round_trip(RequestClass::Fetch).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        outcome?;

        let stats = compute_stats(patients, appointments, Utc::now());
        state.stats = Some(stats.clone());
        info!(
            "Recomputed dashboard stats: {} patients, {} pending appointments",
            stats.total_patients, stats.pending_appointments
        );
        Ok(stats)
    }

    /// 上次计算的快照
    pub async fn stats(&self) -> Option<DashboardStats> {
        self.state.read().await.stats.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }
}

/// 从患者/预约快照计算仪表盘统计
///
/// 纯函数：`now` 显式传入以便测试。"今天"按 UTC 日历日划分，
/// "本周新增"是过去 7 天的滑动窗口。
pub fn compute_stats(
    patients: &[Patient],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    let week_ago = now - Duration::days(7);

    let today_appointments = appointments
        .iter()
        .filter(|a| a.start_at.date_naive() == today)
        .count();

    let completed_appointments_today = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed && a.start_at.date_naive() == today)
        .count();

    let pending_appointments = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .count();

    let new_patients_this_week = patients.iter().filter(|p| p.created_at >= week_ago).count();

    // 最近创建的患者在前
    let mut recent_patients = patients.to_vec();
    recent_patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_patients.truncate(PROJECTION_LIMIT);

    // 即将到来的预约：仍为 Scheduled 且开始时间不早于当前时刻，最近的在前
    let mut upcoming_appointments: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.start_at >= now)
        .cloned()
        .collect();
    upcoming_appointments.sort_by(|a, b| a.start_at.cmp(&b.start_at));
    upcoming_appointments.truncate(PROJECTION_LIMIT);

    DashboardStats {
        total_patients: patients.len(),
        today_appointments,
        new_patients_this_week,
        completed_appointments_today,
        pending_appointments,
        recent_patients,
        upcoming_appointments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::transport::InstantTransport;

    fn patient_created_at(id: &str, created_at: DateTime<Utc>) -> Patient {
        let mut patient = fixtures::mock_patients()[0].clone();
        patient.id = id.to_string();
        patient.created_at = created_at;
        patient
    }

    fn appointment_at(
        id: &str,
        start_at: DateTime<Utc>,
        status: AppointmentStatus,
    ) -> Appointment {
        let mut appointment = fixtures::mock_appointments()[0].clone();
        appointment.id = id.to_string();
        appointment.start_at = start_at;
        appointment.end_at = start_at + Duration::minutes(30);
        appointment.status = status;
        appointment
    }

    #[test]
    fn test_counts_bucket_by_utc_day_and_status() {
        let now: DateTime<Utc> = "2024-02-01T12:00:00Z".parse().unwrap();

        let patients = vec![
            patient_created_at("a", now - Duration::days(1)),
            patient_created_at("b", now - Duration::days(10)),
        ];
        let appointments = vec![
            appointment_at("1", now + Duration::hours(2), AppointmentStatus::Scheduled),
            appointment_at("2", now - Duration::hours(3), AppointmentStatus::Completed),
            appointment_at("3", now - Duration::days(2), AppointmentStatus::Completed),
            appointment_at("4", now + Duration::days(1), AppointmentStatus::Scheduled),
            appointment_at("5", now - Duration::hours(1), AppointmentStatus::Canceled),
        ];

        let stats = compute_stats(&patients, &appointments, now);

        assert_eq!(stats.total_patients, 2);
        // 今天 = 1、2、5 号预约
        assert_eq!(stats.today_appointments, 3);
        assert_eq!(stats.completed_appointments_today, 1);
        assert_eq!(stats.pending_appointments, 2);
        assert_eq!(stats.new_patients_this_week, 1);
    }

    #[test]
    fn test_projections_capped_and_ordered() {
        let now: DateTime<Utc> = "2024-02-01T12:00:00Z".parse().unwrap();

        let patients: Vec<Patient> = (0..8)
            .map(|i| patient_created_at(&format!("p{}", i), now - Duration::days(i)))
            .collect();
        let appointments: Vec<Appointment> = (0..8)
            .map(|i| {
                appointment_at(
                    &format!("a{}", i),
                    now + Duration::hours(8 - i),
                    AppointmentStatus::Scheduled,
                )
            })
            .collect();

        let stats = compute_stats(&patients, &appointments, now);

        // 上限为 5，最近创建的患者在前
        assert_eq!(stats.recent_patients.len(), PROJECTION_LIMIT);
        assert_eq!(stats.recent_patients[0].id, "p0");

        // 最早开始的预约在前
        assert_eq!(stats.upcoming_appointments.len(), PROJECTION_LIMIT);
        assert_eq!(stats.upcoming_appointments[0].id, "a7");
    }

    #[test]
    fn test_past_and_terminal_appointments_not_upcoming() {
        let now: DateTime<Utc> = "2024-02-01T12:00:00Z".parse().unwrap();

        let appointments = vec![
            appointment_at("past", now - Duration::hours(1), AppointmentStatus::Scheduled),
            appointment_at("done", now + Duration::hours(1), AppointmentStatus::Completed),
            appointment_at("next", now + Duration::hours(2), AppointmentStatus::Scheduled),
        ];

        let stats = compute_stats(&[], &appointments, now);

        assert_eq!(stats.upcoming_appointments.len(), 1);
        assert_eq!(stats.upcoming_appointments[0].id, "next");
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let now: DateTime<Utc> = "2024-02-01T12:00:00Z".parse().unwrap();
        let patients = fixtures::mock_patients();
        let appointments = fixtures::mock_appointments();

        let first = compute_stats(&patients, &appointments, now);
        let second = compute_stats(&patients, &appointments, now);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_stats_stores_snapshot() {
        let store = DashboardStore::new(Arc::new(InstantTransport));
        assert!(store.stats().await.is_none());

        let patients = fixtures::mock_patients();
        let appointments = fixtures::mock_appointments();
        let stats = store.fetch_stats(&patients, &appointments).await.unwrap();

        assert_eq!(store.stats().await, Some(stats));
        assert!(!store.is_loading().await);
    }
}
