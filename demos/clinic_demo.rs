//! 诊所领域核心演示程序
//!
//! 展示四个域存储的协作：登录、患者检索、建档、病历、预约流转和仪表盘统计。

use std::sync::Arc;

use anyhow::Context;
use clinic_core::{AppointmentDraft, AppointmentStatus, MedicalRecordDraft, MedicalRecordType};
use clinic_session::FileSessionStore;
use clinic_stores::{
    AppointmentsStore, AuthStore, DashboardStore, PatientsStore, StoreSettings, Transport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🏥 诊所管理系统领域核心演示\n");

    // 1. 加载配置并组装存储
    let settings = StoreSettings::load(None)?;
    let transport: Arc<dyn Transport> = Arc::new(settings.transport.build_transport());
    let session = Arc::new(FileSessionStore::new(&settings.session_file));

    let auth = AuthStore::new(transport.clone(), session);
    let patients = PatientsStore::new(transport.clone());
    let appointments = AppointmentsStore::new(transport.clone());
    let dashboard = DashboardStore::new(transport);

    // 2. 登录（失败会被拒绝，不会留下半个会话）
    if auth.is_authenticated().await {
        println!("✅ 已从持久化会话恢复登录");
    } else {
        auth.login("reception@clinic.com", "password").await?;
        println!("✅ 前台账号登录成功");
    }
    let acting_user = auth
        .current_user()
        .await
        .context("no authenticated user after login")?;

    // 3. 患者列表与搜索
    patients.fetch_patients().await?;
    patients.set_search_query("garcia").await;
    let matches = patients.filtered().await;
    println!("🔍 搜索 \"garcia\" 命中 {} 名患者", matches.len());
    for patient in &matches {
        println!("   - {} ({})", patient.full_name(), patient.phone);
    }
    patients.set_search_query("").await;

    // 4. 病历分区
    patients.fetch_medical_records("1").await?;
    let records = patients.list_records("1").await;
    println!("📋 患者 1 的病历条数: {}", records.len());

    let doctor = auth.login("doctor@clinic.com", "password").await?;
    patients
        .add_record(
            "1",
            MedicalRecordDraft {
                record_type: MedicalRecordType::Note,
                title: "Blood pressure follow-up".to_string(),
                description: "Slightly elevated, recheck in two weeks.".to_string(),
                prescription: None,
                attachments: None,
            },
            &doctor,
        )
        .await?;
    println!("📝 医生补录病历后条数: {}", patients.list_records("1").await.len());

    // 5. 预约创建与状态流转
    appointments.fetch_appointments().await?;
    let start = chrono::Utc::now() + chrono::Duration::days(1);
    let created = appointments
        .create(
            AppointmentDraft {
                patient_id: "2".to_string(),
                doctor_id: "2".to_string(),
                start_at: start,
                end_at: start + chrono::Duration::minutes(30),
                reason: "Allergy consultation".to_string(),
                notes: None,
            },
            &acting_user,
        )
        .await?;
    println!(
        "📅 新建预约 {} ({} → {:?})",
        created.id,
        created.patient.full_name(),
        created.status
    );

    appointments
        .set_status(&created.id, AppointmentStatus::Completed)
        .await?;
    println!("✅ 预约已标记完成");

    // 6. 仪表盘统计
    let patient_list = patients.patients().await;
    let appointment_list = appointments.appointments().await;
    let stats = dashboard.fetch_stats(&patient_list, &appointment_list).await?;
    println!("\n📊 仪表盘:");
    println!("   患者总数: {}", stats.total_patients);
    println!("   今日预约: {}", stats.today_appointments);
    println!("   本周新增患者: {}", stats.new_patients_this_week);
    println!("   待处理预约: {}", stats.pending_appointments);
    println!("   即将到来: {} 条", stats.upcoming_appointments.len());

    // 7. 登出并清除持久化足迹
    auth.logout().await;
    println!("\n👋 已登出，持久化会话已清除");

    Ok(())
}
