//! 患者存储
//!
//! 独占患者集合、自由文本搜索游标，以及按患者分区的病历集合。
//! 病历分区惰性加载：只有拉取过的分区才存在于内存中。

use crate::fixtures;
use crate::transport::{RequestClass, Transport};
use clinic_core::{
    utils, ClinicError, MedicalRecord, MedicalRecordDraft, Patient, PatientDraft, PatientUpdate,
    Result, User,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 患者状态切片
#[derive(Debug, Clone, Default)]
struct PatientsState {
    patients: Vec<Patient>,
    current_patient: Option<Patient>,
    medical_records: HashMap<String, Vec<MedicalRecord>>,
    search_query: String,
    is_loading: bool,
}

/// 患者存储
#[derive(Clone)]
pub struct PatientsStore {
    state: Arc<RwLock<PatientsState>>,
    transport: Arc<dyn Transport>,
}

impl PatientsStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Arc::new(RwLock::new(PatientsState::default())),
            transport,
        }
    }

    /// 拉取患者集合
    ///
    /// 忙碌标志在模拟延迟窗口前后恰好经历一次 busy→idle。
    pub async fn fetch_patients(&self) -> Result<Vec<Patient>> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
        }

        let outcome = self.transport.round_trip(RequestClass::Fetch).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        outcome?;

        state.patients = fixtures::mock_patients();
        info!("Fetched {} patients", state.patients.len());
        Ok(state.patients.clone())
    }

    /// 当前患者集合
    pub async fn patients(&self) -> Vec<Patient> {
        self.state.read().await.patients.clone()
    }

    /// 按标识符查找患者
    ///
    /// 未找到返回 None 哨兵而不是错误。
    pub async fn fetch_patient(&self, id: &str) -> Result<Option<Patient>> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
        }

        let outcome = self.transport.round_trip(RequestClass::Lookup).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        outcome?;

        let patient = state.patients.iter().find(|p| p.id == id).cloned();
        state.current_patient = patient.clone();
        Ok(patient)
    }

    /// 当前选中的患者
    pub async fn current_patient(&self) -> Option<Patient> {
        self.state.read().await.current_patient.clone()
    }

    /// 新建患者
    ///
    /// 分配新标识符，创建/更新时间戳取当前时刻且相等。
    /// 草稿做防御性结构检查：姓名不能为空。
    pub async fn create(&self, draft: PatientDraft) -> Result<Patient> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        if draft.first_name.trim().is_empty() || draft.last_name.trim().is_empty() {
            warn!("Rejecting patient draft with empty name");
            return Err(ClinicError::Validation(
                "patient first name and last name are required".to_string(),
            ));
        }

        let now = Utc::now();
        let patient = Patient {
            id: utils::new_entity_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            gender: draft.gender,
            phone: draft.phone,
            email: draft.email,
            date_of_birth: draft.date_of_birth,
            address: draft.address,
            emergency_contact: draft.emergency_contact,
            emergency_phone: draft.emergency_phone,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        state.patients.push(patient.clone());
        info!("Created patient {} ({})", patient.id, patient.full_name());
        Ok(patient)
    }

    /// 更新患者
    ///
    /// 合并语义；标识符不存在时是无操作，返回 None。
    pub async fn update(&self, id: &str, update: PatientUpdate) -> Result<Option<Patient>> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        let mut state = self.state.write().await;
        let updated = match state.patients.iter_mut().find(|p| p.id == id) {
            Some(patient) => {
                update.apply(patient);
                Some(patient.clone())
            }
            None => None,
        };

        // 选中的患者视图同步刷新
        if let Some(patient) = &updated {
            if state
                .current_patient
                .as_ref()
                .map(|c| c.id == patient.id)
                .unwrap_or(false)
            {
                state.current_patient = Some(patient.clone());
            }
            info!("Updated patient {}", patient.id);
        }

        Ok(updated)
    }

    /// 删除患者
    ///
    /// 级联删除该患者的病历分区；标识符不存在时是无操作。
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        let mut state = self.state.write().await;
        let before = state.patients.len();
        state.patients.retain(|p| p.id != id);

        if state.patients.len() < before {
            state.medical_records.remove(id);
            if state
                .current_patient
                .as_ref()
                .map(|c| c.id == id)
                .unwrap_or(false)
            {
                state.current_patient = None;
            }
            info!("Removed patient {} and its record partition", id);
        }

        Ok(())
    }

    /// 拉取某患者的病历分区
    pub async fn fetch_medical_records(&self, patient_id: &str) -> Result<Vec<MedicalRecord>> {
        self.transport.round_trip(RequestClass::Fetch).await?;

        let mut state = self.state.write().await;
        let records = fixtures::mock_medical_records(patient_id);
        state
            .medical_records
            .insert(patient_id.to_string(), records.clone());
        Ok(records)
    }

    /// 某患者的病历分区，按插入顺序
    ///
    /// 未拉取过的分区返回空序列。
    pub async fn list_records(&self, patient_id: &str) -> Vec<MedicalRecord> {
        self.state
            .read()
            .await
            .medical_records
            .get(patient_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 追加病历
    ///
    /// 患者必须存在，否则拒绝；作者快照取自显式传入的当前用户。
    pub async fn add_record(
        &self,
        patient_id: &str,
        draft: MedicalRecordDraft,
        acting_user: &User,
    ) -> Result<MedicalRecord> {
        self.transport.round_trip(RequestClass::Mutate).await?;

        let mut state = self.state.write().await;
        if !state.patients.iter().any(|p| p.id == patient_id) {
            warn!("Rejecting medical record for unknown patient {}", patient_id);
            return Err(ClinicError::NotFound(format!(
                "patient {} not found",
                patient_id
            )));
        }

        let now = Utc::now();
        let record = MedicalRecord {
            id: utils::new_entity_id(),
            patient_id: patient_id.to_string(),
            author_id: acting_user.id.clone(),
            author: acting_user.clone(),
            record_type: draft.record_type,
            title: draft.title,
            description: draft.description,
            prescription: draft.prescription,
            attachments: draft.attachments,
            created_at: now,
            updated_at: now,
        };

        state
            .medical_records
            .entry(patient_id.to_string())
            .or_default()
            .push(record.clone());

        info!("Added medical record {} for patient {}", record.id, patient_id);
        Ok(record)
    }

    /// 设置搜索查询
    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.state.write().await.search_query = query.into();
    }

    pub async fn search_query(&self) -> String {
        self.state.read().await.search_query.clone()
    }

    /// 当前查询下的过滤结果
    ///
    /// 纯函数派生视图：同样的列表和查询总是产出同样顺序的同一结果集。
    pub async fn filtered(&self) -> Vec<Patient> {
        let state = self.state.read().await;
        filter_patients(&state.patients, &state.search_query)
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }
}

/// 对患者列表做大小写无关的子串过滤
///
/// 匹配串是姓、名、电话、邮箱的空格连接；空查询原样返回整个列表，
/// 结果顺序就是底层列表的顺序。
pub fn filter_patients(patients: &[Patient], query: &str) -> Vec<Patient> {
    if query.is_empty() {
        return patients.to_vec();
    }

    let needle = query.to_lowercase();
    patients
        .iter()
        .filter(|p| p.search_haystack().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InstantTransport;
    use clinic_core::{Gender, MedicalRecordType, UserRole};

    fn store() -> PatientsStore {
        PatientsStore::new(Arc::new(InstantTransport))
    }

    fn draft(first_name: &str, last_name: &str) -> PatientDraft {
        PatientDraft {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender: Gender::Other,
            phone: "+998900000001".to_string(),
            email: format!("{}@email.com", first_name.to_lowercase()),
            date_of_birth: "1990-01-01".parse().unwrap(),
            address: "Test St 1, Tashkent".to_string(),
            emergency_contact: "Contact".to_string(),
            emergency_phone: "+998900000002".to_string(),
            notes: String::new(),
        }
    }

    fn record_draft(title: &str) -> MedicalRecordDraft {
        MedicalRecordDraft {
            record_type: MedicalRecordType::Note,
            title: title.to_string(),
            description: "description".to_string(),
            prescription: None,
            attachments: None,
        }
    }

    fn doctor() -> User {
        fixtures::mock_users()
            .into_iter()
            .find(|u| u.role == UserRole::Doctor)
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_replaces_collection_and_clears_busy_flag() {
        let store = store();
        let patients = store.fetch_patients().await.unwrap();

        assert_eq!(patients.len(), 3);
        assert!(!store.is_loading().await);
        assert_eq!(store.patients().await, patients);
    }

    #[tokio::test]
    async fn test_create_then_fetch_returns_equal_record() {
        let store = store();
        let created = store.create(draft("Nina", "Karimova")).await.unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.fetch_patient(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let store = store();
        let result = store.create(draft("", "Karimova")).await;
        assert!(matches!(result, Err(ClinicError::Validation(_))));
        assert!(store.patients().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_provided_field() {
        let store = store();
        let created = store.create(draft("Nina", "Karimova")).await.unwrap();

        let updated = store
            .update(
                &created.id,
                PatientUpdate {
                    notes: Some("Follow up in a month".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.notes, "Follow up in a month");
        assert_eq!(updated.first_name, created.first_name);
        assert_eq!(updated.phone, created.phone);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let store = store();
        let result = store.update("missing", PatientUpdate::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_refreshes_current_patient() {
        let store = store();
        let created = store.create(draft("Nina", "Karimova")).await.unwrap();
        store.fetch_patient(&created.id).await.unwrap();

        store
            .update(
                &created.id,
                PatientUpdate {
                    phone: Some("+998911111111".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let current = store.current_patient().await.unwrap();
        assert_eq!(current.phone, "+998911111111");
    }

    #[tokio::test]
    async fn test_remove_cascades_to_record_partition() {
        let store = store();
        let created = store.create(draft("Nina", "Karimova")).await.unwrap();
        store
            .add_record(&created.id, record_draft("Checkup"), &doctor())
            .await
            .unwrap();

        store.remove(&created.id).await.unwrap();

        assert_eq!(store.fetch_patient(&created.id).await.unwrap(), None);
        assert!(store.patients().await.is_empty());
        assert!(store.list_records(&created.id).await.is_empty());

        // 再次删除是无操作
        store.remove(&created.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_partitions_are_isolated() {
        let store = store();
        let first = store.create(draft("Nina", "Karimova")).await.unwrap();
        let second = store.create(draft("Omar", "Aliyev")).await.unwrap();

        store
            .add_record(&first.id, record_draft("First A"), &doctor())
            .await
            .unwrap();
        store
            .add_record(&first.id, record_draft("First B"), &doctor())
            .await
            .unwrap();
        store
            .add_record(&second.id, record_draft("Second A"), &doctor())
            .await
            .unwrap();

        let first_records = store.list_records(&first.id).await;
        let second_records = store.list_records(&second.id).await;

        // 插入顺序保持，分区互不影响
        assert_eq!(first_records.len(), 2);
        assert_eq!(first_records[0].title, "First A");
        assert_eq!(first_records[1].title, "First B");
        assert_eq!(second_records.len(), 1);
        assert!(first_records.iter().all(|r| r.patient_id == first.id));
    }

    #[tokio::test]
    async fn test_add_record_unknown_patient_rejected() {
        let store = store();
        let result = store
            .add_record("missing", record_draft("Orphan"), &doctor())
            .await;
        assert!(matches!(result, Err(ClinicError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_record_snapshots_acting_user() {
        let store = store();
        let patient = store.create(draft("Nina", "Karimova")).await.unwrap();
        let author = doctor();

        let record = store
            .add_record(&patient.id, record_draft("Checkup"), &author)
            .await
            .unwrap();

        assert_eq!(record.author_id, author.id);
        assert_eq!(record.author, author);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_unfetched_partition_is_empty() {
        let store = store();
        assert!(store.list_records("1").await.is_empty());

        let fetched = store.fetch_medical_records("1").await.unwrap();
        assert!(!fetched.is_empty());
        assert_eq!(store.list_records("1").await, fetched);
    }

    #[tokio::test]
    async fn test_filtered_matches_substring_case_insensitively() {
        let store = store();
        store.fetch_patients().await.unwrap();

        store.set_search_query("GARCIA").await;
        let filtered = store.filtered().await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].last_name, "Garcia");

        // 电话和邮箱也参与匹配
        store.set_search_query("+998901234569").await;
        assert_eq!(store.filtered().await[0].last_name, "Hassan");

        store.set_search_query("john.doe@").await;
        assert_eq!(store.filtered().await[0].first_name, "John");
    }

    #[tokio::test]
    async fn test_empty_query_returns_list_unchanged() {
        let store = store();
        let patients = store.fetch_patients().await.unwrap();

        store.set_search_query("").await;
        assert_eq!(store.filtered().await, patients);
    }

    #[test]
    fn test_filter_is_idempotent_and_preserves_order() {
        let patients = fixtures::mock_patients();

        let once = filter_patients(&patients, "email.com");
        let twice = filter_patients(&once, "email.com");
        assert_eq!(once, twice);

        // 顺序是底层列表的顺序，不做相关性排序
        let ids: Vec<&str> = once.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert!(filter_patients(&patients, "no such patient").is_empty());
    }
}
