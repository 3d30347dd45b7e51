//! 预约状态机
//!
//! 描述视图层暴露的预约生命周期转换。限制属于视图，宽容属于存储：
//! 存储的 `set_status` 接受全部四个状态值（no-show 只能通过直接更新
//! 到达），这张转换表只是视图可见的契约面。

use clinic_core::{AppointmentStatus, ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 预约状态转换事件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentEvent {
    Complete,
    Cancel,
}

/// 预约状态机
#[derive(Debug, Clone)]
pub struct AppointmentStateMachine {
    transitions: HashMap<(AppointmentStatus, AppointmentEvent), AppointmentStatus>,
}

impl AppointmentStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 视图暴露的转换：只能从 Scheduled 出发
        transitions.insert(
            (AppointmentStatus::Scheduled, AppointmentEvent::Complete),
            AppointmentStatus::Completed,
        );
        transitions.insert(
            (AppointmentStatus::Scheduled, AppointmentEvent::Cancel),
            AppointmentStatus::Canceled,
        );

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &AppointmentStatus, event: &AppointmentEvent) -> bool {
        self.transitions
            .contains_key(&(from.clone(), event.clone()))
    }

    /// 执行状态转换
    pub fn transition(
        &self,
        from: &AppointmentStatus,
        event: &AppointmentEvent,
    ) -> Result<AppointmentStatus> {
        match self.transitions.get(&(from.clone(), event.clone())) {
            Some(to) => Ok(to.clone()),
            None => Err(ClinicError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取所有可能的状态
    pub fn all_states() -> Vec<AppointmentStatus> {
        vec![
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Canceled,
            AppointmentStatus::NoShow,
        ]
    }

    /// 获取当前状态下视图可触发的事件
    pub fn possible_events(&self, current_state: &AppointmentStatus) -> Vec<AppointmentEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| state == current_state)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

impl Default for AppointmentStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
