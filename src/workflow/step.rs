//! 提交流程的步骤模型
//!
//! 每个步骤声明自己的前置条件，由通用的执行器在运行前逐条检查。
//! CDPOS 依赖 CDHDR 上传成功、分析依赖所有上传无错误，都写在 `SUBMISSION_PLAN` 里。

use crate::error::WorkflowError;
use crate::models::{Attachments, LogKind};

/// 流程步骤（创建申请不在其中，它失败会直接终止整个流程）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Sm20,
    Transaction,
    Cdhdr,
    Cdpos,
    Analysis,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::Sm20,
        StepId::Transaction,
        StepId::Cdhdr,
        StepId::Cdpos,
        StepId::Analysis,
    ];

    /// 四个上传步骤
    pub const UPLOADS: [StepId; 4] = [StepId::Sm20, StepId::Transaction, StepId::Cdhdr, StepId::Cdpos];

    pub fn label(self) -> &'static str {
        match self {
            StepId::Analysis => "Analysis",
            other => other.log_kind().map(LogKind::label).unwrap_or_default(),
        }
    }

    /// 上传步骤对应的日志类型
    pub fn log_kind(self) -> Option<LogKind> {
        match self {
            StepId::Sm20 => Some(LogKind::Sm20),
            StepId::Transaction => Some(LogKind::Transaction),
            StepId::Cdhdr => Some(LogKind::Cdhdr),
            StepId::Cdpos => Some(LogKind::Cdpos),
            StepId::Analysis => None,
        }
    }

    fn index(self) -> usize {
        match self {
            StepId::Sm20 => 0,
            StepId::Transaction => 1,
            StepId::Cdhdr => 2,
            StepId::Cdpos => 3,
            StepId::Analysis => 4,
        }
    }
}

/// 步骤状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    Pending,
    Uploading,
    Success,
    Error,
}

impl StepStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, StepStatus::Success | StepStatus::Error)
    }
}

/// 一次提交中所有步骤的状态
///
/// 状态只能 Pending → Uploading → Success/Error，每次提交最多走一遍
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepBoard {
    statuses: [StepStatus; 5],
}

impl StepBoard {
    pub fn get(&self, step: StepId) -> StepStatus {
        self.statuses[step.index()]
    }

    pub fn begin(&mut self, step: StepId) -> Result<(), WorkflowError> {
        self.transition(step, StepStatus::Pending, StepStatus::Uploading)
    }

    pub fn finish(&mut self, step: StepId, succeeded: bool) -> Result<(), WorkflowError> {
        let to = if succeeded {
            StepStatus::Success
        } else {
            StepStatus::Error
        };
        self.transition(step, StepStatus::Uploading, to)
    }

    fn transition(
        &mut self,
        step: StepId,
        expected: StepStatus,
        to: StepStatus,
    ) -> Result<(), WorkflowError> {
        let from = self.get(step);
        if from != expected {
            return Err(WorkflowError::InvalidTransition { step, from, to });
        }
        self.statuses[step.index()] = to;
        Ok(())
    }

    /// 给定步骤中是否有失败
    pub fn any_error(&self, steps: &[StepId]) -> bool {
        steps.iter().any(|s| self.get(*s) == StepStatus::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StepId, StepStatus)> + '_ {
        StepId::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

// ========== 前置条件 ==========

/// 前置条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// 用户附带了该类型的文件
    FileAttached(LogKind),
    /// 指定步骤已成功
    StepSucceeded(StepId),
    /// 指定步骤中没有任何失败
    NoStepFailed(&'static [StepId]),
}

impl Precondition {
    pub fn is_met(&self, board: &StepBoard, attachments: &Attachments) -> bool {
        match self {
            Precondition::FileAttached(kind) => attachments.has(*kind),
            Precondition::StepSucceeded(step) => board.get(*step) == StepStatus::Success,
            Precondition::NoStepFailed(steps) => !board.any_error(steps),
        }
    }
}

/// 前置条件不满足时的处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnUnmet {
    /// 静默跳过（例如用户根本没附带文件）
    Silent,
    /// 跳过并给出警告
    Warn(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    pub condition: Precondition,
    pub on_unmet: OnUnmet,
}

const fn guard(condition: Precondition, on_unmet: OnUnmet) -> Guard {
    Guard {
        condition,
        on_unmet,
    }
}

/// 步骤声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub id: StepId,
    /// 同一阶段内的步骤互不依赖，可以并行
    pub stage: u8,
    /// 按顺序检查，第一个不满足的条件决定跳过方式
    pub guards: &'static [Guard],
}

/// 检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run,
    Skip(OnUnmet),
}

impl StepSpec {
    pub fn evaluate(&self, board: &StepBoard, attachments: &Attachments) -> Decision {
        self.guards
            .iter()
            .find(|g| !g.condition.is_met(board, attachments))
            .map_or(Decision::Run, |g| Decision::Skip(g.on_unmet))
    }
}

pub const WARN_CDPOS_NO_CDHDR: &str = "⚠ CDPOS skipped: Upload CDHDR first";
pub const WARN_CDPOS_CDHDR_FAILED: &str = "⚠ CDPOS skipped: CDHDR upload failed";
pub const WARN_ANALYSIS_SKIPPED: &str = "⚠ Analysis skipped due to upload errors";

/// 创建申请之后的固定步骤
pub const SUBMISSION_PLAN: &[StepSpec] = &[
    StepSpec {
        id: StepId::Sm20,
        stage: 0,
        guards: &[guard(Precondition::FileAttached(LogKind::Sm20), OnUnmet::Silent)],
    },
    StepSpec {
        id: StepId::Transaction,
        stage: 0,
        guards: &[guard(
            Precondition::FileAttached(LogKind::Transaction),
            OnUnmet::Silent,
        )],
    },
    StepSpec {
        id: StepId::Cdhdr,
        stage: 0,
        guards: &[guard(Precondition::FileAttached(LogKind::Cdhdr), OnUnmet::Silent)],
    },
    StepSpec {
        id: StepId::Cdpos,
        stage: 1,
        guards: &[
            guard(Precondition::FileAttached(LogKind::Cdpos), OnUnmet::Silent),
            guard(
                Precondition::FileAttached(LogKind::Cdhdr),
                OnUnmet::Warn(WARN_CDPOS_NO_CDHDR),
            ),
            guard(
                Precondition::StepSucceeded(StepId::Cdhdr),
                OnUnmet::Warn(WARN_CDPOS_CDHDR_FAILED),
            ),
        ],
    },
    StepSpec {
        id: StepId::Analysis,
        stage: 2,
        guards: &[guard(
            Precondition::NoStepFailed(&StepId::UPLOADS),
            OnUnmet::Warn(WARN_ANALYSIS_SKIPPED),
        )],
    },
];
