//! 课程处理上下文
//!
//! 封装"我正在处理哪个模块的哪节课"这一信息

use std::fmt::Display;

/// 课程所处的处理阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// 阶段一：常规课程
    Regular,
    /// 阶段一之后的重试轮
    Retry,
    /// 阶段二：模块的收尾课程
    Final,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Regular => write!(f, "常规"),
            Phase::Retry => write!(f, "重试"),
            Phase::Final => write!(f, "收尾"),
        }
    }
}

/// 课程处理上下文
///
/// 入队后不可变；is_first 标记该课程是否为模块阶段一列表的第一节。
#[derive(Clone, Copy, Debug)]
pub struct LessonCtx {
    /// 模块ID
    pub module_id: u32,

    /// 课程ID
    pub lesson_id: u32,

    /// 处理阶段
    pub phase: Phase,

    /// 是否为模块的首节常规课程（触发额外的首课请求）
    pub is_first: bool,
}

impl LessonCtx {
    /// 创建新的课程上下文
    pub fn new(module_id: u32, lesson_id: u32, phase: Phase, is_first: bool) -> Self {
        Self {
            module_id,
            lesson_id,
            phase,
            is_first,
        }
    }
}

impl Display for LessonCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[模块 {} 课程 {} ({})]",
            self.module_id, self.lesson_id, self.phase
        )
    }
}
