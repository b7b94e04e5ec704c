//! 运行统计
//!
//! 每个阶段维护一组计数器，只由 runner 修改；阶段内单调递增，
//! 唯一的例外是重试成功时的一次性 `failed -= 1, successful += 1`。

use std::ops::AddAssign;

/// 单个阶段的计数器
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseCounters {
    /// 已尝试的课程数
    pub processed: usize,
    /// 进度请求成功的课程数
    pub successful: usize,
    /// 进度请求失败的课程数
    pub failed: usize,
    /// 完成请求成功的课程数
    pub completed_successful: usize,
    /// 完成请求失败的课程数
    pub completed_failed: usize,
}

impl PhaseCounters {
    /// 一次延迟重试成功：failed 减一、successful 加一，作为单个步骤完成，
    /// 不触碰其他计数器
    pub fn resolve_retry(&mut self) {
        self.failed -= 1;
        self.successful += 1;
    }
}

impl AddAssign for PhaseCounters {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.successful += other.successful;
        self.failed += other.failed;
        self.completed_successful += other.completed_successful;
        self.completed_failed += other.completed_failed;
    }
}

/// 整个运行的汇总报告
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 阶段一（常规课程 + 重试）
    pub regular: PhaseCounters,
    /// 阶段二（各模块的收尾课程）
    pub finals: PhaseCounters,
}

impl RunReport {
    /// 两个阶段相加后的总计
    pub fn totals(&self) -> PhaseCounters {
        let mut totals = self.regular;
        totals += self.finals;
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_retry_moves_one_failure_to_success() {
        let mut counters = PhaseCounters {
            processed: 5,
            successful: 3,
            failed: 2,
            ..Default::default()
        };

        counters.resolve_retry();

        assert_eq!(counters.successful, 4);
        assert_eq!(counters.failed, 1);
        assert_eq!(counters.processed, 5);
        assert_eq!(counters.completed_successful, 0);
        assert_eq!(counters.completed_failed, 0);
    }

    #[test]
    fn test_report_totals_sum_both_phases() {
        let report = RunReport {
            regular: PhaseCounters {
                processed: 4,
                successful: 3,
                failed: 1,
                completed_successful: 3,
                completed_failed: 0,
            },
            finals: PhaseCounters {
                processed: 2,
                successful: 2,
                failed: 0,
                completed_successful: 1,
                completed_failed: 1,
            },
        };

        let totals = report.totals();
        assert_eq!(totals.processed, 6);
        assert_eq!(totals.successful, 5);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.completed_successful, 4);
        assert_eq!(totals.completed_failed, 1);
    }
}
