//! 从 TOML 文件加载解锁计划

use crate::models::plan::ModulePlan;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载数据并转换为 ModulePlan 对象
///
/// 文件格式：
/// ```toml
/// [[modules]]
/// id = 305
/// lessons = [589, 865, 590]
/// ```
pub async fn load_plan_from_toml(plan_file_path: &Path) -> Result<ModulePlan> {
    let content = fs::read_to_string(plan_file_path)
        .await
        .with_context(|| format!("无法读取计划文件: {}", plan_file_path.display()))?;

    let plan: ModulePlan = toml::from_str(&content)
        .with_context(|| format!("无法解析计划文件: {}", plan_file_path.display()))?;

    tracing::info!(
        "成功加载计划: {} 个模块, {} 节课程",
        plan.modules.len(),
        plan.lesson_count()
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_toml() {
        let content = r#"
            [[modules]]
            id = 305
            lessons = [589, 865, 590]

            [[modules]]
            id = 306
            lessons = [604]
        "#;

        let plan: ModulePlan = toml::from_str(content).expect("计划应能解析");

        assert_eq!(plan.modules.len(), 2);
        assert_eq!(plan.modules[0].id, 305);
        assert_eq!(plan.modules[0].lessons, vec![589, 865, 590]);
        assert_eq!(plan.modules[1].lessons, vec![604]);
        assert_eq!(plan.lesson_count(), 4);
    }

    #[test]
    fn test_parse_empty_plan() {
        let plan: ModulePlan = toml::from_str("").expect("空文件应解析为空计划");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails_with_context() {
        let result = load_plan_from_toml(Path::new("does-not-exist.toml")).await;

        let err = result.expect_err("不存在的文件应报错");
        assert!(err.to_string().contains("无法读取计划文件"));
    }
}
