/// 程序配置
///
/// 站点地址、campaign 探测参数和各类节流延迟。
/// 账号密码不在配置中，只能通过命令行传入。
#[derive(Clone, Debug)]
pub struct Config {
    /// 课程 API 站点
    pub base_url: String,
    /// 登录页面地址
    pub login_url: String,
    /// campaign 探测 ID
    pub campaign_id: u32,
    /// campaign 下的课程 ID
    pub course_id: u32,
    /// 覆盖内置计划的 TOML 文件
    pub plan_file: Option<String>,
    /// 以可见窗口运行浏览器
    pub visible: bool,
    /// 页面加载后的等待时间（秒）
    pub page_settle_secs: u64,
    /// 每节课处理后的节流时间（秒）
    pub lesson_throttle_secs: u64,
    /// 进度请求失败后的退避时间（秒）
    pub failure_backoff_secs: u64,
    /// 失败后重新导航到模块页的等待时间（秒）
    pub renav_settle_secs: u64,
    /// 重试阶段课程页面的等待时间（秒）
    pub retry_view_settle_secs: u64,
    /// 重试阶段每节课之间的节流时间（秒）
    pub retry_throttle_secs: u64,
    /// 阶段二每个模块处理后的等待时间（秒）
    pub module_done_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://b5.engagebricks.com".to_string(),
            login_url: "https://startupyourlife.engagebricks.com/login".to_string(),
            campaign_id: 30,
            course_id: 20018,
            plan_file: None,
            visible: false,
            page_settle_secs: 2,
            lesson_throttle_secs: 1,
            failure_backoff_secs: 5,
            renav_settle_secs: 3,
            retry_view_settle_secs: 3,
            retry_throttle_secs: 2,
            module_done_delay_secs: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("UNLOCK_BASE_URL").unwrap_or(default.base_url),
            login_url: std::env::var("UNLOCK_LOGIN_URL").unwrap_or(default.login_url),
            campaign_id: std::env::var("UNLOCK_CAMPAIGN_ID").ok().and_then(|v| v.parse().ok()).unwrap_or(default.campaign_id),
            course_id: std::env::var("UNLOCK_COURSE_ID").ok().and_then(|v| v.parse().ok()).unwrap_or(default.course_id),
            plan_file: std::env::var("UNLOCK_PLAN_FILE").ok().or(default.plan_file),
            visible: std::env::var("UNLOCK_VISIBLE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.visible),
            page_settle_secs: std::env::var("UNLOCK_PAGE_SETTLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_settle_secs),
            lesson_throttle_secs: std::env::var("UNLOCK_LESSON_THROTTLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.lesson_throttle_secs),
            failure_backoff_secs: std::env::var("UNLOCK_FAILURE_BACKOFF_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.failure_backoff_secs),
            renav_settle_secs: std::env::var("UNLOCK_RENAV_SETTLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.renav_settle_secs),
            retry_view_settle_secs: std::env::var("UNLOCK_RETRY_VIEW_SETTLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_view_settle_secs),
            retry_throttle_secs: std::env::var("UNLOCK_RETRY_THROTTLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_throttle_secs),
            module_done_delay_secs: std::env::var("UNLOCK_MODULE_DONE_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.module_done_delay_secs),
        }
    }

    /// 模块总览页地址
    pub fn module_url(&self, module_id: u32) -> String {
        format!("{}/modules/{}", self.base_url, module_id)
    }

    /// 课程内容页地址
    pub fn lesson_url(&self, lesson_id: u32) -> String {
        format!("{}/lessons/{}", self.base_url, lesson_id)
    }

    /// 课程 API 地址
    pub fn lesson_api_url(&self, lesson_id: u32) -> String {
        format!("{}/api/lessons/{}", self.base_url, lesson_id)
    }

    /// campaign 状态探测地址
    pub fn campaign_status_url(&self) -> String {
        format!(
            "{}/api/campaigns/{}/{}/status",
            self.base_url, self.campaign_id, self.course_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = Config::default();
        assert_eq!(
            config.module_url(305),
            "https://b5.engagebricks.com/modules/305"
        );
        assert_eq!(
            config.lesson_api_url(589),
            "https://b5.engagebricks.com/api/lessons/589"
        );
        assert_eq!(
            config.campaign_status_url(),
            "https://b5.engagebricks.com/api/campaigns/30/20018/status"
        );
    }
}
