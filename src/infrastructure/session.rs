//! 会话层 - 基础设施
//!
//! 持有登录后的稀缺资源（浏览器、主页面、XSRF token），只暴露
//! "发起会话内请求"和"打开/关闭页面"的能力。token 在登录后捕获
//! 一次，之后只读，运行期间不刷新。

use chromiumoxide::{Browser, Page};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, AppError, AppResult, BrowserError};

/// 单次 API 调用的响应
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse {
    /// HTTP 状态码；0 表示 fetch 在页面内抛出了异常
    pub status: u16,
    /// 响应体文本
    pub body: String,
}

impl ApiResponse {
    /// 是否为 2xx 成功响应
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 截断后的响应体，用于日志显示
    pub fn body_preview(&self) -> String {
        if self.body.chars().count() > 100 {
            self.body.chars().take(100).collect::<String>() + "..."
        } else {
            self.body.clone()
        }
    }
}

/// 已认证的 API 会话
///
/// 职责：
/// - 持有唯一的 Browser / 主 Page / token
/// - 暴露绑定登录态的 get / post 能力（页面内 fetch, 自带 cookie）
/// - 不认识模块 / 课程，不处理业务流程
pub struct ApiSession {
    browser: Browser,
    page: Page,
    token: String,
}

impl ApiSession {
    /// 创建新的会话
    pub fn new(browser: Browser, page: Page, token: String) -> Self {
        Self {
            browser,
            page,
            token,
        }
    }

    /// 主页面引用
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 捕获到的 XSRF token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 把主页面导航到指定地址
    pub async fn goto(&self, url: &str) -> AppResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        Ok(())
    }

    /// 打开一个新页面并导航到指定地址（用于课程浏览）
    pub async fn open_page(&self, url: &str) -> AppResult<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::Browser(BrowserError::PageCreation { source: e }))?;
        Ok(page)
    }

    /// 发起会话内 POST 请求，返回状态码和响应体
    pub async fn post_json(&self, url: &str, body: &Value) -> AppResult<ApiResponse> {
        let body_json = serde_json::to_string(body)
            .map_err(|e| AppError::Api(ApiError::Decode { reason: e.to_string() }))?;
        let script = self.build_post_script(url, &body_json);
        self.run_fetch(url, script).await
    }

    /// 发起会话内 GET 请求
    pub async fn get(&self, url: &str) -> AppResult<ApiResponse> {
        let script = self.build_get_script(url);
        self.run_fetch(url, script).await
    }

    /// 关闭浏览器，消费会话
    pub async fn close(mut self) -> AppResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| AppError::Browser(BrowserError::Close { source: e }))?;
        Ok(())
    }

    // ========== 内部辅助 ==========

    async fn run_fetch(&self, url: &str, script: String) -> AppResult<ApiResponse> {
        let response: ApiResponse = self
            .page
            .evaluate(script)
            .await
            .map_err(AppError::script_failed)?
            .into_value()
            .map_err(|e| AppError::Api(ApiError::Decode { reason: e.to_string() }))?;

        debug!("{} -> 状态 {}", url, response.status);

        // 页面内 fetch 抛异常时 status 为 0，归为网络请求失败
        if response.status == 0 {
            return Err(AppError::api_request_failed(url, response.body));
        }

        Ok(response)
    }

    /// 构建 POST 请求脚本：带 XSRF token，cookie 随会话自动携带
    fn build_post_script(&self, url: &str, body_json: &str) -> String {
        format!(
            r#"
            (async () => {{
                try {{
                    const res = await fetch("{}", {{
                        method: "POST",
                        headers: {{
                            "x-requested-with": "XMLHttpRequest",
                            "Content-Type": "application/json",
                            "Accept": "application/json",
                            "X-XSRF-TOKEN": "{}"
                        }},
                        credentials: "include",
                        body: JSON.stringify({})
                    }});
                    const body = await res.text();
                    return {{ status: res.status, body: body }};
                }} catch (err) {{
                    return {{ status: 0, body: String(err) }};
                }}
            }})()
            "#,
            url, self.token, body_json
        )
    }

    /// 构建 GET 请求脚本
    fn build_get_script(&self, url: &str) -> String {
        format!(
            r#"
            (async () => {{
                try {{
                    const res = await fetch("{}", {{
                        method: "GET",
                        headers: {{
                            "x-requested-with": "XMLHttpRequest",
                            "X-XSRF-TOKEN": "{}"
                        }},
                        credentials: "include"
                    }});
                    const body = await res.text();
                    return {{ status: res.status, body: body }};
                }} catch (err) {{
                    return {{ status: 0, body: String(err) }};
                }}
            }})()
            "#,
            url, self.token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_accepts_2xx_only() {
        let ok = ApiResponse { status: 204, body: String::new() };
        let redirect = ApiResponse { status: 302, body: String::new() };
        let error = ApiResponse { status: 500, body: String::new() };

        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!error.is_success());
    }

    #[test]
    fn test_body_preview_truncates_long_bodies() {
        let long = ApiResponse {
            status: 200,
            body: "x".repeat(250),
        };

        let preview = long.body_preview();
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }
}
