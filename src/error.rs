//! 应用程序错误类型
//!
//! 按照来源划分错误域：浏览器、API 调用、认证。
//! 库层统一返回 [`AppResult`]，编排层再收敛到 `anyhow`。

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {reason}")]
    Configuration { reason: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    Launch {
        #[source]
        source: CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreation {
        #[source]
        source: CdpError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    Navigation {
        url: String,
        #[source]
        source: CdpError,
    },
    /// 关闭浏览器失败
    #[error("关闭浏览器失败: {source}")]
    Close {
        #[source]
        source: CdpError,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    Script {
        #[source]
        source: CdpError,
    },
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（页面内 fetch 抛出异常）
    #[error("API请求失败 ({endpoint}): {reason}")]
    Request { endpoint: String, reason: String },
    /// 响应解析失败
    #[error("响应解析失败: {reason}")]
    Decode { reason: String },
}

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 登录后没有捕获到 XSRF token，后续请求无法认证
    #[error("登录后未捕获到 XSRF token")]
    TokenMissing,
    /// campaign 状态探测返回未授权
    #[error("campaign 状态探测被拒绝: {body}")]
    Unauthorized { body: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建导航失败错误
    pub fn navigation_failed(url: impl Into<String>, source: CdpError) -> Self {
        AppError::Browser(BrowserError::Navigation {
            url: url.into(),
            source,
        })
    }

    /// 创建脚本执行失败错误
    pub fn script_failed(source: CdpError) -> Self {
        AppError::Browser(BrowserError::Script { source })
    }

    /// 创建 API 请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Api(ApiError::Request {
            endpoint: endpoint.into(),
            reason: reason.into(),
        })
    }
}
