//! 登录流程与 XSRF token 捕获
//!
//! 打开登录页，用选择器回退列表填写邮箱/密码并提交，然后从会话
//! cookie 中取出 XSRF-TOKEN。token 缺失视为致命错误。

use chromiumoxide::Page;
use percent_encoding::percent_decode_str;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};

/// XSRF token 的 cookie 名称
const TOKEN_COOKIE: &str = "XSRF-TOKEN";

/// 执行登录并返回捕获到的 XSRF token
pub async fn login_and_capture_token(
    page: &Page,
    config: &Config,
    username: &str,
    password: &str,
) -> AppResult<String> {
    info!("正在打开登录页: {}", config.login_url);
    page.goto(config.login_url.as_str())
        .await
        .map_err(|e| AppError::navigation_failed(&config.login_url, e))?;

    wait_for_login_form(page).await;

    info!("填写登录表单...");
    let filled = fill_login_form(page, username, password).await?;
    if !filled {
        warn!("⚠️ 未找到完整的登录表单字段，仍尝试提交");
    }

    submit_login_form(page).await?;

    // 等待登录跳转完成，cookie 写入会话
    sleep(Duration::from_secs(3)).await;

    match capture_token(page).await? {
        Some(token) => {
            info!("✅ 已从会话 cookie 捕获 XSRF token");
            debug!("token 长度: {}", token.len());
            Ok(token)
        }
        None => Err(AppError::Auth(AuthError::TokenMissing)),
    }
}

/// 等待登录表单出现（最多 10 秒）
async fn wait_for_login_form(page: &Page) {
    for _ in 0..10 {
        if page.find_element("form").await.is_ok() {
            return;
        }
        sleep(Duration::from_secs(1)).await;
    }
    warn!("⚠️ 等待登录表单超时，仍尝试继续");
}

/// 通过 JS 填写邮箱和密码，返回是否两个字段都找到了
///
/// 选择器按 type / name / id 依次回退，适配站点的不同表单版本。
async fn fill_login_form(page: &Page, username: &str, password: &str) -> AppResult<bool> {
    let fill_script = format!(
        r#"
        (function() {{
            const emailSelectors = ['input[type="email"]', 'input[name="email"]', 'input[id="email"]'];
            const passwordSelectors = ['input[type="password"]', 'input[name="password"]', 'input[id="password"]'];

            const pick = (selectors) => {{
                for (const selector of selectors) {{
                    const field = document.querySelector(selector);
                    if (field) return field;
                }}
                return null;
            }};

            const emailField = pick(emailSelectors);
            const passwordField = pick(passwordSelectors);

            if (emailField) emailField.value = {};
            if (passwordField) passwordField.value = {};

            return Boolean(emailField && passwordField);
        }})()
        "#,
        js_string(username),
        js_string(password),
    );

    let filled: bool = page
        .evaluate(fill_script)
        .await
        .map_err(AppError::script_failed)?
        .into_value()
        .unwrap_or(false);

    Ok(filled)
}

/// 点击提交按钮，找不到按钮时直接提交表单
async fn submit_login_form(page: &Page) -> AppResult<()> {
    let submit_script = r#"
        (function() {
            const submitButton = document.querySelector('button[type="submit"], input[type="submit"]');
            if (submitButton) {
                submitButton.click();
                return true;
            }
            const form = document.querySelector('form');
            if (form) {
                form.submit();
                return true;
            }
            return false;
        })()
    "#;

    page.evaluate(submit_script)
        .await
        .map_err(AppError::script_failed)?;

    Ok(())
}

/// 从 cookie 会话中读取并解码 XSRF token
async fn capture_token(page: &Page) -> AppResult<Option<String>> {
    let cookies = page
        .get_cookies()
        .await
        .map_err(AppError::script_failed)?;

    for cookie in cookies {
        if cookie.name == TOKEN_COOKIE {
            return Ok(Some(decode_token(&cookie.value)));
        }
    }

    Ok(None)
}

/// cookie 值是 URL 编码的，请求头需要原始 token
fn decode_token(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().to_string()
}

/// 把用户输入编码成 JS 字符串字面量，避免引号破坏脚本
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_token_unquotes_url_encoding() {
        assert_eq!(decode_token("abc%3D%3D"), "abc==");
        assert_eq!(decode_token("plain-token"), "plain-token");
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
        assert_eq!(js_string("user@example.com"), "\"user@example.com\"");
    }
}
