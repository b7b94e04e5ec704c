//! 固定的课程 API 请求体
//!
//! 三种请求体都打到同一个 `POST /api/lessons/{id}`，服务端只靠
//! body 区分语义，所以这里的字段结构必须保持原样。

use serde_json::{json, Value};

/// suspend_data：把课程里 12 个单元的 audio/video/doc/quiz/game/slider
/// 全部标记为已访问，quiz_results 留空。服务端要求它是字符串形式的 JSON。
const SUSPEND_DATA: &str = "{\"audio\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"video\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"doc\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"quiz\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"game\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"slider\":[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],\"quiz_results\":{}}";

/// 进度请求体：标记课程的全部内容单元为已访问
pub fn progress_payload() -> Value {
    json!({
        "data": {
            "cmi": {
                "suspend_data": SUSPEND_DATA
            }
        }
    })
}

/// 首课请求体：满分 + 已完成 + 30 秒学习时长
pub fn first_lesson_payload() -> Value {
    json!({
        "data": {
            "cmi": {
                "core": {
                    "score": {
                        "raw": "100"
                    },
                    "lesson_status": "completed",
                    "session_time": "00:00:30"
                }
            }
        }
    })
}

/// 完成请求体：只把课程状态标记为 completed
pub fn completion_payload() -> Value {
    json!({
        "data": {
            "cmi": {
                "core": {
                    "lesson_status": "completed"
                }
            }
        }
    })
}
