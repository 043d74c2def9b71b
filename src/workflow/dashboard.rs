//! 管理菜单
//!
//! 把已加载的测验整理成表格行，并判断当前用户能否管理（预览、删除）某个测验。

use std::cmp::Ordering;

use crate::error::AuthorizationError;
use crate::models::{Identity, Quiz};
use crate::workflow::authoring::share_url;

/// 表格中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
    /// 从 1 开始的序号
    pub number: usize,
    pub id: String,
    pub title: String,
    pub share_url: String,
    pub preview_url: String,
    pub creator: String,
    pub created_at: String,
    pub responses: u64,
    pub can_manage: bool,
}

/// 只有创建者本人可以管理测验
pub fn can_manage(quiz: &Quiz, identity: Option<&Identity>) -> bool {
    identity
        .and_then(|i| i.display_name.as_deref())
        .is_some_and(|name| name == quiz.creator)
}

/// 删除前的权限检查
pub fn check_delete(quiz: &Quiz, identity: Option<&Identity>) -> Result<(), AuthorizationError> {
    if can_manage(quiz, identity) {
        Ok(())
    } else {
        Err(AuthorizationError::NotCreator)
    }
}

/// 生成表格行，按创建时间倒序，无法解析的时间排在最后
pub fn dashboard_rows(
    quizzes: &[&Quiz],
    identity: Option<&Identity>,
    base_url: &str,
) -> Vec<DashboardRow> {
    let mut sorted: Vec<&Quiz> = quizzes.to_vec();
    sorted.sort_by(|a, b| match (a.created_at_time(), b.created_at_time()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, quiz)| DashboardRow {
            number: i + 1,
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            share_url: share_url(base_url, &quiz.id, false),
            preview_url: share_url(base_url, &quiz.id, true),
            creator: quiz.creator.clone(),
            created_at: format_created_at(quiz),
            responses: quiz.responses(),
            can_manage: can_manage(quiz, identity),
        })
        .collect()
}

fn format_created_at(quiz: &Quiz) -> String {
    match quiz.created_at_time() {
        Some(time) => time.format("%Y年%m月%d日 %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuizItem;

    fn quiz(id: &str, creator: &str, created_at: &str) -> Quiz {
        Quiz {
            id: id.to_string(),
            title: format!("测验 {}", id),
            description: String::new(),
            items: vec![QuizItem::new("Q", ["A", "B"], "A")],
            creator: creator.to_string(),
            created_at: created_at.to_string(),
            response_count: None,
        }
    }

    #[test]
    fn test_rows_newest_first() {
        let old = quiz("old", "山田", "2024-01-01T00:00:00.000Z");
        let new = quiz("new", "佐藤", "2024-06-01T12:30:00.000Z");
        let bad = quiz("bad", "山田", "yesterday");
        let me = Identity::new("u1", Some("山田"), Some("yamada@tokium.jp"));

        let rows = dashboard_rows(&[&old, &bad, &new], Some(&me), "https://quiz.example/");
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["new", "old", "bad"]);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].created_at, "2024年06月01日 12:30");
        assert_eq!(rows[2].created_at, "N/A");
        assert_eq!(rows[0].share_url, "https://quiz.example/#/quiz/new");
        assert_eq!(rows[1].preview_url, "https://quiz.example/#/quiz/old?preview=true");
        assert!(!rows[0].can_manage);
        assert!(rows[1].can_manage);
    }

    #[test]
    fn test_delete_requires_creator() {
        let q = quiz("q1", "山田", "");
        let other = Identity::new("u2", Some("佐藤"), None);
        let nameless = Identity::new("u3", None, Some("x@tokium.jp"));

        assert_eq!(check_delete(&q, None), Err(AuthorizationError::NotCreator));
        assert_eq!(check_delete(&q, Some(&other)), Err(AuthorizationError::NotCreator));
        assert_eq!(check_delete(&q, Some(&nameless)), Err(AuthorizationError::NotCreator));
        let me = Identity::new("u1", Some("山田"), None);
        assert!(check_delete(&q, Some(&me)).is_ok());
    }
}
