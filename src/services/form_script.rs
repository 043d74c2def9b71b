//! 表单脚本导出 - 业务能力层
//!
//! 把测验数据序列化为一段 Google Apps Script，在 script.google.com 上运行后
//! 会在用户的 Google Drive 中创建一个测验模式的 Google 表单。
//! 纯函数：同样的输入总是得到逐字节相同的输出。

use crate::models::QuizItem;

/// 每道题的分值
pub const POINTS_PER_ITEM: u32 = 10;

/// 生成创建 Google 表单的脚本
///
/// # 参数
/// - `items`: 题目列表
/// - `title`: 表单标题
/// - `description`: 表单说明
/// - `folder_url`: 保存表单的 Drive 文件夹 URL（可选）
pub fn export_form_script(
    items: &[QuizItem],
    title: &str,
    description: &str,
    folder_url: Option<&str>,
) -> String {
    // serde_json 对字符串的序列化不会失败
    let quiz_data = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    let folder = folder_url.map(escape_js_string).unwrap_or_default();

    format!(
        r#"
/**
 * 本脚本由测验制作工具自动生成。
 * 运行后会在你的 Google Drive 中创建一个新的 Google 表单。
 *
 * === 使用方法 ===
 * 1. 复制这段代码的全部内容。
 * 2. 打开 script.google.com，点击「新建项目」。
 * 3. 删除编辑器中已有的代码，粘贴这段代码。
 * 4. 点击上方的「运行」按钮。
 * 5. 首次运行时需要授权访问你的 Google 账号。
 * 6. 运行结束后，可以在执行日志中找到表单的链接。
 */
function createQuizForm() {{
  // --- 应用中设置的数据 ---
  const formTitle = "{title}";
  const formDescription = "{description}";
  const quizData = {quiz_data};
  const targetFolderUrl = "{folder}";
  // ------------------------

  try {{
    const form = FormApp.create(formTitle);
    form.setDescription(formDescription);
    form.setQuiz(true);

    quizData.forEach(item => {{
      const mcItem = form.addMultipleChoiceItem();
      mcItem.setTitle(item.question);

      const choices = item.options.map(option => {{
        return mcItem.createChoice(option, option === item.answer);
      }});

      mcItem.setChoices(choices);
      mcItem.setRequired(true);
      mcItem.setPoints({points});
    }});

    let successMessage = '表单「' + formTitle + '」已创建在 Google Drive 根目录。';

    if (targetFolderUrl) {{
      try {{
        const folderIdMatch = targetFolderUrl.match(/[-\w]{{25,}}/);
        if (folderIdMatch && folderIdMatch[0]) {{
          const folder = DriveApp.getFolderById(folderIdMatch[0]);
          const formFile = DriveApp.getFileById(form.getId());

          DriveApp.getRootFolder().removeFile(formFile);
          folder.addFile(formFile);

          successMessage = '表单「' + formTitle + '」已创建在文件夹「' + folder.getName() + '」中。';
        }} else if (targetFolderUrl.trim() !== '') {{
          Logger.log('不是有效的 Google Drive 文件夹 URL，已创建在根目录。URL: ' + targetFolderUrl);
        }}
      }} catch (folderError) {{
        Logger.log('移动到文件夹时出错: ' + folderError.toString() + '。已创建在根目录。');
      }}
    }}

    Logger.log(successMessage);
    Logger.log('公开链接: ' + form.getPublishedUrl());
    Logger.log('编辑链接: ' + form.getEditUrl());
  }} catch (e) {{
    Logger.log('创建表单时出错: ' + e.toString());
  }}
}}
"#,
        title = escape_js_string(title),
        description = escape_js_string(description),
        quiz_data = quiz_data,
        folder = folder,
        points = POINTS_PER_ITEM,
    )
}

/// 转义双引号字符串字面量中的特殊字符
fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<QuizItem> {
        vec![
            QuizItem::new("什么是 \"PDCA\"？", ["计划", "执行", "检查", "改进循环"], "改进循环"),
            QuizItem::new("Q2", ["A", "B", "C", "D"], "A"),
        ]
    }

    #[test]
    fn test_deterministic() {
        let a = export_form_script(&items(), "标题", "说明", Some("https://drive.google.com/x"));
        let b = export_form_script(&items(), "标题", "说明", Some("https://drive.google.com/x"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_quotes_escaped() {
        let script = export_form_script(&items(), r#"他说"你好""#, "第一行\n第二行", None);
        assert!(script.contains(r#"const formTitle = "他说\"你好\"";"#));
        assert!(script.contains(r#"const formDescription = "第一行\n第二行";"#));
        // 题目中的引号由 JSON 序列化转义
        assert!(script.contains(r#""question": "什么是 \"PDCA\"？""#));
    }

    #[test]
    fn test_folder_url() {
        let without = export_form_script(&items(), "t", "d", None);
        assert!(without.contains(r#"const targetFolderUrl = "";"#));

        let url = "https://drive.google.com/drive/folders/1AbCdEfGhIjKlMnOpQrStUvWxYz012345";
        let with = export_form_script(&items(), "t", "d", Some(url));
        assert!(with.contains(&format!(r#"const targetFolderUrl = "{}";"#, url)));
        assert!(with.contains(r"/[-\w]{25,}/"));
    }

    #[test]
    fn test_script_structure() {
        let script = export_form_script(&items(), "t", "d", None);
        assert!(script.contains("function createQuizForm() {"));
        assert!(script.contains("form.setQuiz(true);"));
        assert!(script.contains("mcItem.setPoints(10);"));
        assert!(script.contains(r#""answer": "改进循环""#));
    }
}
