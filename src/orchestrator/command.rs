//! 终端命令解析
//!
//! 一行一个命令；单页操作沿用数据属性的操作名：`<data-action> <filename>`

use std::path::PathBuf;

use crate::workflow::{PageAction, ViewMode};

/// 终端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    List,
    Page(PageAction),
    Upload(Vec<PathBuf>),
    Select(String),
    Ocr,
    Set { field: String, value: String },
    Finalize,
    Folders(Option<String>),
    GenerateFolder,
    Mode(ViewMode),
    NewSession,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
命令:
  refresh | list
  move-up|move-down|move-to-first|rotate-left|rotate-right|delete <文件名>
  upload <路径...>     上传 .jpg/.jpeg
  select <文件名>      切换 OCR 选中
  ocr | finalize
  set project|box|present|observation <值>
  folders [文件夹]     索引模式下列出/打开文件夹
  generate-folder | new
  mode digitalization|indexation
  help | quit";

impl Command {
    /// 解析一行输入，空行返回 Ok(None)
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        if PageAction::is_action_name(head) {
            return PageAction::from_data_attrs(head, rest)
                .map(|action| Some(Command::Page(action)))
                .ok_or_else(|| format!("{} 需要文件名", head));
        }

        let command = match head {
            "refresh" | "r" => Command::Refresh,
            "list" | "ls" => Command::List,
            "upload" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    return Err("upload 需要至少一个文件路径".to_string());
                }
                Command::Upload(paths)
            }
            "select" if !rest.is_empty() => Command::Select(rest.to_string()),
            "select" => return Err("select 需要文件名".to_string()),
            "ocr" => Command::Ocr,
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err("set 需要字段名".to_string());
                }
                Command::Set {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            "finalize" => Command::Finalize,
            "folders" => Command::Folders((!rest.is_empty()).then(|| rest.to_string())),
            "generate-folder" => Command::GenerateFolder,
            "mode" => match ViewMode::parse(rest) {
                Some(mode) => Command::Mode(mode),
                None => return Err(format!("未知的视图模式: {}", rest)),
            },
            "new" => Command::NewSession,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("未知命令: {}", other)),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_action_with_spaces() {
        assert_eq!(
            Command::parse("move-to-first scan 003.jpg").unwrap(),
            Some(Command::Page(PageAction::MoveToFirst("scan 003.jpg".to_string())))
        );
        assert!(Command::parse("delete").is_err());
    }

    #[test]
    fn test_parse_set_and_folders() {
        assert_eq!(
            Command::parse("set observation hoja rota").unwrap(),
            Some(Command::Set {
                field: "observation".to_string(),
                value: "hoja rota".to_string()
            })
        );
        assert_eq!(
            Command::parse("folders").unwrap(),
            Some(Command::Folders(None))
        );
        assert_eq!(
            Command::parse("folders carpeta_004").unwrap(),
            Some(Command::Folders(Some("carpeta_004".to_string())))
        );
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("upload a.jpg b.jpeg").unwrap(),
            Some(Command::Upload(vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpeg")]))
        );
        assert_eq!(
            Command::parse("mode indexation").unwrap(),
            Some(Command::Mode(ViewMode::Indexation))
        );
        assert!(Command::parse("mode grid").is_err());
        assert!(Command::parse("dance").is_err());
        assert_eq!(Command::parse("q").unwrap(), Some(Command::Quit));
    }
}
