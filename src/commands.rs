//! Line commands typed at the labeler prompt.
//!
//! Each input line parses into one [`Command`]. Commands that change the labeling
//! session wrap a wizard [`Message`]; the rest are handled by the front end.

use std::path::PathBuf;

use crate::model::ClusterId;
use crate::wizard::Message;

/// A parsed input line.
#[derive(Debug, Clone)]
pub enum Command {
    /// Forwarded to the wizard
    Wizard(Message),
    /// `open` without a path: show the native file picker
    PickFile,
    /// List the label options
    ShowLabels,
    /// Change the viewport the shelf image is fitted into
    Resize { width: u32, height: Option<u32> },
    /// Write the overlay as a PNG
    ExportOverlay(PathBuf),
    /// Write every cluster crop into a directory
    ExportCrops(PathBuf),
    /// Redraw the current step
    Show,
    Help,
    Quit,
}

/// Why an input line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("`{value}` is not a valid {what}")]
    InvalidNumber { what: &'static str, value: String },
}

/// Command summary printed by `help`.
pub const HELP: &[(&str, &str)] = &[
    ("open [path]", "select a shelf image (file picker without a path)"),
    ("next", "upload the selected image and continue to review"),
    ("clusters <n>", "re-cluster with n clusters (2-20)"),
    ("label <id> [text]", "label a cluster, or clear it when text is omitted"),
    ("add-label <text>", "add a label option"),
    ("labels", "list label options"),
    ("save", "save labels and show results"),
    ("start-over", "begin again with no labels"),
    ("new-shelf", "begin again keeping labels as defaults"),
    ("history", "list labels saved on the server"),
    ("resize <w> [h]", "fit the image into a new viewport"),
    ("export <file.png>", "write the overlay image"),
    ("crops <dir>", "write every cluster crop"),
    ("dismiss", "clear the current notice"),
    ("show", "redraw the current step"),
    ("help", "show this list"),
    ("quit", "exit"),
];

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "open" | "o" => {
                if rest.is_empty() {
                    Command::PickFile
                } else {
                    Command::Wizard(Message::SelectFile(PathBuf::from(unquote(rest))))
                }
            }
            "next" | "n" => Command::Wizard(Message::Next),
            "clusters" | "k" => {
                let n = parse_number(required(rest, "clusters <n>")?, "cluster count")?;
                Command::Wizard(Message::ClusterCountChanged(n))
            }
            "label" | "l" => {
                let (id, text) = match rest.split_once(char::is_whitespace) {
                    Some((id, text)) => (id, text.trim()),
                    None => (rest, ""),
                };
                let cluster_id: ClusterId =
                    parse_number(required(id, "label <id> [text]")?, "cluster id")?;
                Command::Wizard(Message::AssignLabel {
                    cluster_id,
                    text: text.to_string(),
                })
            }
            "add-label" => Command::Wizard(Message::AddLabelOption(
                required(rest, "add-label <text>")?.to_string(),
            )),
            "labels" => Command::ShowLabels,
            "save" | "s" => Command::Wizard(Message::Save),
            "start-over" => Command::Wizard(Message::StartOver),
            "new-shelf" => Command::Wizard(Message::NewShelf),
            "history" => Command::Wizard(Message::FetchSavedLabels),
            "resize" => {
                let mut parts = rest.split_whitespace();
                let width = parse_number(
                    parts.next().ok_or(CommandError::Usage("resize <w> [h]"))?,
                    "width",
                )?;
                let height = parts
                    .next()
                    .map(|h| parse_number(h, "height"))
                    .transpose()?;
                Command::Resize { width, height }
            }
            "export" => Command::ExportOverlay(PathBuf::from(unquote(required(
                rest,
                "export <file.png>",
            )?))),
            "crops" => {
                Command::ExportCrops(PathBuf::from(unquote(required(rest, "crops <dir>")?)))
            }
            "dismiss" => Command::Wizard(Message::DismissNotice),
            "show" | "ls" => Command::Show,
            "help" | "h" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };
        Ok(Some(command))
    }
}

fn required<'a>(arg: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(arg)
    }
}

fn parse_number(value: &str, what: &'static str) -> Result<u32, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidNumber {
        what,
        value: value.to_string(),
    })
}

/// Strip one pair of surrounding quotes, so paths with spaces can be typed.
fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert!(Command::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_open_with_and_without_path() {
        assert!(matches!(parse("open"), Command::PickFile));
        match parse("open \"/tmp/my shelf.jpg\"") {
            Command::Wizard(Message::SelectFile(path)) => {
                assert_eq!(path, PathBuf::from("/tmp/my shelf.jpg"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_clusters() {
        assert!(matches!(
            parse("clusters 15"),
            Command::Wizard(Message::ClusterCountChanged(15))
        ));
        assert_eq!(
            Command::parse("clusters many").unwrap_err(),
            CommandError::InvalidNumber {
                what: "cluster count",
                value: "many".to_string()
            }
        );
        assert!(matches!(
            Command::parse("clusters"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_label_keeps_inner_spaces() {
        match parse("label 3   Coca-Cola Can") {
            Command::Wizard(Message::AssignLabel { cluster_id, text }) => {
                assert_eq!(cluster_id, 3);
                assert_eq!(text, "Coca-Cola Can");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_label_without_text_clears() {
        match parse("label 7") {
            Command::Wizard(Message::AssignLabel { cluster_id, text }) => {
                assert_eq!(cluster_id, 7);
                assert!(text.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_resize() {
        assert!(matches!(
            parse("resize 400"),
            Command::Resize {
                width: 400,
                height: None
            }
        ));
        assert!(matches!(
            parse("resize 400 300"),
            Command::Resize {
                width: 400,
                height: Some(300)
            }
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("frobnicate").unwrap_err(),
            CommandError::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn test_every_help_entry_parses() {
        let samples = [
            "open x.jpg", "next", "clusters 5", "label 1 a", "add-label a", "labels", "save",
            "start-over", "new-shelf", "history", "resize 10 10", "export a.png", "crops out",
            "dismiss", "show", "help", "quit",
        ];
        assert_eq!(samples.len(), HELP.len());
        for line in samples {
            assert!(Command::parse(line).unwrap().is_some(), "{line}");
        }
    }
}
