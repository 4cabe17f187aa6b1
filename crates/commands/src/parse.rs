/// Everything the bot understands, parsed in one step.
///
/// Arguments are the whitespace-split tokens after the command word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Create,
    DeleteAll,
    Delete(Vec<String>),
    Show(Vec<String>),
    Allow(Vec<String>),
    Disallow(Vec<String>),
}

impl Command {
    /// Parse a message body. Returns `None` for anything that is not a
    /// known command.
    ///
    /// "help" anywhere in the body wins over everything else, so
    /// confused invocations like `delete help` still show the help.
    /// The match is a case-sensitive substring check.
    pub fn parse(body: &str) -> Option<Self> {
        if body.contains("help") {
            return Some(Self::Help);
        }
        let mut words = body.split_whitespace();
        let head = words.next()?;
        let args: Vec<String> = words.map(|w| w.trim().to_owned()).collect();
        match head {
            "list" => Some(Self::List),
            "create" => Some(Self::Create),
            "delete-all" => Some(Self::DeleteAll),
            "delete" => Some(Self::Delete(args)),
            "show" => Some(Self::Show(args)),
            "allow" => Some(Self::Allow(args)),
            "disallow" => Some(Self::Disallow(args)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("list"), Some(Command::List));
        assert_eq!(Command::parse("create"), Some(Command::Create));
        assert_eq!(Command::parse("delete-all"), Some(Command::DeleteAll));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(
            Command::parse("delete aaa  bbb"),
            Some(Command::Delete(vec!["aaa".into(), "bbb".into()]))
        );
        assert_eq!(
            Command::parse("allow @alice:example.org"),
            Some(Command::Allow(vec!["@alice:example.org".into()]))
        );
        assert_eq!(Command::parse("show"), Some(Command::Show(vec![])));
    }

    #[test]
    fn help_substring_wins() {
        assert_eq!(Command::parse("help"), Some(Command::Help));
        assert_eq!(Command::parse("delete help me"), Some(Command::Help));
        assert_eq!(Command::parse("please send help"), Some(Command::Help));
        // Case-sensitive: "Help" is not a command.
        assert_eq!(Command::parse("Help"), None);
    }

    #[test]
    fn unknown_is_none() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("listing"), None);
    }
}
