use tcboard_client::prelude::Range;

/// One line typed in watch mode.
#[derive(Debug, PartialEq)]
pub enum Input {
    Search(String),
    Suggest(String),
    Range(Range),
    Refresh,
    Help,
    Quit,
    Invalid(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(text) = line.strip_prefix('?') {
            return Input::Suggest(text.trim().to_string());
        }
        let Some(command) = line.strip_prefix(':') else {
            return Input::Search(line.to_string());
        };

        let mut words = command.split_whitespace();
        match (words.next(), words.next()) {
            (Some("quit" | "q"), None) => Input::Quit,
            (Some("help" | "h"), None) => Input::Help,
            (Some("refresh" | "r"), None) => Input::Refresh,
            (Some("range"), Some(code)) => match code.parse() {
                Ok(range) => Input::Range(range),
                Err(e) => Input::Invalid(e.to_string()),
            },
            _ => Input::Invalid(format!("unknown command {line:?}; try :help")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_a_search() {
        assert_eq!(Input::parse(" vnm \n"), Input::Search("vnm".into()));
        assert_eq!(Input::parse(""), Input::Search("".into()));
    }

    #[test]
    fn test_question_mark_suggests() {
        assert_eq!(Input::parse("?vn"), Input::Suggest("vn".into()));
        assert_eq!(Input::parse("?"), Input::Suggest("".into()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(Input::parse(":range 1y"), Input::Range(Range::OneYear));
        assert_eq!(Input::parse(":refresh"), Input::Refresh);
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":help"), Input::Help);
    }

    #[test]
    fn test_bad_commands_are_invalid() {
        assert!(matches!(Input::parse(":range 2w"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":range"), Input::Invalid(_)));
        assert!(matches!(Input::parse(":jump VHM"), Input::Invalid(_)));
    }
}
