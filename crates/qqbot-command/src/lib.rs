//! Command grammar binding (§4.2) — the "namespace trick": prefixes come
//! from process config (`command_start`), separators are deliberately
//! independent of whatever the host framework uses for dotted subcommand
//! names, so space-separated arguments never get mangled.

use qqbot_core::config::BotConfig;
use qqbot_core::superuser::is_superuser;

#[derive(Debug, Clone, PartialEq)]
pub enum AntiRecallArg {
    On,
    Off,
    Status,
    Toggle,
    /// Bare `antirecall` with no argument — same effect as `Toggle`, per
    /// the `[on|off|status|toggle | (no arg)]` grammar in §4.2.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestArg {
    Send,
    Alconna,
}

/// A command this crate understands, already split out of the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    AntiRecall(AntiRecallArg),
    Recall { count: i64, group_id: Option<i64> },
    Agent { opening_text: Option<String> },
    Test(TestArg),
}

/// Parses raw message text against the command grammar in §4.2. Holds
/// `prefixes` and `separators` as independent configuration, matching the
/// "namespace trick" design note rather than binding separators to
/// whatever the framework uses elsewhere.
pub struct CommandRegistry {
    prefixes: Vec<String>,
    separators: Vec<char>,
}

impl CommandRegistry {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes, separators: vec![' '] }
    }

    pub fn with_separators(mut self, separators: Vec<char>) -> Self {
        self.separators = separators;
        self
    }

    /// Strip a recognized prefix and split on the configured separators.
    /// Returns `None` silently on anything that doesn't look like a
    /// command — matchers here are non-chatty per §4.2.
    pub fn try_parse(&self, text: &str) -> Option<ParsedCommand> {
        let body = self.strip_prefix(text)?;
        let mut parts = body.split(self.separators.as_slice()).filter(|p| !p.is_empty());
        let name = parts.next()?;

        match name {
            "antirecall" => Some(ParsedCommand::AntiRecall(parse_antirecall_arg(parts.next()))),
            "recall" => parse_recall(parts.next(), parts.next()),
            "a" => {
                let rest = body[name.len()..].trim();
                let opening_text = if rest.is_empty() { None } else { Some(rest.to_string()) };
                Some(ParsedCommand::Agent { opening_text })
            }
            "test" => match parts.next() {
                Some("send") => Some(ParsedCommand::Test(TestArg::Send)),
                Some("alconna") => Some(ParsedCommand::Test(TestArg::Alconna)),
                _ => None,
            },
            _ => None,
        }
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.prefixes.iter().find_map(|prefix| text.strip_prefix(prefix.as_str()))
    }
}

fn parse_antirecall_arg(token: Option<&str>) -> AntiRecallArg {
    match token {
        Some("on") => AntiRecallArg::On,
        Some("off") => AntiRecallArg::Off,
        Some("status") => AntiRecallArg::Status,
        Some("toggle") => AntiRecallArg::Toggle,
        _ => AntiRecallArg::None,
    }
}

fn parse_recall(count: Option<&str>, group_id: Option<&str>) -> Option<ParsedCommand> {
    let count = count?.parse().ok()?;
    let group_id = group_id.and_then(|g| g.parse().ok());
    Some(ParsedCommand::Recall { count, group_id })
}

/// Gate for the operational commands: unauthorized users are silently
/// ignored, never told "permission denied" (that itself would be a tell).
pub fn authorize(user_id: i64, config: &BotConfig) -> bool {
    is_superuser(user_id, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CommandRegistry {
        CommandRegistry::new(vec!["/".to_string()])
    }

    #[test]
    fn non_prefixed_text_parses_to_none() {
        assert_eq!(registry().try_parse("hello"), None);
    }

    #[test]
    fn bare_antirecall_parses_as_none_variant() {
        assert_eq!(
            registry().try_parse("/antirecall"),
            Some(ParsedCommand::AntiRecall(AntiRecallArg::None))
        );
    }

    #[test]
    fn antirecall_on_parses() {
        assert_eq!(
            registry().try_parse("/antirecall on"),
            Some(ParsedCommand::AntiRecall(AntiRecallArg::On))
        );
    }

    #[test]
    fn recall_with_count_and_group_parses() {
        assert_eq!(
            registry().try_parse("/recall 3 12345"),
            Some(ParsedCommand::Recall { count: 3, group_id: Some(12345) })
        );
    }

    #[test]
    fn recall_without_group_id_parses() {
        assert_eq!(
            registry().try_parse("/recall 3"),
            Some(ParsedCommand::Recall { count: 3, group_id: None })
        );
    }

    #[test]
    fn recall_without_count_fails_silently() {
        assert_eq!(registry().try_parse("/recall"), None);
    }

    #[test]
    fn agent_with_opening_text_parses() {
        assert_eq!(
            registry().try_parse("/a 下载"),
            Some(ParsedCommand::Agent { opening_text: Some("下载".to_string()) })
        );
    }

    #[test]
    fn agent_with_no_argument_parses_as_none() {
        assert_eq!(registry().try_parse("/a"), Some(ParsedCommand::Agent { opening_text: None }));
    }

    #[test]
    fn test_send_and_alconna_parse() {
        assert_eq!(registry().try_parse("/test send"), Some(ParsedCommand::Test(TestArg::Send)));
        assert_eq!(registry().try_parse("/test alconna"), Some(ParsedCommand::Test(TestArg::Alconna)));
    }

    #[test]
    fn test_with_unknown_subcommand_fails_silently() {
        assert_eq!(registry().try_parse("/test bogus"), None);
    }

    #[test]
    fn custom_prefix_list_is_honored() {
        let reg = CommandRegistry::new(vec!["!".to_string(), "/".to_string()]);
        assert_eq!(reg.try_parse("!antirecall"), Some(ParsedCommand::AntiRecall(AntiRecallArg::None)));
    }
}
