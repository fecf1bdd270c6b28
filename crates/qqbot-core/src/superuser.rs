use crate::config::BotConfig;

/// Replaces the framework-provided superuser/permission decorator the
/// original bot relied on: an explicit predicate invoked at the top of
/// every privileged handler. Unauthorized callers are silently ignored by
/// the caller — this function never produces user-visible output itself.
pub fn is_superuser(user_id: i64, config: &BotConfig) -> bool {
    config.superusers.contains(&user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(superusers: Vec<i64>) -> BotConfig {
        BotConfig {
            superusers,
            ..BotConfig::default()
        }
    }

    #[test]
    fn known_superuser_is_allowed() {
        let cfg = config_with(vec![111, 222]);
        assert!(is_superuser(111, &cfg));
    }

    #[test]
    fn unknown_user_is_denied() {
        let cfg = config_with(vec![111]);
        assert!(!is_superuser(999, &cfg));
    }

    #[test]
    fn empty_superuser_list_denies_everyone() {
        let cfg = config_with(vec![]);
        assert!(!is_superuser(1, &cfg));
    }
}
