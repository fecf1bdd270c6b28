pub mod client;
pub mod error;
pub mod last_sent;
pub mod platform;

pub use client::OneBotClient;
pub use error::{AdapterError, Result};
pub use last_sent::LastSentRecord;
pub use platform::{AdapterRouter, OneBotV11Adapter, PlatformAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_rejects_unknown_adapter_name() {
        let router =
            AdapterRouter::new(OneBotV11Adapter::new(std::sync::Arc::new(OneBotClient::new("http://x", None))));
        let err = router.resolve("discord").unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedAdapter(name) if name == "discord"));
    }

    #[test]
    fn router_resolves_onebot_v11() {
        let router =
            AdapterRouter::new(OneBotV11Adapter::new(std::sync::Arc::new(OneBotClient::new("http://x", None))));
        assert!(router.resolve("onebot_v11").is_ok());
    }
}
