//! Thin reqwest binding over the OneBot V11 HTTP action API, following
//! `OpenAiProvider`'s reqwest-client-with-base-url-and-bearer-auth shape:
//! one `reqwest::Client`, a `base_url`, and an optional bearer token
//! attached per-request.

use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use qqbot_protocol::{ActionResponse, ForwardNode};

use crate::error::{AdapterError, Result};
use crate::last_sent::{target_descriptor, LastSentRecord};

#[derive(Debug)]
pub struct OneBotClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    last_sent: Mutex<Option<LastSentRecord>>,
}

impl OneBotClient {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token,
            last_sent: Mutex::new(None),
        }
    }

    /// Snapshot of the most recent action call, for the `test send`
    /// debugging command.
    pub fn last_sent(&self) -> Option<LastSentRecord> {
        self.last_sent.lock().expect("last_sent mutex poisoned").clone()
    }

    /// Generic `POST {base_url}/{action}` with a JSON params object,
    /// returning the decoded `data` field on success.
    pub async fn call(&self, action: &str, params: Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), action);
        debug!(action, "calling onebot action");
        let target = target_descriptor(&params);

        let result = self.call_inner(action, &url, &params).await;
        self.record(action, &target, &params, &result);
        result
    }

    async fn call_inner(&self, action: &str, url: &str, params: &Value) -> Result<Value> {
        let mut request = self.client.post(url).json(params);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Transport { action: action.to_string(), source: e })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::Transport { action: action.to_string(), source: e })?;

        let parsed: ActionResponse = serde_json::from_value(body)
            .map_err(|e| AdapterError::Parse { action: action.to_string(), source: e })?;

        if !status.is_success() || !parsed.is_ok() {
            return Err(AdapterError::Action {
                action: action.to_string(),
                retcode: parsed.retcode,
                message: parsed.message.unwrap_or_default(),
            });
        }

        Ok(parsed.data)
    }

    fn record(&self, action: &str, target: &str, params: &Value, result: &Result<Value>) {
        let record = LastSentRecord {
            time: Utc::now(),
            api_name: action.to_string(),
            target: target.to_string(),
            payload: params.clone(),
            ok: result.is_ok(),
            exception: result.as_ref().err().map(ToString::to_string),
        };
        *self.last_sent.lock().expect("last_sent mutex poisoned") = Some(record);
    }

    pub async fn send_private_msg(&self, user_id: i64, message: impl Serialize) -> Result<Value> {
        self.call("send_private_msg", serde_json::json!({ "user_id": user_id, "message": message })).await
    }

    pub async fn send_group_msg(&self, group_id: i64, message: impl Serialize) -> Result<Value> {
        self.call("send_group_msg", serde_json::json!({ "group_id": group_id, "message": message })).await
    }

    pub async fn send_private_forward_msg(&self, user_id: i64, nodes: &[ForwardNode]) -> Result<Value> {
        self.call(
            "send_private_forward_msg",
            serde_json::json!({ "user_id": user_id, "messages": nodes }),
        )
        .await
    }

    pub async fn send_group_forward_msg(&self, group_id: i64, nodes: &[ForwardNode]) -> Result<Value> {
        self.call(
            "send_group_forward_msg",
            serde_json::json!({ "group_id": group_id, "messages": nodes }),
        )
        .await
    }

    pub async fn forward_friend_single_msg(&self, user_id: i64, message_id: i64) -> Result<Value> {
        self.call(
            "forward_friend_single_msg",
            serde_json::json!({ "user_id": user_id, "message_id": message_id }),
        )
        .await
    }

    pub async fn forward_group_single_msg(&self, group_id: i64, message_id: i64) -> Result<Value> {
        self.call(
            "forward_group_single_msg",
            serde_json::json!({ "group_id": group_id, "message_id": message_id }),
        )
        .await
    }

    pub async fn get_msg(&self, message_id: i64) -> Result<Value> {
        self.call("get_msg", serde_json::json!({ "message_id": message_id })).await
    }

    pub async fn get_forward_msg(&self, id: &str) -> Result<Value> {
        self.call("get_forward_msg", serde_json::json!({ "id": id })).await
    }

    pub async fn get_group_msg_history(
        &self,
        group_id: i64,
        message_seq: Option<i64>,
        count: i64,
        reverse_order: bool,
    ) -> Result<Value> {
        self.call(
            "get_group_msg_history",
            serde_json::json!({
                "group_id": group_id,
                "message_seq": message_seq,
                "count": count,
                "reverseOrder": reverse_order,
            }),
        )
        .await
    }

    pub async fn get_friend_msg_history(
        &self,
        user_id: i64,
        message_seq: Option<i64>,
        count: i64,
        reverse_order: bool,
    ) -> Result<Value> {
        self.call(
            "get_friend_msg_history",
            serde_json::json!({
                "user_id": user_id,
                "message_seq": message_seq,
                "count": count,
                "reverseOrder": reverse_order,
            }),
        )
        .await
    }

    pub async fn get_record(&self, file: &str, out_format: &str) -> Result<Value> {
        self.call("get_record", serde_json::json!({ "file": file, "out_format": out_format })).await
    }

    pub async fn delete_msg(&self, message_id: i64) -> Result<Value> {
        self.call("delete_msg", serde_json::json!({ "message_id": message_id })).await
    }
}
