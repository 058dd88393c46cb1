use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PublishParams {
    #[schemars(description = "The channel to publish to")]
    pub channel: String,

    #[schemars(description = "The message to send")]
    pub message: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChannelParams {
    #[schemars(description = "The channel name")]
    pub channel: String,
}

impl RedisMcpServer {
    pub async fn do_publish(&self, params: PublishParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("PUBLISH")
            .arg(&params.channel)
            .arg(&params.message)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(receivers) => text_result(format!(
                "Message published to channel '{}' ({} subscribers).",
                params.channel, receivers
            )),
            Err(e) => text_result(format!(
                "Error publishing to channel '{}': {}",
                params.channel, e
            )),
        })
    }

    pub async fn do_subscribe(&self, params: ChannelParams) -> Result<CallToolResult, ErrorData> {
        // The subscription lives only as long as this call: the dedicated
        // subscriber connection is dropped on return. Useful as a
        // connectivity check for the channel, not as a message feed.
        let mut pubsub = match self.manager().subscriber().await {
            Ok(pubsub) => pubsub,
            Err(e) => {
                return Ok(text_result(format!(
                    "Error subscribing to channel '{}': {}",
                    params.channel, e
                )))
            }
        };

        Ok(match pubsub.subscribe(&params.channel).await {
            Ok(()) => text_result(format!("Subscribed to channel '{}'.", params.channel)),
            Err(e) => text_result(format!(
                "Error subscribing to channel '{}': {}",
                params.channel, e
            )),
        })
    }

    pub async fn do_unsubscribe(&self, params: ChannelParams) -> Result<CallToolResult, ErrorData> {
        let mut pubsub = match self.manager().subscriber().await {
            Ok(pubsub) => pubsub,
            Err(e) => {
                return Ok(text_result(format!(
                    "Error unsubscribing from channel '{}': {}",
                    params.channel, e
                )))
            }
        };

        Ok(match pubsub.unsubscribe(&params.channel).await {
            Ok(()) => text_result(format!("Unsubscribed from channel '{}'.", params.channel)),
            Err(e) => text_result(format!(
                "Error unsubscribing from channel '{}': {}",
                params.channel, e
            )),
        })
    }
}
