/// Deferred-job collaborator interface
///
/// Scheduled publication delegates execution to an external job runner:
/// the service registers `(fire_at, handler_id, payload)` and the runner
/// calls back into the internal publish route at (or after) the fire time,
/// at-least-once. If the runner never fires, the post stays hidden; that
/// limitation is accepted and nothing here retries.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handler id the runner invokes for deferred post publication.
pub const PUBLISH_POST_HANDLER: &str = "posts.publish_scheduled";

/// Arguments for the publish handler, carried through the job runner and
/// posted back verbatim on the callback route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPostArgs {
    pub post_id: Uuid,
    /// The originally requested publish time; re-stamped onto the post
    /// when the trigger fires.
    pub publish_at: DateTime<Utc>,
}

/// Client for the deferred-job execution facility.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeferredJobClient: Send + Sync {
    /// Register a one-shot job; returns the runner's job id.
    async fn schedule(
        &self,
        fire_at: DateTime<Utc>,
        handler_id: &str,
        payload: serde_json::Value,
    ) -> anyhow::Result<Uuid>;
}

/// Register the one-shot publish trigger for a scheduled post.
pub async fn register_publish_job(
    client: &dyn DeferredJobClient,
    post_id: Uuid,
    publish_at: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let payload = serde_json::to_value(PublishPostArgs {
        post_id,
        publish_at,
    })?;
    client
        .schedule(publish_at, PUBLISH_POST_HANDLER, payload)
        .await
}

#[derive(Debug, Serialize)]
struct ScheduleRequest<'a> {
    fire_at: DateTime<Utc>,
    handler: &'a str,
    args: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    job_id: Uuid,
}

/// HTTP client for the job-runner collaborator.
pub struct HttpJobRunnerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpJobRunnerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DeferredJobClient for HttpJobRunnerClient {
    async fn schedule(
        &self,
        fire_at: DateTime<Utc>,
        handler_id: &str,
        payload: serde_json::Value,
    ) -> anyhow::Result<Uuid> {
        let url = format!("{}/jobs", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(&ScheduleRequest {
                fire_at,
                handler: handler_id,
                args: payload,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: ScheduleResponse = response.json().await?;
        tracing::info!(job_id = %body.job_id, handler = handler_id, %fire_at, "deferred job registered");
        Ok(body.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_args_round_trip_through_json() {
        let args = PublishPostArgs {
            post_id: Uuid::new_v4(),
            publish_at: Utc::now(),
        };
        let value = serde_json::to_value(&args).unwrap();
        let back: PublishPostArgs = serde_json::from_value(value).unwrap();
        assert_eq!(back, args);
    }

    #[tokio::test]
    async fn publish_job_is_keyed_to_the_requested_time() {
        let post_id = Uuid::new_v4();
        let publish_at = Utc::now() + chrono::Duration::hours(1);
        let job_id = Uuid::new_v4();

        let mut client = MockDeferredJobClient::new();
        client
            .expect_schedule()
            .withf(move |fire_at, handler, payload| {
                *fire_at == publish_at
                    && handler == PUBLISH_POST_HANDLER
                    && payload["post_id"] == serde_json::json!(post_id)
            })
            .times(1)
            .returning(move |_, _, _| Ok(job_id));

        let got = register_publish_job(&client, post_id, publish_at)
            .await
            .unwrap();
        assert_eq!(got, job_id);
    }

    #[test]
    fn schedule_request_shape_matches_runner_contract() {
        let fire_at = Utc::now();
        let req = ScheduleRequest {
            fire_at,
            handler: PUBLISH_POST_HANDLER,
            args: serde_json::json!({"post_id": "x"}),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["handler"], PUBLISH_POST_HANDLER);
        assert!(value.get("fire_at").is_some());
        assert!(value.get("args").is_some());
    }
}
