#[cfg(test)]
mod tests {
    use crate::dto::*;
    use crate::error::Error;
    use crate::metrics::RequestMetrics;
    use serde_json::json;

    #[test]
    fn test_generate_request_defaults() {
        let request: GenerateRequest = serde_json::from_value(json!({}))
            .expect("empty body should deserialize");

        assert_eq!(request.tone, "");
        assert_eq!(request.action_instruction, "");
        assert_eq!(request.char_limit, 500);
        assert_eq!(request.email, "");
    }

    #[test]
    fn test_generate_request_full() {
        let request: GenerateRequest = serde_json::from_value(json!({
            "tone": "formal",
            "action_instruction": "decline politely",
            "char_limit": 300,
            "email": "Hi, are you coming on Friday?"
        }))
        .expect("full body should deserialize");

        assert_eq!(request.tone, "formal");
        assert_eq!(request.action_instruction, "decline politely");
        assert_eq!(request.char_limit, 300);
        assert_eq!(request.email, "Hi, are you coming on Friday?");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_generate_request_zero_char_limit() {
        let request: GenerateRequest = serde_json::from_value(json!({
            "char_limit": 0
        }))
        .expect("body should deserialize");

        let result = request.validate();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_health_response_serialization() {
        let health = HealthResponse::ok();
        let json = serde_json::to_value(&health).expect("health should serialize");
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::UpstreamUnavailable("refused".into()).status_code(), 503);
        assert_eq!(Error::StreamDecode("bad line".into()).status_code(), 502);
        assert_eq!(Error::Template("missing".into()).status_code(), 500);
    }

    #[test]
    fn test_error_boot_classification() {
        assert!(Error::Launch("no binary".into()).is_fatal_at_boot());
        assert!(Error::StartupTimeout(30).is_fatal_at_boot());
        assert!(Error::Provision {
            model: "mistral".into(),
            detail: "exit code 1".into()
        }
        .is_fatal_at_boot());
        assert!(!Error::UpstreamUnavailable("refused".into()).is_fatal_at_boot());
        assert!(!Error::StreamDecode("bad".into()).is_fatal_at_boot());
    }

    #[test]
    fn test_error_response_shape() {
        let err = Error::UpstreamUnavailable("connection refused".into());
        let response = crate::ErrorResponse::from(&err);
        let json = serde_json::to_value(&response).expect("error response should serialize");

        assert_eq!(json["error"]["type"], "upstream_unavailable");
        assert_eq!(json["error"]["code"], 503);
    }

    #[tokio::test]
    async fn test_metrics_counters() {
        let metrics = RequestMetrics::new();

        metrics.record_request().await;
        metrics.record_request().await;
        metrics.record_success(120).await;
        metrics.record_error(&Error::UpstreamUnavailable("refused".into())).await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.requests_succeeded, 1);
        assert_eq!(snapshot.avg_latency_ms, 120);
        assert_eq!(snapshot.errors_by_type.get("upstream_unavailable"), Some(&1));
    }
}
