#[cfg(test)]
mod tests {
    use replygen_common::{Error, ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse};
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_request_missing_fields_default() {
        let request: GenerateRequest = serde_json::from_value(json!({
            "email": "See you Friday?"
        }))
        .expect("partial body should deserialize");

        assert_eq!(request.tone, "");
        assert_eq!(request.action_instruction, "");
        assert_eq!(request.char_limit, 500);
        assert_eq!(request.email, "See you Friday?");
        assert!(request.validate().is_ok());
    }

    #[tokio::test]
    async fn test_generate_response_shape() {
        let response = GenerateResponse {
            response: "Sounds good, see you then.".to_string(),
        };

        let json = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(json["response"], "Sounds good, see you then.");
    }

    #[tokio::test]
    async fn test_health_body_matches_contract() {
        let json = serde_json::to_value(HealthResponse::ok()).expect("health should serialize");
        assert_eq!(json, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_error_statuses_distinguish_upstream_failures() {
        // Unreachable server and malformed stream must map to different
        // statuses so the extension can tell them apart
        let unavailable = Error::UpstreamUnavailable("connection refused".into());
        let decode = Error::StreamDecode("bad chunk".into());

        assert_eq!(unavailable.status_code(), 503);
        assert_eq!(decode.status_code(), 502);

        let body = serde_json::to_value(ErrorResponse::from(&unavailable)).unwrap();
        assert_eq!(body["error"]["type"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn test_invalid_char_limit_rejected() {
        let request: GenerateRequest = serde_json::from_value(json!({
            "char_limit": 0,
            "email": "hello"
        }))
        .expect("body should deserialize");

        let err = request.validate().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
