/// Deserialization tests for `GenerateResponse` using representative payloads
/// returned by the generateContent endpoint.
#[cfg(test)]
mod unit {
    use crate::types::{GenerateRequest, GenerateResponse, GenerationOptions};

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).expect("failed to parse response")
    }

    #[test]
    fn text_joins_parts_of_first_candidate() {
        let json = r#"{
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]},
                    "finishReason": "STOP"
                },
                {
                    "content": {"role": "model", "parts": [{"text": "ignored"}]}
                }
            ],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
        }"#;
        let resp = parse(json);
        assert_eq!(resp.text().as_deref(), Some("Hello, world"));
        assert_eq!(resp.usage_metadata.unwrap().total_token_count, 6);
    }

    #[test]
    fn text_is_none_without_candidates() {
        let resp = parse("{}");
        assert!(resp.text().is_none());
        assert!(resp.block_reason().is_none());
    }

    #[test]
    fn whitespace_only_text_counts_as_empty() {
        let resp = parse(r#"{"candidates": [{"content": {"parts": [{"text": "  \n"}]}}]}"#);
        assert!(resp.text().is_none());
    }

    #[test]
    fn block_reason_is_surfaced() {
        let resp = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(resp.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn request_omits_empty_generation_config() {
        let req = GenerateRequest::from_prompt("hi", &GenerationOptions::default());
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn request_carries_options() {
        let opts = GenerationOptions {
            temperature: Some(0.2),
            max_output_tokens: Some(512),
            system_instruction: Some("Be terse.".into()),
        };
        let json = serde_json::to_value(GenerateRequest::from_prompt("hi", &opts)).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be terse.");
    }
}

/// HTTP-level tests against a local mock server.
#[cfg(test)]
mod http {
    use crate::{GeminiClient, GenAiError, GenerationOptions};

    const PATH: &str = "/v1beta/models/test-model:generateContent";

    fn client(server: &mockito::Server) -> GeminiClient {
        GeminiClient::new("test-key", "test-model").with_base_url(server.url())
    }

    #[test]
    fn generate_returns_text() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"draft"}]}}]}"#)
            .create();

        let text = client(&server)
            .generate("write", &GenerationOptions::default())
            .unwrap();
        assert_eq!(text, "draft");
        mock.assert();
    }

    #[test]
    fn non_success_status_carries_body() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", PATH)
            .with_status(403)
            .with_body("API key not valid")
            .create();

        let err = client(&server)
            .generate("write", &GenerationOptions::default())
            .unwrap_err();
        match err {
            GenAiError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("not valid"));
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body("not json")
            .create();

        let err = client(&server)
            .generate("write", &GenerationOptions::default())
            .unwrap_err();
        assert!(matches!(err, GenAiError::Parse { .. }));
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create();

        let err = client(&server)
            .generate("write", &GenerationOptions::default())
            .unwrap_err();
        assert!(matches!(err, GenAiError::Blocked(ref r) if r == "SAFETY"));
    }

    #[test]
    fn empty_candidates_is_empty_response() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create();

        let err = client(&server)
            .generate("write", &GenerationOptions::default())
            .unwrap_err();
        assert!(matches!(err, GenAiError::EmptyResponse));
    }
}
