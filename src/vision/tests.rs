use super::*;
use crate::constants::{VISION_DEFAULT_CONFIDENCE, VISION_PLACEHOLDER_CONFIDENCE};
use crate::image::BadgeImage;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn png() -> BadgeImage {
    BadgeImage::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 9]).unwrap()
}

mod extract_tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_prose() {
        let text = "Sure! Here you go:\n```json\n{\"name\": \"Supercon 2023\"}\n```\nHope it helps.";
        assert_eq!(extract_json_object(text), Some("{\"name\": \"Supercon 2023\"}"));
    }

    #[test]
    fn test_returns_first_balanced_block() {
        let text = r#"{"a": {"b": 1}} trailing {"c": 2}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn test_ignores_braces_inside_strings() {
        let text = r#"{"name": "The } badge", "description": "has \"{quotes\""} tail"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"name": "The } badge", "description": "has \"{quotes\""}"#)
        );
    }

    #[test]
    fn test_unbalanced_or_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"name\": \"open"), None);
    }
}

mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_full_answer() {
        let text = r#"{"name": "DEF CON 31 Badge", "description": "RP2040 synth badge",
            "maker": "MK Factor", "category": "Official", "year": 2023, "confidence": 82}"#;

        let analysis = parse_analysis(text).unwrap();

        assert_eq!(analysis.name, "DEF CON 31 Badge");
        assert_eq!(analysis.maker.as_deref(), Some("MK Factor"));
        assert_eq!(analysis.year, Some(2023));
        assert_eq!(analysis.confidence, 82);
        assert!(!analysis.placeholder);
    }

    #[test]
    fn test_fractional_confidence_is_scaled() {
        let analysis = parse_analysis(r#"{"name": "X", "confidence": 0.7}"#).unwrap();
        assert_eq!(analysis.confidence, 70);
    }

    #[test]
    fn test_integer_one_is_not_scaled() {
        let analysis = parse_analysis(r#"{"name": "X", "confidence": 1}"#).unwrap();
        assert_eq!(analysis.confidence, 1);
    }

    #[test]
    fn test_string_confidence_and_year() {
        let analysis =
            parse_analysis(r#"{"name": "X", "confidence": "85%", "year": "2019"}"#).unwrap();
        assert_eq!(analysis.confidence, 85);
        assert_eq!(analysis.year, Some(2019));
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        assert_eq!(
            parse_analysis(r#"{"name": "X", "confidence": 140}"#)
                .unwrap()
                .confidence,
            100
        );
        assert_eq!(
            parse_analysis(r#"{"name": "X", "confidence": -5}"#)
                .unwrap()
                .confidence,
            0
        );
    }

    #[test]
    fn test_missing_confidence_uses_default() {
        let analysis = parse_analysis(r#"{"name": "X"}"#).unwrap();
        assert_eq!(analysis.confidence, VISION_DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_null_like_fields_are_none() {
        let analysis =
            parse_analysis(r#"{"name": "X", "maker": null, "category": "null", "description": " "}"#)
                .unwrap();
        assert!(analysis.maker.is_none());
        assert!(analysis.category.is_none());
        assert!(analysis.description.is_none());
    }

    #[test]
    fn test_missing_name_is_error() {
        assert!(matches!(
            parse_analysis(r#"{"description": "a badge"}"#),
            Err(VisionError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            parse_analysis("{name: unquoted}"),
            Err(VisionError::InvalidJson { .. })
        ));
        assert!(matches!(
            parse_analysis("I can't tell"),
            Err(VisionError::NoJsonObject)
        ));
    }
}

mod client_tests {
    use super::*;

    fn config(server: &MockServer) -> VisionConfig {
        VisionConfig {
            api_key: Some("vision-key".to_string()),
            base_url: server.base_url(),
            ..Default::default()
        }
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1702512000_u32,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
        })
    }

    #[test]
    fn test_build_request_inlines_image() {
        let client = ChatVisionClient::new(&VisionConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        })
        .unwrap();

        let request = client.build_request(&png()).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        let url = value["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_new_requires_key() {
        assert!(matches!(
            ChatVisionClient::new(&VisionConfig::default()),
            Err(VisionError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_describe_returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer vision-key")
                    .body_contains("data:image/png;base64,");
                then.status(200)
                    .json_body(completion(json!("{\"name\": \"Supercon\"}")));
            })
            .await;

        let client = ChatVisionClient::new(&config(&server)).unwrap();
        let text = client.describe(&png()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "{\"name\": \"Supercon\"}");
    }

    #[tokio::test]
    async fn test_describe_empty_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(completion(json!(null)));
            })
            .await;

        let client = ChatVisionClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.describe(&png()).await,
            Err(VisionError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_describe_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let client = ChatVisionClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.describe(&png()).await,
            Err(VisionError::UnexpectedStatus { status: 500, .. })
        ));
    }
}

mod stage_tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_returns_none() {
        assert!(VisionStage::new(None).analyze(&png()).await.is_none());
    }

    #[tokio::test]
    async fn test_parsed_answer() {
        let stage = VisionStage::new(Some(Arc::new(MockVisionModel::identifying(
            "BSides Badge",
            60,
        ))));

        let analysis = stage.analyze(&png()).await.unwrap();

        assert_eq!(analysis.name, "BSides Badge");
        assert_eq!(analysis.confidence, 60);
    }

    #[tokio::test]
    async fn test_garbage_answer_gives_placeholder() {
        let stage = VisionStage::new(Some(Arc::new(MockVisionModel::replying(
            "I'm sorry, I can't help with that.",
        ))));

        let analysis = stage.analyze(&png()).await.unwrap();

        assert!(analysis.placeholder);
        assert_eq!(analysis.name, "Unknown Electronic Badge");
        assert_eq!(analysis.confidence, VISION_PLACEHOLDER_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_call_failure_gives_placeholder() {
        let model = Arc::new(MockVisionModel::failing());
        let stage = VisionStage::new(Some(model.clone()));

        let analysis = stage.analyze(&png()).await.unwrap();

        assert!(analysis.placeholder);
        assert_eq!(model.calls(), 1);
    }
}
