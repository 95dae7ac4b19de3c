use super::*;
use crate::voice::VoiceProfile;

#[test]
fn request_body_uses_camel_case_wire_names() {
    let req = SynthesisRequest::mp3("Hola.", VoiceProfile::EsEsStandardB);
    let v = serde_json::to_value(request_body(&req)).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "input": { "text": "Hola." },
            "voice": {
                "languageCode": "es-ES",
                "name": "es-ES-Standard-B",
                "ssmlGender": "MALE"
            },
            "audioConfig": { "audioEncoding": "MP3" }
        })
    );
}

#[test]
fn http_429_is_rate_limit() {
    let err = classify_failure(429, "Too Many Requests");
    assert!(err.is_retryable());
}

#[test]
fn resource_exhausted_body_is_rate_limit() {
    let body = r#"{"error":{"code":400,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
    let err = classify_failure(400, body);
    assert!(matches!(err, NarrationError::RateLimit(ref m) if m.contains("Quota exceeded")));
}

#[test]
fn other_failures_are_synthesis_errors() {
    let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
    let err = classify_failure(403, body);
    assert!(matches!(err, NarrationError::Synthesis(_)));
    assert!(!err.is_retryable());
    assert!(matches!(classify_failure(500, "<html>"), NarrationError::Synthesis(_)));
}

#[test]
fn audio_content_is_base64_decoded() {
    let body = r#"{"audioContent":"SUQzBAA="}"#;
    assert_eq!(decode_audio_content(body).unwrap(), b"ID3\x04\x00");
}

#[test]
fn missing_or_invalid_audio_content_is_synthesis_error() {
    for body in ["{}", r#"{"audioContent":"***"}"#, r#"{"audioContent":""}"#, "nope"] {
        assert!(
            matches!(decode_audio_content(body), Err(NarrationError::Synthesis(_))),
            "{body}"
        );
    }
}
