use ocr_table_worker::error::ApiError;
use ocr_table_worker::extract::{
    ClusterParams, OcrLine, OcrOutput, OcrPayload, Strategy, Table, Word,
};
use ocr_table_worker::models::{
    ExtractRequest, SaveResponse, ValidationRequest, ValidationResponse,
};
use ocr_table_worker::persistence::{coerce_numeric_columns, parse_table_data, preview_rows};
use ocr_table_worker::routes::{TableFormat, extract_options};
use ocr_table_worker::validation::{build_validation_request, resolve_validation, validate_table};
use pretty_assertions::assert_eq;
use serde_json::json;

fn request(value: serde_json::Value) -> ExtractRequest {
    serde_json::from_value(value).expect("valid extract request")
}

#[test]
fn extract_request_accepts_text_only_and_geometry_bodies() {
    let text_only = request(json!({ "text": "Sample  SiO2\nA-1  48.2" }));
    assert!(text_only.lines.is_none());
    assert!(text_only.cascade.is_none());

    let with_words = request(json!({
        "text": "Sample SiO2\nA-1 48.2",
        "lines": [
            { "words": [
                { "text": "Sample", "bbox": { "x0": 0.0, "y0": 0.0, "x1": 60.0, "y1": 20.0 }, "confidence": 96.0 },
                { "text": "SiO2", "bbox": { "x0": 100.0, "y0": 1.0, "x1": 140.0, "y1": 21.0 }, "confidence": 91.0 }
            ] },
            { "words": [
                { "text": "A-1", "bbox": { "x0": 1.0, "y0": 30.0, "x1": 40.0, "y1": 50.0 }, "confidence": 90.0 },
                { "text": "48.2", "bbox": { "x0": 99.0, "y0": 31.0, "x1": 140.0, "y1": 51.0 }, "confidence": 88.0 }
            ] }
        ]
    }));
    let output = OcrOutput::from(OcrPayload {
        text: with_words.text.clone(),
        lines: with_words.lines.clone(),
    });
    assert!(output.has_geometry());
    assert_eq!(output.words().count(), 4);
}

#[test]
fn extract_options_follow_request_fields() {
    let options = extract_options(&request(json!({
        "text": "",
        "cascade": "spacing, pipe",
        "fallback_header": " Column1 "
    })))
    .expect("options");
    let cascade = options.cascade.expect("custom cascade");
    assert_eq!(cascade.strategies(), &[Strategy::Spacing, Strategy::Pipe]);
    assert_eq!(options.fallback_header, "Column1");

    let defaults = extract_options(&request(json!({ "text": "", "fallback_header": "   " })))
        .expect("options");
    assert!(defaults.cascade.is_none());
    assert_eq!(defaults.fallback_header, "Data");

    let err = extract_options(&request(json!({ "text": "", "cascade": "tab,ocr" })))
        .expect_err("unknown strategy");
    assert_eq!(err.status_code(), 400);
}

#[test]
fn validate_contract_round_trips_through_json() {
    let body = json!({
        "raw_text": "Sample MgO\nA-1 bd",
        "lines": [
            { "y": 0.0, "words": [ { "text": "Sample", "x": 0.0, "confidence": 95.0 }, { "text": "MgO", "x": 120.0, "confidence": 93.0 } ] },
            { "y": 24.0, "words": [ { "text": "A-1", "x": 2.0, "confidence": 31.0 }, { "text": "bd", "x": 118.0, "confidence": 40.0 } ] }
        ],
        "preliminary_data": { "headers": ["Sample", "MgO"], "rows": [["A-1", "bd"]] }
    });
    let request: ValidationRequest = serde_json::from_value(body).expect("validation request");

    // the second line is below the confidence floor, so only the header row
    // can be rebuilt and the preliminary table is cleaned instead
    let response = validate_table(&request, &ClusterParams::default());
    assert_eq!(
        serde_json::to_value(&response).expect("json"),
        json!({ "success": true, "data": { "headers": ["Sample", "MgO"], "rows": [["A-1", "<0.01"]] } })
    );
}

#[test]
fn client_request_mirrors_word_positions() {
    let output = OcrOutput::from(OcrPayload {
        text: "Sample SiO2\nA-1 48.2".to_string(),
        lines: Some(vec![
            OcrLine {
                words: vec![
                    Word::at("Sample", 0.0, 0.0, 95.0),
                    Word::at("SiO2", 100.0, 2.0, 95.0),
                ],
            },
            OcrLine {
                words: vec![
                    Word::at("A-1", 0.0, 20.0, 95.0),
                    Word::at("48.2", 100.0, 21.0, 95.0),
                ],
            },
        ]),
    });
    let preliminary = Table::new(
        vec!["Sample".into(), "SiO2".into()],
        vec![vec!["A-1".into(), "48.2".into()]],
    );

    let request = build_validation_request(&output, &preliminary);
    let response = validate_table(&request, &ClusterParams::default());
    let (table, validated) = resolve_validation(preliminary.clone(), Ok(response));
    assert!(validated);
    assert_eq!(table, preliminary);

    let (table, validated) = resolve_validation(
        preliminary.clone(),
        Err(ApiError::Upstream("validation endpoint returned status 503".into())),
    );
    assert!(!validated);
    assert_eq!(table, preliminary);
}

#[test]
fn rejected_validation_response_has_no_data_key() {
    let response = ValidationResponse {
        success: false,
        data: None,
        error: Some("preliminary table has no headers".to_string()),
    };
    assert_eq!(
        serde_json::to_value(&response).expect("json"),
        json!({ "success": false, "error": "preliminary table has no headers" })
    );
}

#[test]
fn save_pipeline_coerces_and_previews() {
    let raw = json!({
        "headers": ["Sample", "SiO2", "Comment"],
        "rows": [
            ["A-1", "48.2%", "fresh"],
            ["A-2", " 51.0 ", ""],
            ["", "", ""]
        ]
    })
    .to_string();

    let table = coerce_numeric_columns(parse_table_data(&raw).expect("table"));
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0], vec!["A-1", "48.2", "fresh"]);
    assert_eq!(table.rows[1], vec!["A-2", "51.0", ""]);
    assert_eq!(preview_rows(&table), table.rows);
}

#[test]
fn save_failure_envelope_shape() {
    let err = parse_table_data(r#"{"rows": []}"#).expect_err("headers missing");
    let response = SaveResponse {
        success: false,
        error: Some(err.message().to_string()),
        ..SaveResponse::default()
    };
    assert_eq!(
        serde_json::to_value(&response).expect("json"),
        json!({ "success": false, "error": "Invalid data format" })
    );
}

#[test]
fn table_format_query_values() {
    assert_eq!("csv".parse::<TableFormat>().expect("csv"), TableFormat::Csv);
    assert_eq!(" JSON ".parse::<TableFormat>().expect("json"), TableFormat::Json);
    let err = "xlsx".parse::<TableFormat>().expect_err("unsupported");
    assert_eq!(err.code(), "bad_request");
}
