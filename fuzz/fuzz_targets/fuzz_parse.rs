#![no_main]

use libfuzzer_sys::fuzz_target;
use tg_core::{ParseOptions, Record};

fuzz_target!(|data: &str| {
    let lenient = tg_parser::parse_with_options(data, &ParseOptions::with_comments())
        .expect("lenient parse never fails");

    let encoded = serde_json::to_string(&lenient.records).expect("records serialize");
    let decoded: Vec<Record> = serde_json::from_str(&encoded).expect("records deserialize");
    assert_eq!(decoded, lenient.records);

    if let Err(error) = tg_parser::parse_with_options(data, &ParseOptions::strict()) {
        assert!(lenient.warnings.iter().any(|warning| warning.span == error.span()));
    }

    let _ = tg_parser::render_skeleton(&lenient.records);
    let _ = tg_parser::node_positions(data);

    for result in tg_parser::parse_params(data) {
        let span = result.as_ref().map_or_else(|error| error.span(), |element| element.span);
        assert!(span.start.col < span.end.col);
    }
});
