#![no_main]

use libfuzzer_sys::fuzz_target;
use tg_core::Side;

fuzz_target!(|input: (&str, &str, bool)| {
    let (schema, device_id, right) = input;
    let side = if right { Side::Right } else { Side::Left };
    if let Some(edited) = tg_parser::disconnect(schema, device_id, side, "n") {
        assert_ne!(edited, schema);
        let _ = tg_parser::parse(&edited);
    }
});
