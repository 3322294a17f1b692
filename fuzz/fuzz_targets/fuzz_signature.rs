#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let cap = data.len().min(utils::MAX_INPUT_SIZE);
    let Ok(text) = std::str::from_utf8(&data[..cap]) else {
        return;
    };
    let _ = quill_classfile::signature::parse_class_signature(text);
    let _ = quill_classfile::signature::parse_method_signature(text);
    let _ = quill_classfile::signature::parse_field_signature(text);
    let _ = quill_classfile::descriptor::parse_field_descriptor(text);
    let _ = quill_classfile::descriptor::parse_method_descriptor(text);
});
