//! Fuzz CFG-record loading: arbitrary JSON must either parse into a record
//! that validates, or be rejected cleanly. No panics either way.

#![no_main]

use libfuzzer_sys::fuzz_target;

use cfg_flesher::cfg::CfgRecord;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(record) = serde_json::from_str::<CfgRecord>(text) else {
        return;
    };
    // Loading re-validates; both outcomes are fine, panics are not.
    let _ = record.into_cfg();
});
