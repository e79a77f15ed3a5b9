//! Fuzz target: `vmrun list` output parsing.
//!
//! Arbitrary tool output must never panic, and a successful parse must
//! agree with the count in the header.

#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_vix::vmrun::parse_running_vms;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(paths) = parse_running_vms(text) {
        let count = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .and_then(|h| h.strip_prefix("Total running VMs:"))
            .and_then(|n| n.trim().parse::<usize>().ok());
        assert_eq!(count, Some(paths.len()), "parsed paths must match header count");
    }
});
