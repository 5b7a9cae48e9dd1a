#![no_main]

use assessrec::DurationFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let filter = DurationFilter::parse(text);

    // A parsed constraint re-renders to a line that parses back to itself.
    if let Some(line) = filter.constraint_line() {
        assert_eq!(DurationFilter::parse(&line), filter);
    }

    let _ = filter.matches(None);
    let _ = filter.matches(Some(u32::MAX));
});
