#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz change detection on arbitrary payload pairs.
///
/// The input is split at the first NUL byte into an old and a new payload,
/// both decoded lossily the way fetched content is. Spans and snippet
/// windows must stay inside their texts.
fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len() / 2);
    let (old, new) = data.split_at(split);
    let new = new.strip_prefix(&[0]).unwrap_or(new);

    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let (old_len, new_len) = (old.chars().count(), new.chars().count());

    let spans = jsmon::TextDiffEngine::new().diff(&old, &new);
    assert_eq!(spans.is_empty(), old == new);
    for snippet in jsmon::snippet::extract(&old, &new, &spans, 25) {
        assert!(snippet.old_window.end <= old_len);
        assert!(snippet.new_window.end <= new_len);
    }
});
