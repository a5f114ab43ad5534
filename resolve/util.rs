use encoding8::ascii;

// Dumps out the slice in a pretty way
pub fn hexdump(slice: &[u8]) {
    const WIDTH: usize = 16;

    for (i, row) in slice.chunks(WIDTH).enumerate() {
        let row_hex: String = row.iter().map(|x| format!("{0:02X} ", x)).collect();

        // For each byte on this row, only print out the ascii printable ones.
        let row_str: String = row
            .iter()
            .map(|x| {
                if ascii::is_printable(*x) {
                    *x as char
                } else {
                    '.'
                }
            })
            .collect();

        println!("{0:>08x}: {1:<48} {2:}", i * WIDTH, row_hex, row_str);
    }
}

/// Returns true if the DEBUG environment variable asks for debug logging.
pub fn debug_env(value: Option<&str>) -> bool {
    match value.map(str::to_lowercase) {
        Some(v) => !v.is_empty() && v != "0" && v != "false",
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_env() {
        assert!(!debug_env(None));
        assert!(!debug_env(Some("")));
        assert!(!debug_env(Some("0")));
        assert!(!debug_env(Some("FALSE")));
        assert!(debug_env(Some("1")));
        assert!(debug_env(Some("yes")));
    }
}
