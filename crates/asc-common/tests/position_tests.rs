use super::*;

#[test]
fn test_line_map_handles_all_line_endings() {
    let source = "a\nbc\r\nd\re";
    let map = LineMap::build(source);
    assert_eq!(map.line_count(), 4);

    assert_eq!(map.offset_to_position(0, source), Position::new(0, 0));
    assert_eq!(map.offset_to_position(3, source), Position::new(1, 1));
    // 'd' follows \r\n
    assert_eq!(map.offset_to_position(6, source), Position::new(2, 0));
    // 'e' follows a lone \r
    assert_eq!(map.offset_to_position(8, source), Position::new(3, 0));
}

#[test]
fn test_position_to_offset_clamps_to_line_end() {
    let source = "abc\ndef";
    let map = LineMap::build(source);
    assert_eq!(map.position_to_offset(Position::new(1, 2), source), Some(6));
    assert_eq!(map.position_to_offset(Position::new(0, 99), source), Some(3));
    assert_eq!(map.position_to_offset(Position::new(5, 0), source), None);
}

#[test]
fn test_offset_to_position_counts_characters_not_bytes() {
    let source = "é = 1;\nx";
    let map = LineMap::build(source);
    // 'é' is two bytes, '=' starts at byte 3
    assert_eq!(map.offset_to_position(3, source), Position::new(0, 2));
}
