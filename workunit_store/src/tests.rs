use crate::{Level, SpanId, WorkunitMetadata, WorkunitState, WorkunitStore};

#[test]
fn workunit_span_id_has_16_digits_len_hex_format() {
  let number: u64 = 1;
  let hex_string = SpanId(number).to_string();
  assert_eq!(16, hex_string.len());
  for ch in hex_string.chars() {
    assert!(ch.is_ascii_hexdigit())
  }
}

#[test]
fn hex_16_digit_string_actually_uses_input_number() {
  assert_eq!(
    SpanId(0x_ffff_ffff_ffff_ffff).to_string(),
    "ffffffffffffffff"
  );
  assert_eq!(SpanId(0x_1).to_string(), "0000000000000001");
  assert_eq!(
    SpanId(0x_0123_4567_89ab_cdef).to_string(),
    "0123456789abcdef"
  );
}

#[test]
fn completed_workunit_records_a_time_span() {
  let store = WorkunitStore::new(Level::Debug);
  let running = store.start_workunit("rewrite", Level::Debug, None);
  let span_id = running.span_id();
  running.complete();

  let completed = store.completed_workunits();
  assert_eq!(completed.len(), 1);
  assert_eq!(completed[0].span_id, span_id);
  assert!(matches!(completed[0].state, WorkunitState::Completed { .. }));
}

#[test]
fn nested_workunits_record_their_parent() {
  let store = WorkunitStore::new(Level::Debug);
  let outer = store.start_workunit("compile", Level::Info, None);
  let outer_id = outer.span_id();
  let inner = store.start_workunit(
    "automata",
    Level::Debug,
    Some(WorkunitMetadata {
      desc: Some("node automata generation".to_owned()),
      message: None,
    }),
  );
  let inner_id = inner.span_id();
  inner.complete();
  outer.complete();

  let completed = store.completed_workunits();
  let inner_workunit = completed.iter().find(|w| w.span_id == inner_id).unwrap();
  assert_eq!(inner_workunit.parent_id, Some(outer_id));
  let outer_workunit = completed.iter().find(|w| w.span_id == outer_id).unwrap();
  assert_eq!(outer_workunit.parent_id, None);
}
