//! Property tests for the wire codec and handle/protocol round-trips
//! (`spec.md` §8, testable properties 3 and 8).

use inspect_core::codec::{frame_line, strip_bom, FrameReader};
use inspect_core::handle::Handle;
use inspect_core::model::{
  BindingMode, BindingRecord, BindingSource, BindingStatus, HorizontalAlignment, LayoutRecord, Size,
  EdgeInsets, VerticalAlignment, Visibility,
};
use inspect_core::protocol::{GetVisualTreeRequest, Request};
use proptest::prelude::*;

fn arb_handle() -> impl Strategy<Value = Handle> {
  any::<u64>().prop_map(Handle::from_index)
}

fn arb_binding_record() -> impl Strategy<Value = BindingRecord> {
  (
    "[a-zA-Z]{1,12}",
    "[a-zA-Z.]{1,20}",
    prop_oneof![
      Just(BindingSource::DataContext),
      "[a-zA-Z]{1,8}".prop_map(BindingSource::ElementName),
      "[a-zA-Z]{1,8}".prop_map(BindingSource::RelativeSource),
      "[a-zA-Z]{1,8}".prop_map(BindingSource::Explicit),
    ],
    prop_oneof![
      Just(BindingMode::OneWay),
      Just(BindingMode::TwoWay),
      Just(BindingMode::OneWayToSource),
      Just(BindingMode::OneTime),
    ],
    any::<bool>(),
  )
    .prop_map(|(property, path, source, mode, has_error)| BindingRecord {
      property,
      path,
      source,
      mode,
      update_trigger: None,
      converter: None,
      status: BindingStatus::Active,
      has_error,
      error_message: None,
      current_value: None,
    })
}

proptest! {
  /// Testable property 3: stripping a leading BOM (if present) always
  /// yields the same bytes as the frame without it, regardless of payload.
  #[test]
  fn bom_stripping_is_idempotent(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
    let mut with_bom = vec![0xEF, 0xBB, 0xBF];
    with_bom.extend_from_slice(&payload);
    prop_assert_eq!(strip_bom(&with_bom), payload.as_slice());
    prop_assert_eq!(strip_bom(&payload), payload.as_slice());
  }

  /// Testable property 3 extended: frames are only yielded once a `\n`
  /// terminator has been seen, however the input is chunked.
  #[test]
  fn frame_reader_finds_every_newline_terminated_frame(
    frames in proptest::collection::vec("[a-zA-Z0-9]{0,40}", 0..10),
    chunk_size in 1usize..32,
  ) {
    let mut input = Vec::new();
    for frame in &frames {
      input.extend_from_slice(frame.as_bytes());
      input.push(b'\n');
    }
    let mut reader = FrameReader::new();
    let mut seen = Vec::new();
    for chunk in input.chunks(chunk_size) {
      seen.extend(reader.push(chunk));
    }
    prop_assert_eq!(reader.pending_len(), 0);
    let seen: Vec<String> = seen.into_iter().map(|f| String::from_utf8(f).unwrap()).collect();
    prop_assert_eq!(seen, frames);
  }

  /// Testable property 8: encoding any `Handle` then decoding it yields an
  /// equal handle.
  #[test]
  fn handle_round_trips_through_json(handle in arb_handle()) {
    let json = serde_json::to_string(&handle).unwrap();
    let back: Handle = serde_json::from_str(&json).unwrap();
    prop_assert_eq!(handle, back);
  }

  /// Testable property 8, for `BindingRecord`: round-tripping through JSON
  /// preserves equality, including the derived source/mode enums.
  #[test]
  fn binding_record_round_trips_through_json(record in arb_binding_record()) {
    let json = serde_json::to_string(&record).unwrap();
    let back: BindingRecord = serde_json::from_str(&json).unwrap();
    prop_assert_eq!(record, back);
  }

  /// A request frame, once written with [`frame_line`] and fed back through
  /// [`FrameReader`], decodes to an equivalent `Request`.
  #[test]
  fn request_survives_a_full_frame_round_trip(request_id in "[a-zA-Z0-9]{1,16}", max_depth in 1usize..200) {
    let request = Request::GetVisualTree(GetVisualTreeRequest {
      request_id: request_id.clone(),
      root_handle: None,
      max_depth,
    });
    let encoded = frame_line(serde_json::to_vec(&request).unwrap());
    let mut reader = FrameReader::new();
    let frames = reader.push(&encoded);
    prop_assert_eq!(frames.len(), 1);
    let decoded: Request = serde_json::from_slice(&frames[0]).unwrap();
    prop_assert_eq!(decoded.request_id(), request_id.as_str());
    let Request::GetVisualTree(data) = decoded else {
      panic!("wrong variant decoded");
    };
    prop_assert_eq!(data.max_depth, max_depth);
  }
}

#[test]
fn layout_record_round_trips_through_json() {
  let layout = LayoutRecord {
    actual_width: 120.0,
    actual_height: 40.0,
    desired_size: Size { w: 120.0, h: 40.0 },
    render_size: Size { w: 120.0, h: 40.0 },
    margin: EdgeInsets { l: 1.0, t: 2.0, r: 3.0, b: 4.0 },
    padding: None,
    horizontal_alignment: HorizontalAlignment::Stretch,
    vertical_alignment: VerticalAlignment::Center,
    visibility: Visibility::Visible,
  };
  let json = serde_json::to_string(&layout).unwrap();
  let back: LayoutRecord = serde_json::from_str(&json).unwrap();
  assert_eq!(layout, back);
}
