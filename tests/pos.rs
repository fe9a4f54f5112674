use apt_transcoder::pos::{self, RECORD_SIZE};

fn records(rows: &[[f32; 4]]) -> Vec<u8> {
    rows.iter()
        .flatten()
        .flat_map(|v| v.to_be_bytes())
        .collect()
}

#[test]
fn decodes_big_endian_records() {
    let rows = [[1.0, -2.5, 3.25, 27.0], [0.0, 1e-3, -1e3, 13.5]];
    let data = records(&rows);
    assert_eq!(data.len(), 2 * RECORD_SIZE);
    assert_eq!(&data[..4], &[0x3F, 0x80, 0x00, 0x00]);

    assert_eq!(pos::decode_slice(&data).unwrap(), rows);
}

#[test]
fn empty_file_has_no_rows() {
    assert_eq!(pos::decode_slice(&[]).unwrap(), Vec::<[f32; 4]>::new());
}

#[test]
fn partial_record_is_rejected() {
    let mut data = records(&[[1.0, 2.0, 3.0, 4.0]]);
    data.extend_from_slice(&[0; 5]);

    assert_eq!(pos::decode_slice(&data), Err(pos::Error::TrailingBytes(5)));
}

#[cfg(feature = "std")]
#[test]
fn decodes_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("R31_06365-v02.pos");
    std::fs::write(&path, records(&[[4.0, 3.0, 2.0, 1.0]])).unwrap();

    assert_eq!(pos::decode_path(&path).unwrap(), [[4.0, 3.0, 2.0, 1.0]]);

    let missing = dir.path().join("absent.pos");
    assert!(matches!(
        pos::decode_path(&missing),
        Err(pos::PathError::MissingFile(p)) if p == missing
    ));

    std::fs::write(&path, [0u8; 17]).unwrap();
    assert!(matches!(
        pos::decode_path(&path),
        Err(pos::PathError::Pos(pos::Error::TrailingBytes(1)))
    ));
}
