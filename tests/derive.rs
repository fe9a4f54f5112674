#![allow(dead_code, unused)]
#![cfg(all(feature = "derive", feature = "std"))]

mod fixture;

use apt_transcoder::{
    avec::{FromSections, SectionData, Values},
    sans::{data::BoundingBox, header::FileHeader},
};
use fixture::{AptFile, f32s, i32s, u16s};

fn reconstruction() -> Vec<u8> {
    let mut position = f32s(&[-1.0, -2.0, -3.0, 1.0, 2.0, 3.0]);
    position.extend(f32s(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));

    AptFile::new(2)
        .known("tof", &f32s(&[300.0, 301.5]))
        .known("Position", &position)
        .known("Multiplicity", &i32s(&[1, 2]))
        .known("Mass", &f32s(&[13.5, 27.0]))
        .known("tstage", &u16s(&[50, 51]))
        .bytes()
}

#[derive(Debug, Default, FromSections)]
struct Reconstruction {
    #[section(header)]
    header: Option<FileHeader>,
    #[section(bounding_box)]
    bounds: Option<BoundingBox>,
    #[section("Position")]
    position: Option<SectionData>,
    #[section("Mass")]
    mass: Option<SectionData>,
    unrelated: u32,
}

#[test]
fn collects_selected_channels() {
    let data = reconstruction();
    let mut reconstruction = Reconstruction::default();
    apt_transcoder::avec::decode_slice(&data, &mut reconstruction).unwrap();

    assert_eq!(reconstruction.header.unwrap().ion_count, 2);
    assert_eq!(
        reconstruction.bounds,
        Some(BoundingBox([[-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]]))
    );

    let position = reconstruction.position.unwrap();
    assert_eq!(position.shape(), (2, 3));
    assert_eq!(position.as_f32(), Some(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6][..]));

    assert_eq!(
        reconstruction.mass.unwrap().into_values(),
        Values::F32(vec![13.5, 27.0])
    );
    assert_eq!(reconstruction.unrelated, 0);
}

#[test]
fn only_named_sections_are_accepted() {
    let data = reconstruction();
    let transcoded = apt_transcoder::avec::transcode_slice(&data).unwrap();
    let reconstruction = Reconstruction::default();

    let accepted: Vec<_> = transcoded
        .result
        .seen
        .iter()
        .filter(|h| reconstruction.accepts(h))
        .map(|h| h.section_type.as_str())
        .collect();

    assert_eq!(accepted, ["Position", "Mass"]);
}

#[derive(Debug, Default, FromSections)]
struct Spectrum {
    #[section("Mass", |v, d: SectionData| *v = d.to_f32())]
    mass: Vec<f32>,
    #[section("tof", |v, d: SectionData| v.extend(d.to_f32()))]
    time_of_flight: Vec<f32>,
    #[section(bounding_box, |v, b: BoundingBox| *v += 1)]
    bounding_boxes: usize,
}

#[test]
fn handlers_accumulate() {
    let data = reconstruction();
    let mut spectrum = Spectrum::default();
    apt_transcoder::avec::decode_reader(&mut data.as_slice(), &mut spectrum).unwrap();

    assert_eq!(spectrum.mass, [13.5, 27.0]);
    assert_eq!(spectrum.time_of_flight, [300.0, 301.5]);
    assert_eq!(spectrum.bounding_boxes, 1);
}

#[derive(Debug, Default, FromSections)]
struct Bounds {
    #[section(bounding_box)]
    bounds: Option<BoundingBox>,
    #[section("Mass")]
    mass: Option<SectionData>,
}

#[test]
fn bounding_box_without_position_field() {
    let data = reconstruction();
    let mut bounds = Bounds::default();
    apt_transcoder::avec::decode_slice(&data, &mut bounds).unwrap();

    assert_eq!(
        bounds.bounds,
        Some(BoundingBox([[-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]]))
    );
    assert!(bounds.mass.is_some());

    let transcoded = apt_transcoder::avec::transcode_slice(&data).unwrap();
    let accepted: Vec<_> = transcoded
        .result
        .seen
        .iter()
        .filter(|h| bounds.accepts(h))
        .map(|h| h.section_type.as_str())
        .collect();
    assert_eq!(accepted, ["Position", "Mass"]);
}

#[derive(Debug, Default, FromSections)]
struct HeaderOnly {
    #[section(header, |v, h: &FileHeader| *v = h.filename.clone())]
    filename: String,
}

#[test]
fn no_sections_requested() {
    let data = reconstruction();
    let mut header = HeaderOnly::default();
    apt_transcoder::avec::decode_slice(&data, &mut header).unwrap();

    assert_eq!(header.filename, "R31_06365-v02.apt");
}

#[test]
fn partial_results_survive_a_halt() {
    let mut data = AptFile::new(2).known("Mass", &f32s(&[1.0, 2.0])).bytes();
    data.extend_from_slice(&[0; 100]);

    let mut reconstruction = Reconstruction::default();
    let err = apt_transcoder::avec::decode_slice(&data, &mut reconstruction).unwrap_err();

    assert!(matches!(
        err,
        apt_transcoder::avec::slice::Error::TruncatedHeader { offset: 696 }
    ));
    assert!(reconstruction.mass.is_some());
    assert!(reconstruction.position.is_none());
}
