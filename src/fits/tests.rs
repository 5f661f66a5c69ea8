// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use super::*;

fn float_hdu() -> Hdu {
    let mut hdu = Hdu::new();
    let data: Vec<f32> = (0..12).map(|i| i as f32 * 0.5 - 2.0).collect();
    hdu.set_image(data, 3, 4).unwrap();
    hdu.add_keyword("TIME", 1_700_000_000_i64, "Unix time (seconds)");
    hdu.add_keyword("INTTIME", 0.25_f64, "Integration time (s)");
    hdu.add_keyword("CTYPE1", "RA---SIN", "");
    hdu
}

#[test]
fn test_keyword_typing() {
    let hdu = float_hdu();
    let (time, comment) = hdu.get_keyword::<i64>("TIME").unwrap();
    assert_eq!(time, 1_700_000_000);
    assert_eq!(comment, "Unix time (seconds)");

    // Integers widen to floats.
    let (time, _) = hdu.get_keyword::<f64>("TIME").unwrap();
    assert_abs_diff_eq!(time, 1.7e9);

    let (inttime, _) = hdu.get_keyword::<f32>("INTTIME").unwrap();
    assert_abs_diff_eq!(inttime, 0.25);

    let (ctype, _) = hdu.get_keyword::<String>("CTYPE1").unwrap();
    assert_eq!(ctype, "RA---SIN");
}

#[test]
fn test_keyword_errors() {
    let hdu = float_hdu();
    assert!(matches!(
        hdu.get_keyword::<i64>("MILLITIM"),
        Err(FitsError::MissingKey { .. })
    ));
    // Floats don't narrow to integers.
    assert!(matches!(
        hdu.get_keyword::<i32>("INTTIME"),
        Err(FitsError::KeyType { .. })
    ));
    assert!(matches!(
        hdu.get_keyword::<f64>("CTYPE1"),
        Err(FitsError::KeyType { .. })
    ));
    // Out of range for the requested type.
    assert!(matches!(
        hdu.get_keyword::<u16>("TIME"),
        Err(FitsError::KeyType { .. })
    ));
}

#[test]
fn test_non_finite_keyword_is_zeroed() {
    let mut hdu = Hdu::new();
    hdu.add_keyword("BAD", f64::NAN, "");
    hdu.add_keyword("WORSE", f32::INFINITY, "");
    assert_eq!(hdu.get_keyword::<f64>("BAD").unwrap().0, 0.0);
    assert_eq!(hdu.get_keyword::<f64>("WORSE").unwrap().0, 0.0);
}

#[test]
fn test_add_keyword_replaces() {
    let mut hdu = Hdu::new();
    hdu.add_keyword("COARSE_CHAN", 1_u32, "old");
    hdu.add_keyword("COARSE_CHAN", 133_u32, "new");
    assert_eq!(hdu.header().len(), 1);
    assert_eq!(
        hdu.get_keyword::<u32>("COARSE_CHAN").unwrap(),
        (133, "new".to_string())
    );
}

#[test]
fn test_set_image_checks_size() {
    let mut hdu = Hdu::new();
    let result = hdu.set_image(vec![0.0_f32; 11], 3, 4);
    assert!(matches!(
        result,
        Err(FitsError::ImageSize { got: 11, x: 3, y: 4 })
    ));
    assert!(hdu.image().is_none());
    assert_eq!(hdu.x_dim(), 0);
}

#[test]
fn test_hdu_equality_ignores_header() {
    let a = float_hdu();
    let mut b = float_hdu();
    b.add_keyword("EXTRA", 1, "");
    assert_eq!(a, b);

    // Same bytes, different shape.
    let mut c = Hdu::new();
    c.set_image(a.image().unwrap().clone(), 4, 3).unwrap();
    assert_ne!(a, c);

    // Same shape, different depth.
    let mut d = Hdu::new();
    d.set_image(vec![0_i32; 12], 3, 4).unwrap();
    assert_ne!(a, d);
}

#[test]
fn test_structural_keywords() {
    for key in ["SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS12", "EXTEND", ""] {
        assert!(is_structural_keyword(key), "{key}");
    }
    for key in ["NAXISX", "TIME", "CRPIX1", "NAXIS_"] {
        assert!(!is_structural_keyword(key), "{key}");
    }
}

#[test]
fn test_parse_header_value() {
    assert_eq!(parse_header_value("42"), HeaderValue::Integer(42));
    assert_eq!(parse_header_value(" -7 "), HeaderValue::Integer(-7));
    assert_eq!(parse_header_value("1.5E+00"), HeaderValue::Float(1.5));
    assert_eq!(parse_header_value("2.5D-01"), HeaderValue::Float(0.25));
    assert_eq!(
        parse_header_value("'RA---SIN'"),
        HeaderValue::Text("RA---SIN".to_string())
    );
    assert_eq!(
        parse_header_value("'deg     '"),
        HeaderValue::Text("deg".to_string())
    );
    assert_eq!(
        parse_header_value("'123'"),
        HeaderValue::Text("123".to_string())
    );
    assert_eq!(parse_header_value("T"), HeaderValue::Text("T".to_string()));
}

#[test]
fn test_round_trip_file() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("container.fits");

    let mut container = FitsContainer::new();
    let mut primary = Hdu::new();
    primary.add_keyword("OBSID", 1_234_567_890, "The observation ID");
    container.push(primary);
    container.push(float_hdu());
    let mut long_hdu = Hdu::new();
    long_hdu.set_image(vec![-3_i32, 0, 7, 1 << 20], 2, 2).unwrap();
    container.push(long_hdu);
    let mut double_hdu = Hdu::new();
    double_hdu
        .set_image(vec![1.0e-10_f64, -2.5, 3.0], 1, 3)
        .unwrap();
    container.push(double_hdu);
    let mut byte_hdu = Hdu::new();
    byte_hdu.set_image(vec![0_u8, 1, 128, 255], 4, 1).unwrap();
    container.push(byte_hdu);

    container.to_file(&file).unwrap();
    let read = FitsContainer::from_file(&file).unwrap();
    assert_eq!(read.len(), container.len());
    assert_eq!(read, container);

    assert!(read[0].image().is_none());
    assert_eq!(
        read[0].get_keyword::<i64>("OBSID").unwrap(),
        (1_234_567_890, "The observation ID".to_string())
    );

    let hdu = &read[1];
    assert_eq!((hdu.x_dim(), hdu.y_dim()), (3, 4));
    assert_eq!(hdu.bit_depth(), Some(BitDepth::Float));
    assert_eq!(hdu.get_keyword::<i64>("TIME").unwrap().0, 1_700_000_000);
    assert_abs_diff_eq!(hdu.get_keyword::<f64>("INTTIME").unwrap().0, 0.25);
    assert_eq!(
        hdu.get_keyword::<String>("CTYPE1").unwrap().0,
        "RA---SIN".to_string()
    );
    // Structural keywords aren't kept.
    assert!(hdu.header().keys().all(|k| !k.starts_with("NAXIS")));
    assert!(!hdu.header().contains_key("BITPIX"));

    assert_eq!(read[4].image(), Some(&ImageData::Byte(vec![0, 1, 128, 255])));
}

#[test]
fn test_to_file_overwrites() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("overwrite.fits");
    std::fs::write(&file, b"not a fits file").unwrap();

    let mut container = FitsContainer::new();
    container.push(float_hdu());
    container.to_file(&file).unwrap();
    container.to_file(&file).unwrap();
    let read = FitsContainer::from_file(&file).unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0], container[0]);
}

#[test]
fn test_from_missing_file() {
    let result = FitsContainer::from_file("/does/not/exist.fits");
    assert!(matches!(result, Err(FitsError::Open { .. })));
}

#[test]
fn test_write_float_as_long() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("adjusted.fits");

    let mut container = FitsContainer::new();
    let mut hdu = Hdu::new();
    hdu.set_image(vec![1.0_f32, 2.0, -3.0, 40.0, 0.0, 6.0], 2, 3)
        .unwrap();
    hdu.add_keyword("COARSE_CHAN", 109, "");
    container.push(hdu);

    write_float_as_long(&container, &file).unwrap();
    let read = FitsContainer::from_file(&file).unwrap();
    assert_eq!(read.len(), 1);
    let hdu = &read[0];
    assert_eq!(hdu.bit_depth(), Some(BitDepth::Long));
    assert_eq!((hdu.x_dim(), hdu.y_dim()), (2, 3));
    assert_eq!(
        hdu.image(),
        Some(&ImageData::Long(vec![1, 2, -3, 40, 0, 6]))
    );
    assert_eq!(hdu.get_keyword::<u32>("COARSE_CHAN").unwrap().0, 109);
}

#[test]
fn test_create_error_reports_caller() {
    let tmp_dir = TempDir::new().unwrap();
    let file = tmp_dir.path().join("no_such_dir").join("out.fits");
    let mut container = FitsContainer::new();
    container.push(float_hdu());

    let line = line!() + 1;
    let result = container.to_file(&file);
    match result {
        Err(FitsError::Open {
            source_file,
            source_line,
            ..
        }) => {
            assert!(source_file.ends_with("tests.rs"), "{source_file}");
            assert_eq!(source_line, line);
        }
        other => panic!("unexpected result {other:?}"),
    }

    let line = line!() + 1;
    let result = write_float_as_long(&container, &file);
    assert!(
        matches!(result, Err(FitsError::Open { source_line, .. }) if source_line == line),
        "{result:?}"
    );
}
