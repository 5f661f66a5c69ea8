// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use mwa_astroio::{
    fits::{BitDepth, ImageData},
    FitsContainer, Hdu,
};
use tempfile::TempDir;

use crate::{astroio, get_cmd_output};

#[test]
fn test_adjust_fits() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("vis.fits");
    let output = tmp_dir.path().join("vis_adjusted.fits");

    let mut container = FitsContainer::new();
    for i in 0..2 {
        let mut hdu = Hdu::new();
        hdu.set_image(vec![i as f32, 1.0, -2.0, 3.0, 4.0, 5.0], 2, 3)
            .unwrap();
        hdu.add_keyword("TIME", 1_600_000_000_i64, "Unix time (seconds)");
        hdu.add_keyword("INTTIME", 0.5, "Integration time (s)");
        container.push(hdu);
    }
    container.to_file(&input).unwrap();
    // The output is overwritten.
    std::fs::write(&output, b"junk").unwrap();

    let cmd = astroio()
        .args([
            "adjust-fits",
            &input.display().to_string(),
            &output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "adjust-fits failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let adjusted = FitsContainer::from_file(&output).unwrap();
    assert_eq!(adjusted.len(), 2);
    for (i, hdu) in adjusted.iter().enumerate() {
        assert_eq!(hdu.bit_depth(), Some(BitDepth::Long));
        assert_eq!((hdu.x_dim(), hdu.y_dim()), (2, 3));
        match hdu.image() {
            Some(ImageData::Long(pixels)) => assert_eq!(pixels, &[i as i32, 1, -2, 3, 4, 5]),
            other => panic!("unexpected image {other:?}"),
        }
        assert_eq!(hdu.get_keyword::<i64>("TIME").unwrap().0, 1_600_000_000);
    }
}

#[test]
fn test_adjust_fits_missing_input() {
    let tmp_dir = TempDir::new().unwrap();
    let cmd = astroio()
        .args([
            "adjust-fits",
            &tmp_dir.path().join("nope.fits").display().to_string(),
            &tmp_dir.path().join("out.fits").display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
}
