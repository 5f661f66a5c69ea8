// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{astroio, get_cmd_output};

#[test]
fn test_dat_info() {
    let tmp_dir = TempDir::new().unwrap();
    for gps in [1313388762, 1313388763] {
        for ch in 109..133 {
            let name = format!("1313388760_{gps}_ch{ch}.dat");
            std::fs::write(tmp_dir.path().join(name), b"").unwrap();
        }
    }

    let cmd = astroio()
        .args(["dat-info", "--dir", &tmp_dir.path().display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "dat-info failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Observation 1313388760"), "{stdout}");
    assert!(stdout.contains("2 seconds of 24 coarse channels"), "{stdout}");

    // A glob picks out one second.
    let pattern = tmp_dir.path().join("1313388760_1313388763_ch*.dat");
    let cmd = astroio()
        .args(["dat-info", &pattern.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "dat-info failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("1 seconds of 24 coarse channels"), "{stdout}");
}

#[test]
fn test_dat_info_incomplete() {
    let tmp_dir = TempDir::new().unwrap();
    for ch in 109..120 {
        let name = format!("1313388760_1313388762_ch{ch}.dat");
        std::fs::write(tmp_dir.path().join(name), b"").unwrap();
    }
    let cmd = astroio()
        .args(["dat-info", "--dir", &tmp_dir.path().display().to_string()])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("11"), "{stderr}");
}

#[test]
fn test_metafits_mapping_missing_file() {
    let cmd = astroio()
        .args(["metafits-mapping", "/does/not/exist.metafits"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
}

#[test]
fn test_gpu_info() {
    let cmd = astroio().arg("gpu-info").ok();
    assert!(cmd.is_ok(), "gpu-info failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("GPU support"));
    assert!(stdout.contains("Parallel decoding uses"));
}
